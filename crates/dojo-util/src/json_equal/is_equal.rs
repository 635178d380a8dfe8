use serde_json::{Number, Value};

/// Structural equality between two JSON values.
///
/// - arrays compare by length, then element by element
/// - objects compare by key set (order independent), then value by value
/// - numbers compare by numeric value, so `1` equals `1.0`
/// - everything else compares by value
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use dojo_util::is_equal;
///
/// assert!(is_equal(&json!({"a": [1, 2], "b": 1}), &json!({"b": 1.0, "a": [1, 2]})));
/// assert!(!is_equal(&json!([1, 2]), &json!([1, 2, 3])));
/// ```
pub fn is_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => number_equal(a, b),
        (Value::String(a), Value::String(b)) => a == b,

        (Value::Array(arr_a), Value::Array(arr_b)) => {
            arr_a.len() == arr_b.len() && arr_a.iter().zip(arr_b).all(|(x, y)| is_equal(x, y))
        }

        (Value::Object(obj_a), Value::Object(obj_b)) => {
            if obj_a.len() != obj_b.len() {
                return false;
            }
            obj_a
                .iter()
                .all(|(key, val_a)| obj_b.get(key).is_some_and(|val_b| is_equal(val_a, val_b)))
        }

        _ => false,
    }
}

/// [`is_equal`] lifted over possibly-absent values; two absent values are
/// equal, an absent and a present value never are.
pub fn is_equal_opt(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => is_equal(a, b),
        _ => false,
    }
}

fn number_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitives() {
        assert!(is_equal(&json!(null), &json!(null)));
        assert!(is_equal(&json!(true), &json!(true)));
        assert!(!is_equal(&json!(true), &json!(false)));
        assert!(is_equal(&json!("a"), &json!("a")));
        assert!(!is_equal(&json!("1"), &json!(1)));
        assert!(!is_equal(&json!(null), &json!(false)));
    }

    #[test]
    fn test_numbers() {
        assert!(is_equal(&json!(1), &json!(1.0)));
        assert!(is_equal(&json!(-3), &json!(-3)));
        assert!(!is_equal(&json!(1), &json!(2)));
        assert!(is_equal(&json!(u64::MAX), &json!(u64::MAX)));
        assert!(!is_equal(&json!(u64::MAX), &json!(-1)));
    }

    #[test]
    fn test_arrays() {
        assert!(is_equal(&json!([1, [2, 3]]), &json!([1, [2, 3]])));
        assert!(!is_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!is_equal(&json!([]), &json!({})));
    }

    #[test]
    fn test_objects_key_order() {
        let a = json!({"x": 1, "y": {"z": [1]}});
        let b = json!({"y": {"z": [1]}, "x": 1});
        assert!(is_equal(&a, &b));
        assert!(!is_equal(&a, &json!({"x": 1})));
        assert!(!is_equal(&json!({"x": 1}), &json!({"y": 1})));
    }

    #[test]
    fn test_optional() {
        assert!(is_equal_opt(None, None));
        assert!(!is_equal_opt(Some(&json!(null)), None));
        assert!(is_equal_opt(Some(&json!(2)), Some(&json!(2.0))));
    }
}
