//! JSON codec for patch operations.
//!
//! Operations are encoded in the RFC 6902 shape:
//! `{"op": "add", "path": "/items/0", "value": "x"}`. Pointers travel as
//! their canonical string form.

use dojo_json_pointer::Pointer;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

use crate::error::{StoreError, StoreResult};
use crate::operations::PatchOperation;

/// Serialize an operation to a JSON object.
pub fn to_json(op: &PatchOperation) -> Value {
    match op {
        PatchOperation::Add { path, value } => json!({
            "op": "add",
            "path": path.path(),
            "value": value
        }),
        PatchOperation::Replace { path, value } => json!({
            "op": "replace",
            "path": path.path(),
            "value": value
        }),
        PatchOperation::Remove { path } => json!({
            "op": "remove",
            "path": path.path()
        }),
        PatchOperation::Test { path, value } => json!({
            "op": "test",
            "path": path.path(),
            "value": value
        }),
    }
}

/// Deserialize an operation from a JSON object.
///
/// # Errors
///
/// - `StoreError::UnknownOperation` if `op` names no known operation
/// - `StoreError::InvalidOperation` if the object is malformed
pub fn from_json(value: &Value) -> StoreResult<PatchOperation> {
    let obj = value
        .as_object()
        .ok_or_else(|| StoreError::InvalidOperation("operation must be an object".into()))?;
    let op = obj
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidOperation("missing op".into()))?;
    let path = obj
        .get("path")
        .ok_or_else(|| StoreError::InvalidOperation("missing path".into()))?
        .as_str()
        .map(Pointer::new)
        .ok_or_else(|| StoreError::InvalidOperation("path must be a string".into()))?;
    let value = || {
        obj.get("value")
            .cloned()
            .ok_or_else(|| StoreError::InvalidOperation(format!("{op} requires a value")))
    };

    match op {
        "add" => Ok(PatchOperation::Add { path, value: value()? }),
        "replace" => Ok(PatchOperation::Replace { path, value: value()? }),
        "remove" => Ok(PatchOperation::Remove { path }),
        "test" => Ok(PatchOperation::Test { path, value: value()? }),
        other => Err(StoreError::UnknownOperation(other.to_string())),
    }
}

/// Serialize a list of operations to a JSON array.
pub fn to_json_patch(ops: &[PatchOperation]) -> Value {
    Value::Array(ops.iter().map(to_json).collect())
}

/// Deserialize a JSON array of operations.
///
/// # Errors
///
/// `StoreError::InvalidOperation` if `value` is not an array, otherwise the
/// first failing element's error.
pub fn from_json_patch(value: &Value) -> StoreResult<Vec<PatchOperation>> {
    value
        .as_array()
        .ok_or_else(|| StoreError::InvalidOperation("patch must be an array".into()))?
        .iter()
        .map(from_json)
        .collect()
}

impl Serialize for PatchOperation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PatchOperation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        from_json(&value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_rfc6902_shape() {
        let op = PatchOperation::Add {
            path: Pointer::from_segments(["a/b", "0"]),
            value: json!({"x": 1}),
        };
        assert_eq!(
            to_json(&op),
            json!({"op": "add", "path": "/a~1b/0", "value": {"x": 1}})
        );
        assert_eq!(
            to_json(&PatchOperation::Remove { path: Pointer::new("/a") }),
            json!({"op": "remove", "path": "/a"})
        );
    }

    #[test]
    fn decodes_each_operation() {
        let ops = from_json_patch(&json!([
            {"op": "add", "path": "/a", "value": 1},
            {"op": "replace", "path": "/a", "value": null},
            {"op": "test", "path": "/a", "value": null},
            {"op": "remove", "path": "/a"}
        ]))
        .unwrap();
        assert_eq!(
            ops.iter().map(PatchOperation::op_name).collect::<Vec<_>>(),
            ["add", "replace", "test", "remove"]
        );
        assert_eq!(ops[1].value(), Some(&Value::Null));
    }

    #[test]
    fn unknown_op_is_rejected() {
        let err = from_json(&json!({"op": "move", "path": "/a", "from": "/b"})).unwrap_err();
        assert!(matches!(err, StoreError::UnknownOperation(ref op) if op == "move"));
    }

    #[test]
    fn malformed_ops_are_rejected() {
        assert!(matches!(
            from_json(&json!({"op": "add", "path": "/a"})),
            Err(StoreError::InvalidOperation(_))
        ));
        assert!(matches!(
            from_json(&json!({"op": "add", "path": 3, "value": 1})),
            Err(StoreError::InvalidOperation(_))
        ));
        assert!(matches!(from_json(&json!([])), Err(StoreError::InvalidOperation(_))));
        assert!(matches!(
            from_json_patch(&json!({})),
            Err(StoreError::InvalidOperation(_))
        ));
    }

    #[test]
    fn serde_uses_codec() {
        let op = PatchOperation::Test {
            path: Pointer::new("/n"),
            value: json!(1),
        };
        let text = serde_json::to_string(&op).unwrap();
        let back: PatchOperation = serde_json::from_str(&text).unwrap();
        assert_eq!(back, op);

        let err = serde_json::from_str::<PatchOperation>(r#"{"op":"copy","path":"/a"}"#);
        assert!(err.unwrap_err().to_string().contains("UNKNOWN_OPERATION"));
    }
}
