use serde_json::Value;

use crate::util::array_index;

/// Get a value from a JSON document by decoded segments.
///
/// Missing keys, out-of-range indexes and descents into scalars all yield
/// `None`; reading never fails.
pub fn get<'a, S: AsRef<str>>(val: &'a Value, segments: &[S]) -> Option<&'a Value> {
    let mut current = val;
    for segment in segments {
        let segment = segment.as_ref();
        match current {
            Value::Array(arr) => {
                let idx = array_index(segment, arr.len())?;
                current = arr.get(idx)?;
            }
            Value::Object(map) => {
                current = map.get(segment)?;
            }
            _ => return None,
        }
    }
    Some(current)
}
