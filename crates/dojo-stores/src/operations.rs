//! Patch operations and the factories that build them from store paths.

use dojo_json_pointer::Pointer;
use serde_json::Value;

use crate::store::Path;

/// A single patch operation.
///
/// The set is closed: every consumer matches exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOperation {
    Add { path: Pointer, value: Value },
    Replace { path: Pointer, value: Value },
    Remove { path: Pointer },
    Test { path: Pointer, value: Value },
}

impl PatchOperation {
    /// Returns the operation name as used on the wire.
    pub fn op_name(&self) -> &'static str {
        match self {
            PatchOperation::Add { .. } => "add",
            PatchOperation::Replace { .. } => "replace",
            PatchOperation::Remove { .. } => "remove",
            PatchOperation::Test { .. } => "test",
        }
    }

    pub fn path(&self) -> &Pointer {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Replace { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Test { path, .. } => path,
        }
    }

    /// The carried value, `None` for `remove`.
    pub fn value(&self) -> Option<&Value> {
        match self {
            PatchOperation::Add { value, .. }
            | PatchOperation::Replace { value, .. }
            | PatchOperation::Test { value, .. } => Some(value),
            PatchOperation::Remove { .. } => None,
        }
    }

    pub fn is_test(&self) -> bool {
        matches!(self, PatchOperation::Test { .. })
    }
}

/// Insert `value` at `path` (array slots shift right).
pub fn add(path: &Path, value: impl Into<Value>) -> PatchOperation {
    PatchOperation::Add {
        path: path.pointer(),
        value: value.into(),
    }
}

/// Overwrite the value at `path`.
pub fn replace(path: &Path, value: impl Into<Value>) -> PatchOperation {
    PatchOperation::Replace {
        path: path.pointer(),
        value: value.into(),
    }
}

/// Delete the value at `path`.
pub fn remove(path: &Path) -> PatchOperation {
    PatchOperation::Remove {
        path: path.pointer(),
    }
}

/// Assert the value at `path` equals `value`.
pub fn test(path: &Path, value: impl Into<Value>) -> PatchOperation {
    PatchOperation::Test {
        path: path.pointer(),
        value: value.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use serde_json::json;

    #[test]
    fn factories_carry_pointer_and_value() {
        let store = Store::new();
        let path = store.path_with("todos", &["0", "label"]);

        let op = add(&path, "milk");
        assert_eq!(op.op_name(), "add");
        assert_eq!(op.path().path(), "/todos/0/label");
        assert_eq!(op.value(), Some(&json!("milk")));

        let op = remove(&path);
        assert_eq!(op.op_name(), "remove");
        assert_eq!(op.value(), None);

        assert_eq!(replace(&path, 1).op_name(), "replace");
        assert!(test(&path, json!(null)).is_test());
    }
}
