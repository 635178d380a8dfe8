//! Ordered application of patch operations with undo computation.
//!
//! A [`Patch`] never mutates its input: the root is cloned into a working
//! copy, every operation runs against the result of the previous one, and
//! the inverse of each mutating operation is computed from the value that
//! was in place right before it ran. Inverses are prepended, so replaying
//! `undo_operations` in order reverts the most recent operation first.
//!
//! Inverse paths name the slots that were actually written: `-`, indexes
//! past the end and containers created on the way down are rewritten to
//! the array positions they landed at. When a write had to create
//! intermediate containers, its inverse removes the outermost one again (or
//! puts back the scalar it displaced), so undo leaves no scaffolding behind.
//!
//! The working copy is a deep clone of the root. `serde_json::Value` has no
//! shared subtrees, so an apply costs time proportional to the size of the
//! whole state, not just the touched path. Stores are expected to stay
//! small enough for that to be cheap.

use dojo_json_pointer::{array_index, CreatedSlot, Pointer, PointerTarget};
use dojo_util::is_equal_opt;
use serde_json::Value;
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::operations::PatchOperation;

/// Result of applying a full patch.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchResult {
    /// The new root.
    pub object: Value,
    /// Operations that revert the whole batch when applied to `object`.
    pub undo_operations: Vec<PatchOperation>,
}

/// An ordered batch of operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    operations: Vec<PatchOperation>,
}

impl Patch {
    pub fn new(operations: impl Into<Vec<PatchOperation>>) -> Self {
        Self {
            operations: operations.into(),
        }
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.operations
    }

    /// Apply every operation to a copy of `object`.
    ///
    /// # Errors
    ///
    /// Fails on the first failing operation. Earlier operations are not
    /// rolled back inside the working copy, but the copy is dropped, so the
    /// caller only ever sees a complete result or an error.
    pub fn apply(&self, object: &Value) -> StoreResult<PatchResult> {
        let mut working = object.clone();
        let mut undo_operations: Vec<PatchOperation> = Vec::new();

        for op in &self.operations {
            let inverse = apply_op(&mut working, op)?;
            if !inverse.is_empty() {
                undo_operations.splice(0..0, inverse);
            }
        }

        Ok(PatchResult {
            object: working,
            undo_operations,
        })
    }
}

/// Apply a single operation in place and return its inverse.
pub fn apply_op(doc: &mut Value, op: &PatchOperation) -> StoreResult<Vec<PatchOperation>> {
    match op {
        PatchOperation::Test { path, value } => {
            if !is_equal_opt(path.get(doc), Some(value)) {
                warn!(path = %path, "test operation failed");
                return Err(StoreError::TestFailure { path: path.clone() });
            }
            Ok(Vec::new())
        }
        PatchOperation::Add { path, value } => {
            let mut target = walk_to(doc, path, true)?.ok_or_else(|| invalid_target(path))?;
            let parents = std::mem::take(&mut target.parents);
            let created = target.created.take();
            let slot = add_at(target, value.clone()).map_err(|e| e.at(path))?;
            let restore = restore_created(&parents, created);
            let path = resolved(path, parents, slot.index);
            if let Some(restore) = restore {
                return Ok(vec![PatchOperation::Test { path, value: value.clone() }, restore]);
            }
            if path.is_root() {
                let previous = slot.previous.unwrap_or(Value::Null);
                return Ok(vec![
                    PatchOperation::Test { path: path.clone(), value: value.clone() },
                    PatchOperation::Replace { path, value: previous },
                ]);
            }
            Ok(vec![
                PatchOperation::Test { path: path.clone(), value: value.clone() },
                PatchOperation::Remove { path },
            ])
        }
        PatchOperation::Replace { path, value } => {
            let mut target = walk_to(doc, path, true)?.ok_or_else(|| invalid_target(path))?;
            let parents = std::mem::take(&mut target.parents);
            let created = target.created.take();
            let slot = replace_at(target, value.clone()).map_err(|e| e.at(path))?;
            let restore = restore_created(&parents, created);
            let path = resolved(path, parents, slot.index);
            let test = PatchOperation::Test { path: path.clone(), value: value.clone() };
            if let Some(restore) = restore {
                return Ok(vec![test, restore]);
            }
            match slot.previous {
                Some(previous) => Ok(vec![test, PatchOperation::Replace { path, value: previous }]),
                None => Ok(vec![test, PatchOperation::Remove { path }]),
            }
        }
        PatchOperation::Remove { path } => {
            let Some(target) = walk_to(doc, path, false)? else {
                return Ok(Vec::new());
            };
            let previous = remove_at(target).map_err(|e| e.at(path))?;
            Ok(previous
                .map(|value| vec![PatchOperation::Add { path: path.clone(), value }])
                .unwrap_or_default())
        }
    }
}

fn walk_to<'a>(
    doc: &'a mut Value,
    path: &Pointer,
    create_missing: bool,
) -> StoreResult<Option<PointerTarget<'a>>> {
    path.walk(doc, create_missing)
        .map_err(|e| StoreError::from_pointer(e, path))
}

fn invalid_target(path: &Pointer) -> StoreError {
    StoreError::InvalidTarget { path: path.clone() }
}

/// The pointer of the slot that was written: the concrete parents the walk
/// descended plus the array index touched, if any.
fn resolved(path: &Pointer, parents: Vec<String>, index: Option<usize>) -> Pointer {
    let Some(last) = path.segments().last() else {
        return path.clone();
    };
    let last = index.map_or_else(|| last.clone(), |idx| idx.to_string());
    Pointer::from_segments(parents.into_iter().chain([last]))
}

/// The operation undoing a walk's created container: remove it, or put back
/// the scalar it replaced.
fn restore_created(parents: &[String], created: Option<CreatedSlot>) -> Option<PatchOperation> {
    let created = created?;
    let path = Pointer::from_segments(created.path(parents)?.iter().cloned());
    Some(match created.previous {
        Some(value) => PatchOperation::Replace { path, value },
        None => PatchOperation::Remove { path },
    })
}

// ── Slot mutations ────────────────────────────────────────────────────────

#[derive(Debug)]
enum SlotError {
    InvalidIndex(String),
    InvalidTarget,
}

impl SlotError {
    fn at(self, path: &Pointer) -> StoreError {
        match self {
            SlotError::InvalidIndex(segment) => StoreError::InvalidIndex {
                path: path.clone(),
                segment,
            },
            SlotError::InvalidTarget => invalid_target(path),
        }
    }
}

/// What a write touched: the array index (if the parent is an array) and
/// the value previously stored in the slot.
#[derive(Debug)]
struct Touched {
    index: Option<usize>,
    previous: Option<Value>,
}

fn index_in(segment: &str, len: usize) -> Result<usize, SlotError> {
    array_index(segment, len).ok_or_else(|| SlotError::InvalidIndex(segment.to_string()))
}

fn add_at(target: PointerTarget<'_>, value: Value) -> Result<Touched, SlotError> {
    let Some(segment) = target.segment else {
        let previous = std::mem::replace(target.target, value);
        return Ok(Touched { index: None, previous: Some(previous) });
    };
    match target.target {
        Value::Array(arr) => {
            let idx = index_in(&segment, arr.len())?.min(arr.len());
            arr.insert(idx, value);
            Ok(Touched { index: Some(idx), previous: None })
        }
        Value::Object(map) => {
            let previous = map.insert(segment, value);
            Ok(Touched { index: None, previous })
        }
        _ => Err(SlotError::InvalidTarget),
    }
}

fn replace_at(
    target: PointerTarget<'_>,
    value: Value,
) -> Result<Touched, SlotError> {
    let Some(segment) = target.segment else {
        let previous = std::mem::replace(target.target, value);
        return Ok(Touched { index: None, previous: Some(previous) });
    };
    match target.target {
        Value::Array(arr) => {
            let idx = index_in(&segment, arr.len())?;
            if idx < arr.len() {
                let previous = std::mem::replace(&mut arr[idx], value);
                Ok(Touched { index: Some(idx), previous: Some(previous) })
            } else {
                arr.push(value);
                Ok(Touched { index: Some(arr.len() - 1), previous: None })
            }
        }
        Value::Object(map) => {
            let previous = map.insert(segment, value);
            Ok(Touched { index: None, previous })
        }
        _ => Err(SlotError::InvalidTarget),
    }
}

fn remove_at(target: PointerTarget<'_>) -> Result<Option<Value>, SlotError> {
    let Some(segment) = target.segment else {
        return Ok(Some(std::mem::take(target.target)));
    };
    match target.target {
        Value::Array(arr) => {
            let idx = index_in(&segment, arr.len())?;
            if idx < arr.len() {
                Ok(Some(arr.remove(idx)))
            } else {
                Ok(None)
            }
        }
        Value::Object(map) => Ok(map.shift_remove(&segment)),
        _ => Err(SlotError::InvalidTarget),
    }
}
