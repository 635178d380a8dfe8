//! Undo/redo history for stores driven by processes.
//!
//! The manager keeps three stacks per store, keyed by [`StoreId`]:
//! `history` (forward operations of each recorded process), `undo` (the
//! matching inverse operations) and `redo` (operations that re-apply an
//! undone entry). `history` and `undo` always move together.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreResult;
use crate::operations::PatchOperation;
use crate::patch::Patch;
use crate::process::ProcessResult;
use crate::store::{Store, StoreId};

/// One recorded step: the id of the process that produced it and its
/// operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub operations: Vec<PatchOperation>,
}

/// Persisted form of a store's history.
///
/// The undo stack is not stored: it is rebuilt by replaying `history`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedHistory {
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub redo: Vec<HistoryEntry>,
}

#[derive(Debug, Default)]
struct HistoryData {
    history: Vec<HistoryEntry>,
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
}

#[derive(Debug, Default)]
pub struct HistoryManager {
    stores: HashMap<StoreId, HistoryData>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `callback` so every result it sees is also recorded.
    ///
    /// The returned closure calls `callback` first, then records.
    pub fn collector<'a, F>(&'a mut self, mut callback: F) -> impl FnMut(&ProcessResult) + 'a
    where
        F: FnMut(&ProcessResult) + 'a,
    {
        move |result| {
            callback(result);
            self.record(result);
        }
    }

    /// Push a process result on the store's history and clear its redo
    /// stack.
    pub fn record(&mut self, result: &ProcessResult) {
        let data = self.stores.entry(result.store_id).or_default();
        data.history.push(HistoryEntry {
            id: result.id.clone(),
            operations: result.operations.clone(),
        });
        data.undo.push(HistoryEntry {
            id: result.id.clone(),
            operations: result.undo_operations.clone(),
        });
        data.redo.clear();
    }

    pub fn can_undo(&self, store: &Store) -> bool {
        self.stores
            .get(&store.id())
            .is_some_and(|data| !data.undo.is_empty() && !data.history.is_empty())
    }

    /// Revert the most recent entry. Returns `false` when there is nothing to
    /// undo.
    ///
    /// # Errors
    ///
    /// The apply failure; the stacks are left as they were.
    pub fn undo(&mut self, store: &mut Store) -> StoreResult<bool> {
        let Some(data) = self.stores.get_mut(&store.id()) else {
            return Ok(false);
        };
        if data.history.is_empty() {
            return Ok(false);
        }
        let Some(entry) = data.undo.last() else {
            return Ok(false);
        };
        debug!(store = %store.id(), process = %entry.id, "undo");
        let operations = store.apply(&entry.operations, true)?;

        if let Some(entry) = data.undo.pop() {
            data.history.pop();
            data.redo.push(HistoryEntry {
                id: entry.id,
                operations,
            });
        }
        Ok(true)
    }

    pub fn can_redo(&self, store: &Store) -> bool {
        self.stores
            .get(&store.id())
            .is_some_and(|data| !data.redo.is_empty())
    }

    /// Re-apply the most recently undone entry. Returns `false` when there is
    /// nothing to redo.
    ///
    /// # Errors
    ///
    /// The apply failure; the stacks are left as they were.
    pub fn redo(&mut self, store: &mut Store) -> StoreResult<bool> {
        let Some(data) = self.stores.get_mut(&store.id()) else {
            return Ok(false);
        };
        let Some(entry) = data.redo.last() else {
            return Ok(false);
        };
        debug!(store = %store.id(), process = %entry.id, "redo");
        let undo_operations = store.apply(&entry.operations, true)?;

        if let Some(entry) = data.redo.pop() {
            data.undo.push(HistoryEntry {
                id: entry.id.clone(),
                operations: undo_operations,
            });
            data.history.push(entry);
        }
        Ok(true)
    }

    /// Forward entries recorded for `store`, oldest first.
    pub fn history(&self, store: &Store) -> &[HistoryEntry] {
        self.stores
            .get(&store.id())
            .map(|data| data.history.as_slice())
            .unwrap_or_default()
    }

    pub fn serialize(&self, store: &Store) -> SerializedHistory {
        self.stores
            .get(&store.id())
            .map(|data| SerializedHistory {
                history: data.history.clone(),
                redo: data.redo.clone(),
            })
            .unwrap_or_default()
    }

    /// Replay `data.history` onto `store`, rebuilding the undo stack, then
    /// restore the redo stack and invalidate.
    ///
    /// The entries are replayed onto a private copy of the root, which only
    /// replaces the store's root once every entry applied.
    ///
    /// # Errors
    ///
    /// The first failing entry. The store and its recorded history are left
    /// as they were.
    pub fn deserialize(&mut self, store: &mut Store, data: SerializedHistory) -> StoreResult<()> {
        debug!(store = %store.id(), entries = data.history.len(), "replaying history");
        let mut state = store.state();
        let mut undo = Vec::with_capacity(data.history.len());
        for entry in &data.history {
            let result = Patch::new(entry.operations.as_slice()).apply(&state)?;
            state = Arc::new(result.object);
            undo.push(HistoryEntry {
                id: entry.id.clone(),
                operations: result.undo_operations,
            });
        }
        store.set_state(state);
        self.stores.insert(
            store.id(),
            HistoryData {
                history: data.history,
                undo,
                redo: data.redo,
            },
        );
        store.invalidate();
        Ok(())
    }

    /// Forget everything recorded for `store`.
    pub fn clear(&mut self, store: &Store) {
        self.stores.remove(&store.id());
    }
}
