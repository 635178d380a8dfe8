//! Patch-based state store with change tracking and undo/redo history.
//!
//! State is a single `serde_json::Value` tree. Every mutation is a list of
//! [`PatchOperation`]s addressed by JSON Pointer; applying them produces a
//! new root plus the operations that revert the change.
//!
//! # Example
//!
//! ```
//! use dojo_stores::{add, Store};
//! use serde_json::json;
//!
//! let mut store = Store::new();
//! store.apply(&[add(&store.path("items"), json!([]))], false).unwrap();
//!
//! let items = store.path("items");
//! let undo = store.apply(&[add(&store.at(&items, 0), "x")], true).unwrap();
//! assert_eq!(store.get(&store.path("items")), Some(&json!(["x"])));
//!
//! store.apply(&undo, true).unwrap();
//! assert_eq!(store.get(&store.path("items")), Some(&json!([])));
//! ```

pub mod cli;
pub mod codec;
pub mod error;
pub mod history;
pub mod operations;
pub mod patch;
pub mod process;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use history::{HistoryEntry, HistoryManager, SerializedHistory};
pub use operations::{add, remove, replace, test, PatchOperation};
pub use patch::{apply_op, Patch, PatchResult};
pub use process::{command, Command, CommandRequest, Process, ProcessError, ProcessResult};
pub use store::{Path, PathRef, Store, StoreId, Subscription};

pub use dojo_json_pointer::Pointer;
