//! Core logic behind the `dojo-store` binary.
//!
//! - `apply`: apply a JSON patch to a state document, optionally reporting
//!   the undo operations
//! - `get`: resolve a pointer against a state document
//! - `replay`: rebuild a state document from serialized history

use serde_json::{json, Value};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::codec::{from_json_patch, to_json_patch};
use crate::error::StoreError;
use crate::history::{HistoryManager, SerializedHistory};
use crate::store::Store;

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("NOT_FOUND: {0}")]
    NotFound(String),
}

// ── Logging ───────────────────────────────────────────────────────────────

/// Install a stderr subscriber. `RUST_LOG` wins over `default_directive`.
///
/// Uses `try_init`, so a second call is a no-op.
pub fn init_logging(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

// ── apply ─────────────────────────────────────────────────────────────────

/// Apply `ops_json` (a patch array) to `state_json`.
///
/// Returns the new state, or `{"state": .., "undo": [..]}` when
/// `with_undo` is set.
pub fn apply_json_patch(
    state_json: &str,
    ops_json: &str,
    with_undo: bool,
) -> Result<Value, CliError> {
    let state: Value = serde_json::from_str(state_json)?;
    let ops = from_json_patch(&serde_json::from_str::<Value>(ops_json)?)?;
    let mut store = Store::with_state(state);
    let undo = store.apply(&ops, false)?;
    let state = store.state().as_ref().clone();
    if with_undo {
        Ok(json!({"state": state, "undo": to_json_patch(&undo)}))
    } else {
        Ok(state)
    }
}

// ── get ───────────────────────────────────────────────────────────────────

/// Resolve `pointer` against `state_json`.
pub fn lookup(state_json: &str, pointer: &str) -> Result<Value, CliError> {
    let state: Value = serde_json::from_str(state_json)?;
    let store = Store::with_state(state);
    store
        .path(pointer)
        .value
        .ok_or_else(|| CliError::NotFound(pointer.to_string()))
}

// ── replay ────────────────────────────────────────────────────────────────

/// Replay serialized history onto `initial` (or `{}`) and return the
/// resulting state.
pub fn replay(history_json: &str, initial: Option<&str>) -> Result<Value, CliError> {
    let data: SerializedHistory = serde_json::from_str(history_json)?;
    let mut store = match initial {
        Some(text) => Store::with_state(serde_json::from_str::<Value>(text)?),
        None => Store::new(),
    };
    HistoryManager::new().deserialize(&mut store, data)?;
    Ok(store.state().as_ref().clone())
}

// ── Tests ─────────────────────────────────────────────────────────────────
