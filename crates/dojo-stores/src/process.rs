//! Synchronous processes: named sequences of commands that read the store
//! and return operations to apply.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::operations::PatchOperation;
use crate::store::{Path, PathRef, Store, StoreId};

/// What a command sees: read access to the store plus the process payload.
pub struct CommandRequest<'a> {
    store: &'a Store,
    payload: &'a Value,
}

impl<'a> CommandRequest<'a> {
    pub fn payload(&self) -> &Value {
        self.payload
    }

    pub fn get<'p>(&self, path: &'p Path) -> Option<&'p Value> {
        self.store.get(path)
    }

    pub fn path<'b>(&self, base: impl Into<PathRef<'b>>) -> Path {
        self.store.path(base)
    }

    pub fn path_with<'b, S: AsRef<str>>(
        &self,
        base: impl Into<PathRef<'b>>,
        segments: &[S],
    ) -> Path {
        self.store.path_with(base, segments)
    }

    pub fn at(&self, path: &Path, index: usize) -> Path {
        self.store.at(path, index)
    }
}

pub type Command = Box<dyn Fn(&CommandRequest<'_>) -> StoreResult<Vec<PatchOperation>>>;

/// Box a closure as a [`Command`].
pub fn command<F>(f: F) -> Command
where
    F: Fn(&CommandRequest<'_>) -> StoreResult<Vec<PatchOperation>> + 'static,
{
    Box::new(f)
}

/// Outcome of a successful [`Process::execute`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessResult {
    pub id: String,
    pub store_id: StoreId,
    /// Forward operations, in application order.
    pub operations: Vec<PatchOperation>,
    /// Operations that revert the whole process.
    pub undo_operations: Vec<PatchOperation>,
    pub payload: Value,
}

#[derive(Debug, Error)]
#[error("PROCESS_FAILED: {id}: {source}")]
pub struct ProcessError {
    pub id: String,
    #[source]
    pub source: StoreError,
}

pub struct Process {
    id: String,
    commands: Vec<Command>,
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("id", &self.id)
            .field("commands", &self.commands.len())
            .finish()
    }
}

impl Process {
    pub fn new(id: impl Into<String>, commands: Vec<Command>) -> Self {
        Self {
            id: id.into(),
            commands,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run every command in order against `store`.
    ///
    /// Each command's operations are applied (and the store invalidated)
    /// before the next command runs. Operations applied by earlier commands
    /// stay applied when a later one fails.
    ///
    /// # Errors
    ///
    /// The first command or apply failure, wrapped with the process id.
    pub fn execute(
        &self,
        store: &mut Store,
        payload: &Value,
    ) -> Result<ProcessResult, ProcessError> {
        debug!(
            process = %self.id,
            store = %store.id(),
            commands = self.commands.len(),
            "executing process"
        );
        let mut operations = Vec::new();
        let mut undo_operations = Vec::new();

        for command in &self.commands {
            let ops = {
                let request = CommandRequest {
                    store: &*store,
                    payload,
                };
                command(&request).map_err(|source| self.error(source))?
            };
            let undo = store.apply(&ops, true).map_err(|source| self.error(source))?;
            operations.extend(ops);
            undo_operations.splice(0..0, undo);
        }

        Ok(ProcessResult {
            id: self.id.clone(),
            store_id: store.id(),
            operations,
            undo_operations,
            payload: payload.clone(),
        })
    }

    /// [`Process::execute`], then hand a successful result to `after`.
    pub fn execute_with(
        &self,
        store: &mut Store,
        payload: &Value,
        after: &mut dyn FnMut(&ProcessResult),
    ) -> Result<ProcessResult, ProcessError> {
        let result = self.execute(store, payload)?;
        after(&result);
        Ok(result)
    }

    fn error(&self, source: StoreError) -> ProcessError {
        ProcessError {
            id: self.id.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::{add, replace, test};
    use serde_json::json;

    fn add_todo() -> Process {
        Process::new(
            "addTodo",
            vec![
                command(|req| {
                    let todos = req.path("todos");
                    if req.get(&todos).is_some() {
                        return Ok(vec![]);
                    }
                    Ok(vec![add(&todos, json!([]))])
                }),
                command(|req| {
                    let todos = req.path("todos");
                    let len = req.get(&todos).and_then(Value::as_array).map_or(0, Vec::len);
                    Ok(vec![add(&req.at(&todos, len), req.payload().clone())])
                }),
            ],
        )
    }

    #[test]
    fn later_commands_see_earlier_results() {
        let mut store = Store::new();
        let result = add_todo().execute(&mut store, &json!("milk")).unwrap();

        assert_eq!(store.state().as_ref(), &json!({"todos": ["milk"]}));
        assert_eq!(result.id, "addTodo");
        assert_eq!(result.store_id, store.id());
        assert_eq!(result.operations.len(), 2);
        assert_eq!(result.payload, json!("milk"));

        store.apply(&result.undo_operations, false).unwrap();
        assert_eq!(store.state().as_ref(), &json!({}));
    }

    #[test]
    fn execute_with_reports_result() {
        let mut store = Store::new();
        let mut seen = Vec::new();
        add_todo()
            .execute_with(&mut store, &json!("a"), &mut |r| seen.push(r.id.clone()))
            .unwrap();
        assert_eq!(seen, ["addTodo"]);
    }

    #[test]
    fn failing_command_reports_process_id() {
        let mut store = Store::with_state(json!({"n": 1}));
        let process = Process::new(
            "guarded",
            vec![command(|req| {
                let n = req.path("n");
                Ok(vec![test(&n, 2), replace(&n, 3)])
            })],
        );
        let mut called = false;
        let err = process
            .execute_with(&mut store, &Value::Null, &mut |_| called = true)
            .unwrap_err();
        assert_eq!(err.id, "guarded");
        assert!(matches!(err.source, StoreError::TestFailure { .. }));
        assert!(!called);
        assert_eq!(store.state().as_ref(), &json!({"n": 1}));
    }

    #[test]
    fn command_error_aborts() {
        let mut store = Store::new();
        let process = Process::new(
            "broken",
            vec![command(|_| {
                Err(StoreError::InvalidOperation("no".into()))
            })],
        );
        let err = process.execute(&mut store, &Value::Null).unwrap_err();
        assert!(err.to_string().starts_with("PROCESS_FAILED: broken"));
    }
}
