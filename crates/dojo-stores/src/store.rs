//! The state store.
//!
//! A [`Store`] owns the current root and replaces it wholesale on every
//! successful [`Store::apply`]. Reads go through [`Path`] snapshots that
//! capture the root they were resolved against, so a snapshot taken before
//! an apply keeps observing the old tree.
//!
//! A snapshot shares the root through its `Arc` but owns a copy of the value
//! it resolved to, so resolving the root path copies the whole state.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dojo_json_pointer::Pointer;
use dojo_util::is_equal_opt;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::StoreResult;
use crate::operations::PatchOperation;
use crate::patch::Patch;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a store, used to key per-store side data such as
/// history stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(u64);

impl StoreId {
    fn next() -> Self {
        StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store#{}", self.0)
    }
}

/// A snapshot binding a pointer string to the root it was resolved against
/// and the value observed there.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Canonical pointer string.
    pub path: String,
    /// The root at resolution time.
    pub state: Arc<Value>,
    /// The value at `path` in `state`, `None` when absent.
    pub value: Option<Value>,
}

impl Path {
    pub fn pointer(&self) -> Pointer {
        Pointer::new(&self.path)
    }

    /// Deserialize the captured value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the value does not have the
    /// shape of `T`.
    pub fn value_as<T: DeserializeOwned>(&self) -> StoreResult<Option<T>> {
        self.value
            .as_ref()
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(Into::into)
    }
}

/// The base of a path construction: a pointer string or an earlier path.
#[derive(Debug, Clone, Copy)]
pub enum PathRef<'a> {
    Str(&'a str),
    Path(&'a Path),
}

impl<'a> From<&'a str> for PathRef<'a> {
    fn from(s: &'a str) -> Self {
        PathRef::Str(s)
    }
}

impl<'a> From<&'a String> for PathRef<'a> {
    fn from(s: &'a String) -> Self {
        PathRef::Str(s)
    }
}

impl<'a> From<&'a Path> for PathRef<'a> {
    fn from(p: &'a Path) -> Self {
        PathRef::Path(p)
    }
}

// ── Change registry ───────────────────────────────────────────────────────

type Callback = Rc<dyn Fn()>;

struct CallbackItem {
    callback_id: usize,
    callback: Callback,
}

struct OnChangeValue {
    callbacks: Vec<CallbackItem>,
    previous_value: Option<Value>,
}

#[derive(Default)]
struct Registry {
    change_paths: IndexMap<String, OnChangeValue>,
    invalidate_listeners: Vec<CallbackItem>,
    next_callback_id: usize,
}

impl Registry {
    fn next_id(&mut self) -> usize {
        let id = self.next_callback_id;
        self.next_callback_id += 1;
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubscriptionKind {
    Change,
    Invalidate,
}

/// Handle returned by [`Store::on_change`] and [`Store::on_invalidate`].
///
/// Dropping the handle keeps the registration; call [`Subscription::remove`]
/// to unregister.
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    kind: SubscriptionKind,
    paths: Vec<String>,
    callback_id: usize,
}

impl Subscription {
    /// Unregister exactly this registration. Other subscribers on the same
    /// paths are untouched. Calling it twice, or after the store is gone, is
    /// a no-op.
    pub fn remove(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.borrow_mut();
        let id = self.callback_id;
        match self.kind {
            SubscriptionKind::Change => {
                for path in &self.paths {
                    let emptied = registry.change_paths.get_mut(path).is_some_and(|entry| {
                        entry.callbacks.retain(|item| item.callback_id != id);
                        entry.callbacks.is_empty()
                    });
                    if emptied {
                        registry.change_paths.shift_remove(path);
                    }
                }
            }
            SubscriptionKind::Invalidate => {
                registry.invalidate_listeners.retain(|item| item.callback_id != id);
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("paths", &self.paths)
            .field("callback_id", &self.callback_id)
            .finish()
    }
}

// ── Store ─────────────────────────────────────────────────────────────────

/// Patch-based state container.
pub struct Store {
    id: StoreId,
    state: Arc<Value>,
    registry: Rc<RefCell<Registry>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// A store whose root is the empty object.
    pub fn new() -> Self {
        Self::with_state(Value::Object(Map::new()))
    }

    pub fn with_state(state: Value) -> Self {
        Self {
            id: StoreId::next(),
            state: Arc::new(state),
            registry: Rc::new(RefCell::new(Registry::default())),
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    /// The current root.
    pub fn state(&self) -> Arc<Value> {
        Arc::clone(&self.state)
    }

    /// Resolve a path from a pointer string or an earlier path.
    ///
    /// A string base is parsed as a pointer string, so `"todos/0"` and
    /// `"/todos/0"` are the same path.
    pub fn path<'a>(&self, base: impl Into<PathRef<'a>>) -> Path {
        self.path_with::<&str>(base, &[])
    }

    /// Resolve a path from a base plus literal key segments.
    ///
    /// With extra segments a string base is taken as one literal key, e.g.
    /// `path_with("a", &["b/c"])` addresses key `b/c` inside `a`.
    pub fn path_with<'a, S: AsRef<str>>(
        &self,
        base: impl Into<PathRef<'a>>,
        segments: &[S],
    ) -> Path {
        let pointer = match base.into() {
            PathRef::Str(s) if segments.is_empty() => Pointer::new(s),
            PathRef::Str(s) => Pointer::from_segments(
                std::iter::once(s).chain(segments.iter().map(|segment| segment.as_ref())),
            ),
            PathRef::Path(p) => segments
                .iter()
                .fold(p.pointer(), |pointer, segment| pointer.push(segment.as_ref())),
        };
        self.resolve(&pointer)
    }

    /// Child path addressing element `index` of an array-valued path.
    pub fn at(&self, path: &Path, index: usize) -> Path {
        let value = path
            .value
            .as_ref()
            .and_then(Value::as_array)
            .and_then(|arr| arr.get(index))
            .cloned();
        Path {
            path: format!("{}/{}", path.path, index),
            state: Arc::clone(&path.state),
            value,
        }
    }

    /// The value captured when `path` was resolved.
    pub fn get<'p>(&self, path: &'p Path) -> Option<&'p Value> {
        path.value.as_ref()
    }

    fn resolve(&self, pointer: &Pointer) -> Path {
        Path {
            path: pointer.path(),
            state: Arc::clone(&self.state),
            value: pointer.get(&self.state).cloned(),
        }
    }

    /// Apply `operations` and swap in the new root.
    ///
    /// Returns the operations that undo the batch. With `invalidate`, change
    /// callbacks and invalidate listeners run before returning.
    ///
    /// # Errors
    ///
    /// Any operation failure. The root is left exactly as it was.
    pub fn apply(
        &mut self,
        operations: &[PatchOperation],
        invalidate: bool,
    ) -> StoreResult<Vec<PatchOperation>> {
        debug!(store = %self.id, operations = operations.len(), "applying patch");
        let result = Patch::new(operations.to_vec()).apply(&self.state)?;
        self.state = Arc::new(result.object);
        if invalidate {
            self.invalidate();
        }
        Ok(result.undo_operations)
    }

    /// Swap in a root computed elsewhere. Nothing is notified.
    pub(crate) fn set_state(&mut self, state: Arc<Value>) {
        self.state = state;
    }

    /// Register `callback` for changes under any of `paths`.
    ///
    /// One registration carries one callback id, so the callback runs at
    /// most once per [`Store::invalidate`] even when several of its paths
    /// changed.
    pub fn on_change<'p, I, F>(&self, paths: I, callback: F) -> Subscription
    where
        I: IntoIterator<Item = &'p Path>,
        F: Fn() + 'static,
    {
        let callback: Callback = Rc::new(callback);
        let mut registry = self.registry.borrow_mut();
        let callback_id = registry.next_id();
        let mut keys = Vec::new();
        for path in paths {
            let entry = registry
                .change_paths
                .entry(path.path.clone())
                .or_insert_with(|| OnChangeValue {
                    callbacks: Vec::new(),
                    previous_value: path.value.clone(),
                });
            entry.callbacks.push(CallbackItem {
                callback_id,
                callback: Rc::clone(&callback),
            });
            keys.push(path.path.clone());
        }
        Subscription {
            registry: Rc::downgrade(&self.registry),
            kind: SubscriptionKind::Change,
            paths: keys,
            callback_id,
        }
    }

    /// Register a listener for every [`Store::invalidate`] call.
    pub fn on_invalidate<F: Fn() + 'static>(&self, callback: F) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let callback_id = registry.next_id();
        registry.invalidate_listeners.push(CallbackItem {
            callback_id,
            callback: Rc::new(callback),
        });
        Subscription {
            registry: Rc::downgrade(&self.registry),
            kind: SubscriptionKind::Invalidate,
            paths: Vec::new(),
            callback_id,
        }
    }

    /// Run change detection over every tracked path, then notify invalidate
    /// listeners.
    pub fn invalidate(&self) {
        let pending = {
            let mut registry = self.registry.borrow_mut();
            let mut called: Vec<usize> = Vec::new();
            let mut pending: Vec<Callback> = Vec::new();

            for (path, entry) in registry.change_paths.iter_mut() {
                let current = Pointer::new(path).get(&self.state);
                if is_equal_opt(entry.previous_value.as_ref(), current) {
                    continue;
                }
                entry.previous_value = current.cloned();
                for item in &entry.callbacks {
                    if !called.contains(&item.callback_id) {
                        called.push(item.callback_id);
                        pending.push(Rc::clone(&item.callback));
                    }
                }
            }
            trace!(store = %self.id, callbacks = pending.len(), "change callbacks due");

            pending.extend(
                registry
                    .invalidate_listeners
                    .iter()
                    .map(|item| Rc::clone(&item.callback)),
            );
            pending
        };

        for callback in pending {
            callback();
        }
    }
}
