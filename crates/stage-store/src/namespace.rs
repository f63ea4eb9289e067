// namespace.rs — Namespace handles over a committed/working tree pair.
//
// A store is one StoreState (identifier, committed tree, working tree,
// backend) shared through `Rc<RefCell<_>>`. A Namespace is that shared
// state plus a path. Deriving a child namespace copies the path only, so
// every handle derived from the same root reads and writes the same
// working tree.
//
// Every operation resolves its node afresh from the root; handles cache
// nothing, so a reset or commit through one handle is visible through all
// of them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::backend::{Backend, MemoryBackend};
use crate::error::StoreError;
use crate::key::{Key, NamespacePath};
use crate::tree;

/// State shared by every namespace derived from one root.
struct StoreState {
    id: String,
    committed: Value,
    /// `None` until first use; synthesized as a deep copy of `committed`.
    working: Option<Value>,
    backend: Box<dyn Backend>,
}

impl StoreState {
    fn working_mut(&mut self) -> &mut Value {
        if self.working.is_none() {
            tracing::debug!(id = %self.id, "synthesizing working tree");
        }
        let committed = &self.committed;
        self.working.get_or_insert_with(|| committed.clone())
    }
}

/// Construction options for a store.
pub struct StoreOptions {
    /// Persistence backend; `MemoryBackend` by default.
    pub backend: Box<dyn Backend>,
    /// Path of the returned handle inside the tree; root by default.
    pub namespace: NamespacePath,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            backend: Box::new(MemoryBackend::new()),
            namespace: NamespacePath::root(),
        }
    }
}

/// A view into a store at a fixed path.
///
/// Cloning a Namespace is cheap and yields a handle onto the same shared
/// trees. Handles are single-threaded (`!Send`); callers that need to
/// share a store across threads must serialize access themselves.
#[derive(Clone)]
pub struct Namespace {
    state: Rc<RefCell<StoreState>>,
    path: NamespacePath,
}

impl Namespace {
    /// Open a store by loading `id` from `backend`.
    ///
    /// A load failure is returned as-is; it is never replaced by an empty tree.
    pub fn open(id: impl Into<String>, backend: impl Backend + 'static) -> Result<Self, StoreError> {
        Self::with_options(
            id,
            None,
            StoreOptions {
                backend: Box::new(backend),
                ..StoreOptions::default()
            },
        )
    }

    /// Create a store that adopts `data` as its committed tree. The backend
    /// is not consulted until the first saving commit.
    pub fn with_data(
        id: impl Into<String>,
        data: Value,
        backend: impl Backend + 'static,
    ) -> Result<Self, StoreError> {
        Self::with_options(
            id,
            Some(data),
            StoreOptions {
                backend: Box::new(backend),
                ..StoreOptions::default()
            },
        )
    }

    /// General constructor: adopt `data` if given, otherwise load it.
    pub fn with_options(
        id: impl Into<String>,
        data: Option<Value>,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        let id = id.into();
        let committed = match data {
            Some(data) => data,
            None => {
                let loaded = options.backend.load(&id)?;
                tracing::debug!(id = %id, backend = options.backend.name(), "loaded committed tree");
                loaded
            }
        };
        let state = StoreState {
            id,
            committed,
            working: None,
            backend: options.backend,
        };
        Ok(Self {
            state: Rc::new(RefCell::new(state)),
            path: options.namespace,
        })
    }

    /// A handle one level deeper. The key need not exist yet.
    pub fn ns(&self, key: impl Into<Key>) -> Namespace {
        Namespace {
            state: Rc::clone(&self.state),
            path: self.path.child(key),
        }
    }

    /// A handle at the root of the same store.
    pub fn root(&self) -> Namespace {
        Namespace {
            state: Rc::clone(&self.state),
            path: NamespacePath::root(),
        }
    }

    /// The store identifier (the persistence key).
    pub fn id(&self) -> String {
        self.state.borrow().id.clone()
    }

    pub fn path(&self) -> &NamespacePath {
        &self.path
    }

    /// True if both handles belong to the same store instance.
    pub fn same_store(&self, other: &Namespace) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    fn unreachable(&self) -> StoreError {
        StoreError::Unreachable {
            path: self.path.to_string(),
        }
    }

    fn not_composite(&self) -> StoreError {
        StoreError::NotComposite {
            path: self.path.to_string(),
        }
    }

    /// Run `f` against this namespace's working node.
    fn with_working<R>(
        &self,
        f: impl FnOnce(&mut Value) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut state = self.state.borrow_mut();
        let node = tree::resolve_mut(state.working_mut(), &self.path)
            .ok_or_else(|| self.unreachable())?;
        f(node)
    }

    // ── Read / write ──

    /// Keys of the working node: `0..len` for lists, insertion order for mappings.
    pub fn keys(&self) -> Result<Vec<Key>, StoreError> {
        self.with_working(|node| tree::keys_of(node).ok_or_else(|| self.not_composite()))
    }

    /// The value at `key`, or `None` if absent. A stored `null` is `Some(Value::Null)`.
    pub fn get(&self, key: impl Into<Key>) -> Result<Option<Value>, StoreError> {
        let key = key.into();
        self.with_working(|node| {
            if !tree::NodeKind::of(node).is_composite() {
                return Err(self.not_composite());
            }
            Ok(tree::child(node, &key).cloned())
        })
    }

    pub fn has(&self, key: impl Into<Key>) -> Result<bool, StoreError> {
        let key = key.into();
        self.with_working(|node| {
            if !tree::NodeKind::of(node).is_composite() {
                return Err(self.not_composite());
            }
            Ok(tree::child(node, &key).is_some())
        })
    }

    /// Write `value` at `key`, creating or overwriting it.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<(), StoreError> {
        let key = key.into();
        let value = value.into();
        self.with_working(|node| {
            tree::put_child(node, &key, value, &self.path)?;
            Ok(())
        })
    }

    /// Remove `key`. Absent keys are a no-op.
    pub fn unset(&self, key: impl Into<Key>) -> Result<(), StoreError> {
        let key = key.into();
        self.with_working(|node| {
            tree::remove_child(node, &key, &self.path)?;
            Ok(())
        })
    }

    /// A copy of the whole working node.
    pub fn data(&self) -> Result<Value, StoreError> {
        self.with_working(|node| Ok(node.clone()))
    }

    /// A copy of the committed node.
    pub fn committed_data(&self) -> Result<Value, StoreError> {
        let state = self.state.borrow();
        tree::resolve(&state.committed, &self.path)
            .cloned()
            .ok_or_else(|| self.unreachable())
    }

    // ── Change detection / fold ──

    /// True iff the working node diverges from the committed node.
    ///
    /// A namespace that exists on only one side is dirty; one that exists on
    /// neither is unreachable.
    pub fn changed(&self) -> Result<bool, StoreError> {
        let state = self.state.borrow();
        let Some(working) = state.working.as_ref() else {
            return Ok(false);
        };
        match (
            tree::resolve(&state.committed, &self.path),
            tree::resolve(working, &self.path),
        ) {
            (Some(committed), Some(working)) => Ok(tree::diverges(committed, working)),
            (None, None) => Err(self.unreachable()),
            _ => Ok(true),
        }
    }

    /// Promote the working node into the committed tree, optionally persist
    /// the whole committed root, then reset this namespace.
    ///
    /// A namespace unset in the working tree is removed from the committed
    /// tree. If the backend save fails, the committed tree is restored, the
    /// staged edits are kept, and the error is returned.
    pub fn commit(&self, save: bool) -> Result<(), StoreError> {
        {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;

            let staged = tree::resolve(state.working_mut(), &self.path).cloned();
            let previous = state.committed.clone();
            self.promote(&mut state.committed, staged)?;

            if save {
                if let Err(e) = state.backend.save(&state.id, &state.committed) {
                    tracing::warn!(
                        id = %state.id,
                        path = %self.path,
                        backend = state.backend.name(),
                        "save failed, rolling back commit: {}",
                        e
                    );
                    state.committed = previous;
                    return Err(e);
                }
                tracing::info!(
                    id = %state.id,
                    path = %self.path,
                    backend = state.backend.name(),
                    "committed and saved"
                );
            } else {
                tracing::debug!(id = %state.id, path = %self.path, "committed without saving");
            }
        }
        self.reset()
    }

    /// Write `staged` into this namespace's committed slot, or remove the
    /// slot when the working tree no longer has it.
    fn promote(&self, committed: &mut Value, staged: Option<Value>) -> Result<(), StoreError> {
        match (self.path.split_last(), staged) {
            (None, Some(staged)) => *committed = staged,
            (None, None) => return Err(self.unreachable()),
            (Some((parent_path, key)), staged) => {
                let parent =
                    tree::resolve_mut(committed, &parent_path).ok_or_else(|| self.unreachable())?;
                match staged {
                    Some(staged) => {
                        tree::put_child(parent, key, staged, &parent_path)?;
                    }
                    None => {
                        if tree::remove_child(parent, key, &parent_path)?.is_none() {
                            return Err(self.unreachable());
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Discard staged edits at and below this namespace.
    ///
    /// Before any working tree exists this synthesizes the whole working
    /// tree from the committed tree, whatever the namespace. Otherwise the
    /// working node is folded back onto the committed node in place,
    /// leaving namespaces outside this path untouched.
    pub fn reset(&self) -> Result<(), StoreError> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;

        let Some(working) = state.working.as_mut() else {
            state.working = Some(state.committed.clone());
            tracing::debug!(id = %state.id, "reset: synthesized working tree");
            return Ok(());
        };

        match tree::resolve(&state.committed, &self.path) {
            Some(committed) => match tree::resolve_mut(working, &self.path) {
                Some(node) => tree::fold_reset(node, committed),
                None => {
                    // Unset in the working tree: copy the committed node back in.
                    let (parent_path, key) =
                        self.path.split_last().ok_or_else(|| self.unreachable())?;
                    let parent = tree::resolve_mut(working, &parent_path)
                        .ok_or_else(|| self.unreachable())?;
                    tree::put_child(parent, key, committed.clone(), &parent_path)?;
                }
            },
            None => {
                // Introduced by set and never committed: drop it.
                let (parent_path, key) = self.path.split_last().ok_or_else(|| self.unreachable())?;
                if tree::resolve(&state.committed, &parent_path).is_none() {
                    return Err(self.unreachable());
                }
                if let Some(parent) = tree::resolve_mut(working, &parent_path) {
                    tree::remove_child(parent, key, &parent_path)?;
                }
            }
        }

        tracing::debug!(id = %state.id, path = %self.path, "reset");
        Ok(())
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("id", &self.state.borrow().id)
            .field("path", &self.path.to_string())
            .finish()
    }
}
