//! # stage-store
//!
//! Staged, namespaced editing of JSON trees.
//!
//! A store holds two trees: the committed tree (last saved) and a working
//! tree where edits are staged. Edits never touch the committed tree until
//! [`Namespace::commit`] folds them in and persists the result through a
//! [`Backend`]; [`Namespace::reset`] throws them away.
//!
//! ## Key components
//!
//! - [`Namespace`] — a handle scoped to a path inside the store
//!   (`store.ns("baz").ns("a")`). Every handle derived from one root shares
//!   the same working tree, so an edit through one is seen by all.
//! - [`Backend`] — trait abstracting persistence. [`MemoryBackend`] keeps
//!   JSON text in memory; [`JsonFileBackend`] writes one file per store.
//! - [`StoreConfig`] — `.stage/config.toml`, selects the backend.
//! - [`tree`] — node kinds, pointer resolution, change detection and the
//!   reset fold over `serde_json::Value`.

pub mod backend;
mod bulk;
pub mod config;
pub mod error;
pub mod key;
pub mod namespace;
pub mod tree;

pub use backend::{Backend, JsonFileBackend, MemoryBackend};
pub use config::{BackendKind, StoreConfig};
pub use error::StoreError;
pub use key::{Key, NamespacePath};
pub use namespace::{Namespace, StoreOptions};
pub use tree::NodeKind;
