// error.rs — Error types for the staged namespace store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize tree data.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The configuration file could not be read or parsed.
    #[error("config error: {0}")]
    ConfigError(String),

    /// The store identifier cannot be used as a persistence key.
    #[error("invalid store identifier: '{id}'")]
    InvalidIdentifier { id: String },

    /// A dotted namespace path could not be parsed.
    #[error("invalid namespace path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// An ancestor of the namespace path does not resolve to a node.
    #[error("namespace path {path} does not resolve to a node")]
    Unreachable { path: String },

    /// The namespace resolves to a leaf value, which has no keys.
    #[error("namespace {path} is not a list or mapping")]
    NotComposite { path: String },

    /// A key that cannot address the node it was applied to
    /// (e.g. a non-numeric name on a list).
    #[error("key '{key}' cannot address the list at {path}")]
    ShapeMismatch { path: String, key: String },

    /// The persistence backend failed for a reason of its own.
    #[error("backend error: {0}")]
    BackendError(String),
}
