// mod.rs — Shared plumbing for stage subcommands.

pub mod edit;
pub mod inspect;

use std::path::PathBuf;

use anyhow::Context;
use serde_json::Value;
use stage_store::{BackendKind, Key, Namespace, NamespacePath, StoreConfig, StoreOptions};

/// Project root plus the config loaded from it.
pub struct Project {
    pub root: PathBuf,
    pub config: StoreConfig,
}

impl Project {
    /// Open store `id` through the configured backend.
    pub fn open(&self, id: &str) -> anyhow::Result<Namespace> {
        if self.config.backend.kind == BackendKind::Memory {
            tracing::warn!("memory backend configured: nothing persists between runs");
        }
        let backend = self.config.open_backend(&self.root)?;
        let store = Namespace::with_options(
            id,
            None,
            StoreOptions {
                backend,
                namespace: NamespacePath::root(),
            },
        )
        .with_context(|| format!("failed to open store '{}'", id))?;
        Ok(store)
    }

    /// Render JSON according to the display config.
    pub fn render(&self, value: &Value) -> anyhow::Result<String> {
        Ok(if self.config.display.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        })
    }
}

/// Descend from `store` along a dotted path.
pub fn namespace_at(store: &Namespace, dotted: &str) -> anyhow::Result<Namespace> {
    let path = NamespacePath::parse(dotted)?;
    Ok(path
        .segments()
        .iter()
        .fold(store.clone(), |ns, key| ns.ns(key)))
}

/// Split a dotted path into its parent namespace and final key.
pub fn parent_and_key(store: &Namespace, dotted: &str) -> anyhow::Result<(Namespace, Key)> {
    let path = NamespacePath::parse(dotted)?;
    let (parent, key) = path
        .split_last()
        .context("path must name a key, not the root")?;
    let ns = parent
        .segments()
        .iter()
        .fold(store.clone(), |ns, segment| ns.ns(segment));
    Ok((ns, key.clone()))
}

/// Parse a CLI value as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
