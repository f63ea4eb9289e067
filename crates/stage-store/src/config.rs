//! Store configuration loaded from `.stage/config.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::backend::{Backend, JsonFileBackend, MemoryBackend};
use crate::error::StoreError;

/// Location of the config file relative to a project root.
pub const CONFIG_FILE: &str = ".stage/config.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// Which persistence backend stores open with.
    #[serde(default)]
    pub backend: BackendConfig,

    /// CLI output settings.
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Backend kinds selectable from config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Memory,
}

/// Backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// "file" or "memory"
    #[serde(default)]
    pub kind: BackendKind,

    /// Data directory for the file backend. Relative paths resolve
    /// against the project root.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".stage/data")
}

/// Display / output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Pretty-print JSON output. Default: true.
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            pretty: default_pretty(),
        }
    }
}

fn default_pretty() -> bool {
    true
}

impl StoreConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| StoreError::ConfigError(e.to_string()))
    }

    /// Try to load config, returning defaults if the file is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(StoreError::IoError { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Self::default()
            }
            Err(e) => {
                tracing::warn!("ignoring config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Config for a project, read from `<root>/.stage/config.toml`.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        Self::load_or_default(&project_root.as_ref().join(CONFIG_FILE))
    }

    /// Data directory for the file backend, resolved against `project_root`.
    pub fn data_dir(&self, project_root: impl AsRef<Path>) -> PathBuf {
        if self.backend.dir.is_absolute() {
            self.backend.dir.clone()
        } else {
            project_root.as_ref().join(&self.backend.dir)
        }
    }

    /// Build the configured backend.
    pub fn open_backend(
        &self,
        project_root: impl AsRef<Path>,
    ) -> Result<Box<dyn Backend>, StoreError> {
        match self.backend.kind {
            BackendKind::File => Ok(Box::new(JsonFileBackend::new(
                self.data_dir(project_root),
            )?)),
            BackendKind::Memory => Ok(Box::new(MemoryBackend::new())),
        }
    }
}
