//! TOML configuration for the audit log.
//!
//! Example:
//! ```toml
//! [store]
//! backend = "jsonl"
//! path = "var/audit/admin.jsonl"
//! max_conflict_retries = 8
//! ```
//!
//! Every key is optional. Without a file, the log lives in memory.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use warden_contracts::error::{WardenError, WardenResult};
use warden_core::traits::EntryStore;

use crate::{
    jsonl::JsonlEntryStore,
    memory::InMemoryEntryStore,
    store::{LogChain, DEFAULT_MAX_CONFLICT_RETRIES},
};

/// Which `EntryStore` backs the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Jsonl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Log file. Required when `backend = "jsonl"`.
    pub path: Option<PathBuf>,

    /// Conflict retries before an append gives up.
    pub max_conflict_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: None,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub store: StoreConfig,
}

impl WardenConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `WardenError::Config` if the TOML is malformed or does not
    /// match the schema.
    pub fn from_toml_str(s: &str) -> WardenResult<Self> {
        toml::from_str(s).map_err(|e| WardenError::Config {
            reason: format!("failed to parse audit config TOML: {}", e),
        })
    }

    /// Read and parse the file at `path`.
    pub fn from_file(path: &Path) -> WardenResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| WardenError::Config {
            reason: format!("failed to read audit config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Open the configured store.
    pub fn open_store(&self) -> WardenResult<Arc<dyn EntryStore>> {
        match self.store.backend {
            StoreBackend::Memory => Ok(Arc::new(InMemoryEntryStore::new())),
            StoreBackend::Jsonl => {
                let path = self.store.path.as_ref().ok_or_else(|| WardenError::Config {
                    reason: "store.path is required when store.backend = \"jsonl\"".to_string(),
                })?;
                Ok(Arc::new(JsonlEntryStore::open(path)?))
            }
        }
    }

    /// Open the configured store and wrap it in a [`LogChain`].
    pub fn open_chain(&self) -> WardenResult<LogChain> {
        Ok(LogChain::new(self.open_store()?)
            .with_max_conflict_retries(self.store.max_conflict_retries))
    }
}
