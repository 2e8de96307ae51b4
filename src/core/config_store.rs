// src/core/config_store.rs

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// One group of persisted settings, keyed by field name.
pub type ConfigMap = BTreeMap<String, Value>;

/// Represents errors that can occur while reading or writing the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A filesystem I/O error occurred.
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    /// The store file on disk is not valid JSON.
    #[error("The store file at '{path}' is not valid JSON: {source}")]
    Corrupt {
        /// Location of the unreadable file.
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// The in-memory store could not be serialized back to JSON.
    #[error("Failed to serialize store contents: {0}")]
    Serialize(#[source] serde_json::Error),
    /// An error occurred while resolving the store location.
    #[error("Path error: {0}")]
    Path(#[from] crate::core::paths::PathError),
}

/// Durable namespace -> settings mapping, surviving across invocations.
pub trait ConfigStore {
    /// Reads the settings stored under `namespace`, if any.
    fn get(&self, namespace: &str) -> Option<ConfigMap>;
    /// Replaces the settings stored under `namespace`.
    fn set(&mut self, namespace: &str, config: ConfigMap) -> Result<(), StoreError>;
    /// Removes every namespace at once.
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Disk-backed store: a single JSON document mapping namespaces to settings.
///
/// The whole document is loaded on open and rewritten on every mutation.
/// It is small (a handful of namespaces with a handful of string fields),
/// so atomicity beyond a full rewrite is not worth the machinery.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    namespaces: BTreeMap<String, ConfigMap>,
}

impl FileStore {
    /// Opens the store at its default location (`~/.config/sst/config.json`).
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(crate::core::paths::get_store_path()?)
    }

    /// Opens a store file at an explicit path. A missing file is an empty
    /// store; the file is only created on the first write.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let namespaces = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                path: path.display().to_string(),
                source: e,
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, namespaces })
    }

    fn persist(&self) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(&self.namespaces).map_err(StoreError::Serialize)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl ConfigStore for FileStore {
    fn get(&self, namespace: &str) -> Option<ConfigMap> {
        self.namespaces.get(namespace).cloned()
    }

    fn set(&mut self, namespace: &str, config: ConfigMap) -> Result<(), StoreError> {
        log::debug!("Persisting {} field(s) under '{}'", config.len(), namespace);
        self.namespaces.insert(namespace.to_string(), config);
        self.persist()
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        log::debug!("Clearing {} stored namespace(s)", self.namespaces.len());
        self.namespaces.clear();
        self.persist()
    }
}
