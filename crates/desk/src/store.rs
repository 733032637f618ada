//! Local key/blob persistence.
//!
//! Every record is serialized to a JSON string and kept under a fixed key,
//! the same shape browser local storage offers. The whole map lives in one
//! JSON document on disk and is rewritten atomically (temp file + rename) on
//! every mutation. There is no schema versioning and no multi-writer
//! coordination: the last writer wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Fixed storage keys.
pub mod keys {
    /// Persisted OAuth tokens.
    pub const TOKENS: &str = "ebay_tokens";
    /// Pending OAuth anti-forgery state.
    pub const OAUTH_STATE: &str = "ebay_oauth_state";
    /// Application credentials (without the sandbox flag).
    pub const CREDENTIALS: &str = "ebay_credentials";
    /// Saved drafts, oldest first.
    pub const DRAFTS: &str = "ebay_drafts";
    /// The draft form currently being edited.
    pub const DRAFT_FORM: &str = "ebay_draft_form";
    /// Application settings.
    pub const SETTINGS: &str = "ebay_master_settings";
    /// Inference settings.
    pub const VISION: &str = "ai_config";
}

/// Errors that can occur while reading or writing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the store file failed.
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store file itself is not valid JSON.
    #[error("store file {path} is corrupt: {source}")]
    CorruptFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A blob could not be (de)serialized.
    #[error("stored value for '{key}' is invalid: {source}")]
    Blob {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Another thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Key/blob store backed by a JSON file, or purely in memory.
#[derive(Debug)]
pub struct LocalStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl LocalStore {
    /// Open (or lazily create) the store file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if an existing file cannot be read and
    /// `StoreError::CorruptFile` if it is not a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::CorruptFile {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened local store");

        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    /// A store that never touches the filesystem.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Location of the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Raw blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Poisoned` if the lock is poisoned.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    /// Deserialize the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Blob` if the blob does not parse as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.get_raw(key)?
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|source| StoreError::Blob {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Deserialize the blob under `key`, treating an unparseable blob as absent.
    ///
    /// The problem is logged rather than returned; callers use this for
    /// records that have a sensible default.
    #[must_use]
    pub fn get_or_log<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(key, error = %e, "failed to load stored value");
                None
            }
        }
    }

    /// Serialize `value` under `key` and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Blob` if `value` cannot be serialized or
    /// `StoreError::Io` if the file cannot be written.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Blob {
            key: key.to_string(),
            source,
        })?;
        self.mutate(|entries| {
            entries.insert(key.to_string(), raw);
        })
    }

    /// Remove `key` and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be written.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }

    /// Remove every key and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be written.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.mutate(BTreeMap::clear)
    }

    /// Keys currently stored, in sorted order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Poisoned` if the lock is poisoned.
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.keys().cloned().collect())
    }

    fn mutate<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut entries);
        if let Some(path) = &self.path {
            write_atomically(path, &entries)?;
        }
        Ok(())
    }
}

fn write_atomically(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let bytes = serde_json::to_vec_pretty(entries).map_err(|source| StoreError::CorruptFile {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}
