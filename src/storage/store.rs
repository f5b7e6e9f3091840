//! Key-value stores for persisted client state.

use dashmap::DashMap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String-keyed store of string values.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local store; nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.inner.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object on disk, rewritten on every change.
#[derive(Debug, Clone)]
pub struct FileStore {
    inner: Arc<DashMap<String, String>>,
    path: PathBuf,
}

impl FileStore {
    /// Open `path`, loading existing entries.
    ///
    /// A missing file is an empty store. An undecodable file is moved aside
    /// to `<path>.corrupt` and the store starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let inner = Arc::new(DashMap::new());

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            match serde_json::from_reader::<_, HashMap<String, String>>(reader) {
                Ok(map) => {
                    for (k, v) in map {
                        inner.insert(k, v);
                    }
                    tracing::debug!(path = %path.display(), entries = inner.len(), "Loaded store file");
                }
                Err(e) => {
                    let aside = path.with_extension("corrupt");
                    tracing::warn!(
                        path = %path.display(),
                        moved_to = %aside.display(),
                        error = %e,
                        "Store file is corrupt, starting empty"
                    );
                    std::fs::rename(&path, &aside)?;
                }
            }
        }

        Ok(Self { inner, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        let map: HashMap<_, _> = self
            .inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();

        let tmp = self.path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, &map)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.inner.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.inner.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
