//! File-backed key-value store
//!
//! Keeps every entry in a [`MemoryStore`] and rewrites the whole state
//! file (postcard) after each mutation. The file stands in for the
//! device's flash and survives simulator restarts.

use std::path::{Path, PathBuf};

use gridtherm_core::MemoryStore;
use gridtherm_hal::{KeyValueStore, Namespace, StorageError, StorageKey, KEY_LEN};
use log::{info, warn};

type Entry = ([u8; KEY_LEN], Vec<u8>);

pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    /// Open a state file, starting empty if it is missing or unreadable
    pub fn open(path: &Path) -> Self {
        let inner = match std::fs::read(path) {
            Ok(bytes) => match postcard::from_bytes::<Vec<Entry>>(&bytes) {
                Ok(entries) => {
                    info!("Loaded {} entries from {}", entries.len(), path.display());
                    MemoryStore::from_entries(entries.into_iter().filter_map(|(key, value)| {
                        StorageKey::from_bytes(&key).map(|key| (key, value))
                    }))
                }
                Err(e) => {
                    warn!("State file {} unreadable ({}), starting empty", path.display(), e);
                    MemoryStore::new()
                }
            },
            Err(_) => {
                info!("No state file at {}, starting empty", path.display());
                MemoryStore::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            inner,
        }
    }

    fn flush(&self) -> Result<(), StorageError> {
        let entries: Vec<Entry> = self
            .inner
            .entries()
            .map(|(key, value)| (key.to_bytes(), value.clone()))
            .collect();
        let bytes = postcard::to_allocvec(&entries).map_err(|_| StorageError::Write)?;
        std::fs::write(&self.path, bytes).map_err(|e| {
            warn!("Writing {} failed: {}", self.path.display(), e);
            StorageError::Write
        })
    }
}

impl KeyValueStore for FileStore {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError> {
        self.inner.read(key, buffer)
    }

    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
        self.inner.write(key, data)?;
        self.flush()
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), StorageError> {
        self.inner.remove(key)?;
        self.flush()
    }

    fn exists(&mut self, key: StorageKey) -> bool {
        self.inner.exists(key)
    }

    fn erase_namespace(&mut self, namespace: Namespace) -> Result<(), StorageError> {
        self.inner.erase_namespace(namespace)?;
        self.flush()
    }
}
