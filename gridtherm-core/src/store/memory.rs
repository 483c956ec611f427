//! RAM-backed key-value store
//!
//! Used by the host simulator (which snapshots it to a file) and by tests.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use gridtherm_hal::{KeyValueStore, Namespace, StorageError, StorageKey};

/// Key-value store held in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<StorageKey, Vec<u8>>,
    unavailable: bool,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose backend never opens
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Rebuild a store from raw entries
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (StorageKey, Vec<u8>)>,
    {
        Self {
            entries: entries.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Raw entries in key order
    pub fn entries(&self) -> impl Iterator<Item = (&StorageKey, &Vec<u8>)> {
        self.entries.iter()
    }

    /// Reject every write and erase with [`StorageError::Write`]
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_open(&self) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable);
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        self.check_open()?;
        if self.read_only {
            return Err(StorageError::Write);
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError> {
        self.check_open()?;
        let value = self.entries.get(&key).ok_or(StorageError::NotFound)?;
        let target = buffer
            .get_mut(..value.len())
            .ok_or(StorageError::BufferTooSmall)?;
        target.copy_from_slice(value);
        Ok(value.len())
    }

    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
        self.check_writable()?;
        self.entries.insert(key, data.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), StorageError> {
        self.check_writable()?;
        self.entries.remove(&key);
        Ok(())
    }

    fn exists(&mut self, key: StorageKey) -> bool {
        !self.unavailable && self.entries.contains_key(&key)
    }

    fn erase_namespace(&mut self, namespace: Namespace) -> Result<(), StorageError> {
        self.check_writable()?;
        self.entries.retain(|key, _| key.namespace() != namespace);
        Ok(())
    }
}
