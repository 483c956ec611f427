//! Persistence of mapping, calibration and settings
//!
//! Values are postcard-encoded and stored one per [`StorageKey`]. Tables
//! spanning several keys carry a completion flag that is cleared before
//! and set after the other keys are written, so a reader never sees a
//! flag over a half-written table.

pub mod calibration;
pub mod mapping;
pub mod memory;
pub mod settings;

use core::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use gridtherm_hal::{KeyValueStore, StorageError, StorageKey};

pub use calibration::{clear_calibration, load_calibration, persist_calibration};
pub use mapping::{clear_mapping, load_mapping, persist_mapping};
pub use memory::MemoryStore;
pub use settings::{load_settings, save_settings};

/// Largest single encoded value
const MAX_VALUE_SIZE: usize = 256;

/// Persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Backend operation failed
    Storage(StorageError),
    /// Serialization failed
    Serialize,
    /// Deserialization failed
    Deserialize,
    /// Stored keys contradict each other
    Inconsistent,
}

impl From<StorageError> for StoreError {
    fn from(e: StorageError) -> Self {
        StoreError::Storage(e)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Storage(e) => write!(f, "{}", e),
            StoreError::Serialize => f.write_str("serialization failed"),
            StoreError::Deserialize => f.write_str("stored value unreadable"),
            StoreError::Inconsistent => f.write_str("stored table inconsistent"),
        }
    }
}

fn read_value<S, T>(storage: &mut S, key: StorageKey) -> Result<T, StoreError>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let mut buffer = [0u8; MAX_VALUE_SIZE];
    let len = storage.read(key, &mut buffer)?;
    postcard::from_bytes(&buffer[..len]).map_err(|_| StoreError::Deserialize)
}

fn write_value<S, T>(storage: &mut S, key: StorageKey, value: &T) -> Result<(), StoreError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize,
{
    let mut buffer = [0u8; MAX_VALUE_SIZE];
    let bytes = postcard::to_slice(value, &mut buffer).map_err(|_| StoreError::Serialize)?;
    storage.write(key, bytes)?;
    Ok(())
}
