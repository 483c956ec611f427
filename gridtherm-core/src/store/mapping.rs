//! Mapping persistence
//!
//! Layout: one key per position holding the 8 identity bytes, plus the
//! `complete` flag. Only a mapping whose flag is set is ever loaded back;
//! partial learning progress is discarded on power loss.

use log::{debug, info, warn};

use gridtherm_hal::{KeyValueStore, Namespace, SensorId, StorageError, StorageKey};

use super::{read_value, write_value, StoreError};
use crate::grid::GridSize;
use crate::mapping::Mapping;

/// Load the stored mapping
///
/// Returns an empty, incomplete mapping when nothing complete is stored,
/// when the backend is unavailable, or when the stored keys are
/// inconsistent. Never returns a partial mapping.
pub fn load_mapping<S: KeyValueStore + ?Sized>(storage: &mut S, size: GridSize) -> Mapping {
    match load_mapping_inner(storage, size) {
        Ok(Some(mapping)) => {
            info!("Loaded complete {} mapping", size);
            mapping
        }
        Ok(None) => {
            debug!("No complete mapping stored");
            Mapping::new(size)
        }
        Err(e) => {
            warn!("Failed to load mapping: {}, relearning", e);
            Mapping::new(size)
        }
    }
}

fn load_mapping_inner<S: KeyValueStore + ?Sized>(
    storage: &mut S,
    size: GridSize,
) -> Result<Option<Mapping>, StoreError> {
    let complete: bool = match read_value(storage, StorageKey::MappingComplete) {
        Ok(complete) => complete,
        Err(StoreError::Storage(StorageError::NotFound)) => return Ok(None),
        Err(e) => return Err(e),
    };
    if !complete {
        return Ok(None);
    }

    let mut mapping = Mapping::new(size);
    for position in size.positions() {
        let bytes: [u8; 8] = match read_value(storage, position.mapping_key()) {
            Ok(bytes) => bytes,
            Err(StoreError::Storage(StorageError::NotFound)) => {
                warn!("Mapping flagged complete but {} is missing", position);
                return Err(StoreError::Inconsistent);
            }
            Err(e) => return Err(e),
        };
        mapping
            .assign(position, SensorId::new(bytes))
            .map_err(|_| StoreError::Inconsistent)?;
    }
    mapping
        .mark_complete()
        .map_err(|_| StoreError::Inconsistent)?;

    Ok(Some(mapping))
}

/// Persist a mapping
///
/// The completion flag is cleared first and written last.
pub fn persist_mapping<S: KeyValueStore + ?Sized>(
    storage: &mut S,
    mapping: &Mapping,
) -> Result<(), StoreError> {
    write_value(storage, StorageKey::MappingComplete, &false)?;

    for (position, id) in mapping.iter() {
        match id {
            Some(id) => write_value(storage, position.mapping_key(), &id.to_bytes())?,
            None => storage.remove(position.mapping_key())?,
        }
    }

    write_value(storage, StorageKey::MappingComplete, &mapping.is_complete())?;
    info!(
        "Saved mapping: {} positions, complete={}",
        mapping.assigned_count(),
        mapping.is_complete()
    );
    Ok(())
}

/// Erase the stored mapping
pub fn clear_mapping<S: KeyValueStore + ?Sized>(storage: &mut S) -> Result<(), StoreError> {
    storage.erase_namespace(Namespace::Mapping)?;
    info!("Cleared stored mapping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridPosition;
    use crate::store::MemoryStore;
    use crate::testing::sensor;

    fn complete_mapping(size: GridSize) -> Mapping {
        let mut mapping = Mapping::new(size);
        for (n, position) in size.positions().enumerate() {
            mapping.assign(position, sensor(10 + n as u8)).unwrap();
        }
        mapping.mark_complete().unwrap();
        mapping
    }

    #[test]
    fn test_empty_store_yields_empty_mapping() {
        let mut storage = MemoryStore::new();
        let mapping = load_mapping(&mut storage, GridSize::default());
        assert!(!mapping.is_complete());
        assert_eq!(mapping.assigned_count(), 0);
    }

    #[test]
    fn test_persist_then_load_unchanged() {
        let size = GridSize::new(3, 2).unwrap();
        let mapping = complete_mapping(size);
        let mut storage = MemoryStore::new();
        persist_mapping(&mut storage, &mapping).unwrap();

        assert_eq!(load_mapping(&mut storage, size), mapping);
    }

    #[test]
    fn test_stored_layout() {
        let size = GridSize::new(1, 2).unwrap();
        let mut storage = MemoryStore::new();
        persist_mapping(&mut storage, &complete_mapping(size)).unwrap();

        let mut buffer = [0u8; 16];
        let len = storage
            .read(StorageKey::MappingSlot { row: 0, col: 1 }, &mut buffer)
            .unwrap();
        assert_eq!(&buffer[..len], &sensor(11).to_bytes());
        let len = storage.read(StorageKey::MappingComplete, &mut buffer).unwrap();
        assert_eq!(&buffer[..len], &[1]);
    }

    #[test]
    fn test_partial_mapping_is_never_loaded() {
        let size = GridSize::new(1, 3).unwrap();
        let mut partial = Mapping::new(size);
        partial.assign(GridPosition::new(0, 0), sensor(1)).unwrap();
        let mut storage = MemoryStore::new();
        persist_mapping(&mut storage, &partial).unwrap();

        let loaded = load_mapping(&mut storage, size);
        assert!(!loaded.is_complete());
        assert_eq!(loaded.assigned_count(), 0);
    }

    #[test]
    fn test_interrupted_write_is_not_complete() {
        let size = GridSize::new(1, 2).unwrap();
        let mut storage = MemoryStore::new();
        persist_mapping(&mut storage, &complete_mapping(size)).unwrap();

        // Power lost after the flag was cleared, before it was set again
        write_value(&mut storage, StorageKey::MappingComplete, &false).unwrap();
        assert!(!load_mapping(&mut storage, size).is_complete());
    }

    #[test]
    fn test_missing_slot_is_inconsistent() {
        let size = GridSize::new(1, 2).unwrap();
        let mut storage = MemoryStore::new();
        persist_mapping(&mut storage, &complete_mapping(size)).unwrap();
        storage
            .remove(StorageKey::MappingSlot { row: 0, col: 1 })
            .unwrap();

        assert_eq!(
            load_mapping_inner(&mut storage, size),
            Err(StoreError::Inconsistent)
        );
        assert!(!load_mapping(&mut storage, size).is_complete());
    }

    #[test]
    fn test_duplicate_identity_is_inconsistent() {
        let size = GridSize::new(1, 2).unwrap();
        let mut storage = MemoryStore::new();
        persist_mapping(&mut storage, &complete_mapping(size)).unwrap();
        write_value(
            &mut storage,
            StorageKey::MappingSlot { row: 0, col: 1 },
            &sensor(10).to_bytes(),
        )
        .unwrap();

        assert_eq!(
            load_mapping_inner(&mut storage, size),
            Err(StoreError::Inconsistent)
        );
    }

    #[test]
    fn test_unavailable_storage_forces_learning() {
        let mut storage = MemoryStore::unavailable();
        assert!(!load_mapping(&mut storage, GridSize::default()).is_complete());
    }

    #[test]
    fn test_clear() {
        let size = GridSize::new(1, 2).unwrap();
        let mut storage = MemoryStore::new();
        persist_mapping(&mut storage, &complete_mapping(size)).unwrap();
        clear_mapping(&mut storage).unwrap();

        assert!(!storage.exists(StorageKey::MappingComplete));
        assert!(!load_mapping(&mut storage, size).is_complete());
    }
}
