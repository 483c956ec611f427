//! Settings persistence

use log::{debug, info, warn};

use gridtherm_hal::{KeyValueStore, StorageError, StorageKey};

use super::{read_value, write_value, StoreError};
use crate::config::{Settings, MIN_INTERVAL_S};

/// Load settings, falling back to defaults
pub fn load_settings<S: KeyValueStore + ?Sized>(storage: &mut S) -> Settings {
    match read_value::<_, Settings>(storage, StorageKey::Settings) {
        Ok(mut settings) => {
            if settings.interval_s < MIN_INTERVAL_S {
                warn!("Stored interval {} s below floor", settings.interval_s);
                settings.interval_s = MIN_INTERVAL_S;
            }
            info!("Loaded settings: interval {} s", settings.interval_s);
            settings
        }
        Err(StoreError::Storage(StorageError::NotFound)) => {
            debug!("No settings stored, using defaults");
            Settings::default()
        }
        Err(e) => {
            warn!("Failed to load settings: {}, using defaults", e);
            Settings::default()
        }
    }
}

/// Save settings
pub fn save_settings<S: KeyValueStore + ?Sized>(
    storage: &mut S,
    settings: &Settings,
) -> Result<(), StoreError> {
    write_value(storage, StorageKey::Settings, settings)?;
    debug!("Saved settings");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_defaults_when_missing() {
        let mut storage = MemoryStore::new();
        assert_eq!(load_settings(&mut storage), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut storage = MemoryStore::new();
        let mut settings = Settings::default();
        settings.set_interval(90).unwrap();
        settings.network.set_wifi("Greenhouse", "hunter2").unwrap();
        save_settings(&mut storage, &settings).unwrap();

        assert_eq!(load_settings(&mut storage), settings);
    }

    #[test]
    fn test_corrupt_blob_uses_defaults() {
        let mut storage = MemoryStore::new();
        storage.write(StorageKey::Settings, &[0xFF; 3]).unwrap();
        assert_eq!(load_settings(&mut storage), Settings::default());
    }
}
