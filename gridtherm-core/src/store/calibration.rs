//! Calibration persistence
//!
//! Layout: one `f32` offset per calibrated position plus the `done` flag.
//! Positions without a valid reading at calibration time have no key.

use log::{debug, info, warn};

use gridtherm_hal::{KeyValueStore, Namespace, StorageError, StorageKey};

use super::{read_value, write_value, StoreError};
use crate::calibration::CalibrationTable;
use crate::grid::GridSize;

/// Load the stored calibration
///
/// Returns an empty table when none is stored or the backend fails.
pub fn load_calibration<S: KeyValueStore + ?Sized>(
    storage: &mut S,
    size: GridSize,
) -> CalibrationTable {
    match load_calibration_inner(storage, size) {
        Ok(table) => {
            if table.is_done() {
                info!("Loaded calibration: {} offsets", table.iter().count());
                log_calibration_summary(&table);
            }
            table
        }
        Err(e) => {
            warn!("Failed to load calibration: {}, running uncorrected", e);
            CalibrationTable::new(size)
        }
    }
}

fn load_calibration_inner<S: KeyValueStore + ?Sized>(
    storage: &mut S,
    size: GridSize,
) -> Result<CalibrationTable, StoreError> {
    let mut table = CalibrationTable::new(size);

    let done: bool = match read_value(storage, StorageKey::CalibrationDone) {
        Ok(done) => done,
        Err(StoreError::Storage(StorageError::NotFound)) => {
            debug!("No calibration stored");
            return Ok(table);
        }
        Err(e) => return Err(e),
    };
    if !done {
        return Ok(table);
    }

    for position in size.positions() {
        match read_value::<_, f32>(storage, position.calibration_key()) {
            Ok(offset) => table.set_offset(position, offset),
            Err(StoreError::Storage(StorageError::NotFound)) => {}
            Err(e) => return Err(e),
        }
    }
    table.mark_done();

    Ok(table)
}

/// Persist a calibration table
///
/// The `done` flag is cleared first and written last.
pub fn persist_calibration<S: KeyValueStore + ?Sized>(
    storage: &mut S,
    table: &CalibrationTable,
) -> Result<(), StoreError> {
    write_value(storage, StorageKey::CalibrationDone, &false)?;

    for position in table.size().positions() {
        match table.stored_offset(position) {
            Some(offset) => write_value(storage, position.calibration_key(), &offset)?,
            None => storage.remove(position.calibration_key())?,
        }
    }

    write_value(storage, StorageKey::CalibrationDone, &table.is_done())?;
    info!("Saved calibration: {} offsets", table.iter().count());
    log_calibration_summary(table);
    Ok(())
}

/// Erase the stored calibration
pub fn clear_calibration<S: KeyValueStore + ?Sized>(storage: &mut S) -> Result<(), StoreError> {
    storage.erase_namespace(Namespace::Calibration)?;
    info!("Cleared stored calibration");
    Ok(())
}

fn log_calibration_summary(table: &CalibrationTable) {
    for (position, offset) in table.iter() {
        debug!("  {}: {:+.2}", position, offset);
    }
}
