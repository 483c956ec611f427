//! Inter-sensor calibration
//!
//! Assumes every position sits at the same true ambient temperature while
//! the routine runs. Each probe gets an additive offset that moves its raw
//! reading onto the grid mean.

use core::fmt;

use heapless::Vec;
use log::{info, warn};

use gridtherm_hal::SensorBus;

use crate::config::MIN_CALIBRATION_READINGS;
use crate::grid::{GridPosition, GridSize, MAX_POSITIONS};
use crate::mapping::Mapping;
use crate::registry::SensorRegistry;

/// Errors from the calibration routine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Too few valid readings to establish a mean
    InsufficientSensors { valid: usize },
    /// Learning in progress, no mapping to calibrate
    Busy,
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::InsufficientSensors { valid } => write!(
                f,
                "insufficient sensors: {} valid readings, need {}",
                valid, MIN_CALIBRATION_READINGS
            ),
            CalibrationError::Busy => f.write_str("learning in progress"),
        }
    }
}

/// Per-position additive offsets
///
/// A position without an entry is uncorrected (offset 0.0).
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    size: GridSize,
    offsets: Vec<Option<f32>, MAX_POSITIONS>,
    done: bool,
}

impl CalibrationTable {
    /// Table with no offsets
    pub fn new(size: GridSize) -> Self {
        let mut offsets = Vec::new();
        offsets.resize(size.len(), None).ok();
        Self {
            size,
            offsets,
            done: false,
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Whether a calibration run produced this table
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Offset to add to a raw reading, 0.0 when none is stored
    pub fn offset(&self, position: GridPosition) -> f32 {
        self.stored_offset(position).unwrap_or(0.0)
    }

    /// Offset computed for a position, if any
    pub fn stored_offset(&self, position: GridPosition) -> Option<f32> {
        let index = self.size.index_of(position)?;
        self.offsets.get(index).copied().flatten()
    }

    /// Set the offset of a position; out-of-grid positions are ignored
    pub fn set_offset(&mut self, position: GridPosition, offset: f32) {
        if let Some(index) = self.size.index_of(position) {
            self.offsets[index] = Some(offset);
        }
    }

    /// Apply the offset of a position to a raw reading
    pub fn apply(&self, position: GridPosition, raw_c: f32) -> f32 {
        raw_c + self.offset(position)
    }

    /// Positions with a stored offset, row-major
    pub fn iter(&self) -> impl Iterator<Item = (GridPosition, f32)> + '_ {
        self.size
            .positions()
            .zip(self.offsets.iter().copied())
            .filter_map(|(position, offset)| offset.map(|offset| (position, offset)))
    }
}

/// Compute a calibration table from one reading of every mapped position
///
/// Triggers a single bus conversion. Disconnected sensors are left without
/// an offset. Fails without side effects when fewer than
/// [`MIN_CALIBRATION_READINGS`] readings are valid.
pub fn calibrate<B: SensorBus>(
    mapping: &Mapping,
    registry: &mut SensorRegistry<B>,
) -> Result<CalibrationTable, CalibrationError> {
    let mut readings: Vec<(GridPosition, f32), MAX_POSITIONS> = Vec::new();

    match registry.convert() {
        Ok(()) => {
            for (position, id) in mapping.assigned() {
                match registry.read(&id) {
                    Ok(raw) => {
                        // At most MAX_POSITIONS assigned positions
                        readings.push((position, raw)).ok();
                    }
                    Err(e) => warn!("Calibration: sensor at {} skipped: {}", position, e),
                }
            }
        }
        Err(e) => warn!("Calibration: conversion failed: {}", e),
    }

    if readings.len() < MIN_CALIBRATION_READINGS {
        return Err(CalibrationError::InsufficientSensors {
            valid: readings.len(),
        });
    }

    let sum: f32 = readings.iter().map(|(_, raw)| raw).sum();
    let mean = sum / readings.len() as f32;

    let mut table = CalibrationTable::new(mapping.size());
    for (position, raw) in &readings {
        table.set_offset(*position, mean - raw);
    }
    table.mark_done();

    info!(
        "Calibrated {} of {} positions, mean {}",
        readings.len(),
        mapping.size().len(),
        mean
    );
    Ok(table)
}
