//! Measurement sampling
//!
//! One call triggers one bus conversion, then reads the latched value of
//! every mapped sensor. Bus traffic per sample does not grow with the grid.

use heapless::Vec;
use log::warn;

use gridtherm_hal::SensorBus;
use gridtherm_protocol::{Statistics, INVALID_READING_C};

use crate::calibration::CalibrationTable;
use crate::grid::{GridPosition, GridSize, MAX_POSITIONS};
use crate::mapping::Mapping;
use crate::registry::SensorRegistry;

/// One position's reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TemperatureSample {
    /// Calibrated reading in °C
    Valid(f32),
    /// No sensor assigned, or the sensor did not answer
    Invalid,
}

impl TemperatureSample {
    pub fn value(self) -> Option<f32> {
        match self {
            TemperatureSample::Valid(celsius) => Some(celsius),
            TemperatureSample::Invalid => None,
        }
    }

    /// Value for the wire format
    pub fn wire_value(self) -> f32 {
        self.value().unwrap_or(INVALID_READING_C)
    }
}

/// A full grid of samples taken from one conversion
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    size: GridSize,
    samples: Vec<TemperatureSample, MAX_POSITIONS>,
    taken_at_ms: u64,
}

impl Snapshot {
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Clock time of the conversion
    pub fn taken_at_ms(&self) -> u64 {
        self.taken_at_ms
    }

    pub fn get(&self, position: GridPosition) -> Option<TemperatureSample> {
        let index = self.size.index_of(position)?;
        self.samples.get(index).copied()
    }

    /// Samples of one row
    pub fn row(&self, row: u8) -> &[TemperatureSample] {
        let cols = usize::from(self.size.cols());
        let start = usize::from(row) * cols;
        self.samples.get(start..start + cols).unwrap_or(&[])
    }

    /// Valid readings, row-major
    pub fn valid_readings(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().filter_map(|sample| sample.value())
    }

    pub fn valid_count(&self) -> usize {
        self.valid_readings().count()
    }

    /// Statistics over valid readings, `None` when there are none
    pub fn statistics(&self) -> Option<Statistics> {
        Statistics::from_readings(self.valid_readings())
    }
}

/// Take one calibrated snapshot of the grid
pub fn sample<B: SensorBus>(
    mapping: &Mapping,
    calibration: &CalibrationTable,
    registry: &mut SensorRegistry<B>,
    now_ms: u64,
) -> Snapshot {
    let size = mapping.size();
    let converted = match registry.convert() {
        Ok(()) => true,
        Err(e) => {
            warn!("Sampling: conversion failed: {}", e);
            false
        }
    };

    let mut samples = Vec::new();
    for (position, id) in mapping.iter() {
        let sample = match id {
            Some(id) if converted => match registry.read(&id) {
                Ok(raw) => TemperatureSample::Valid(calibration.apply(position, raw)),
                Err(e) => {
                    warn!("Sampling: sensor {} at {}: {}", id, position, e);
                    TemperatureSample::Invalid
                }
            },
            _ => TemperatureSample::Invalid,
        };
        // One sample per position of the grid
        samples.push(sample).ok();
    }

    Snapshot {
        size,
        samples,
        taken_at_ms: now_ms,
    }
}
