//! Telemetry request body
//!
//! One report is a full snapshot of the grid plus summary statistics:
//!
//! ```json
//! {
//!   "dev_num": "A1B2C3D4E5F6",
//!   "timestamp": 123456,
//!   "interval": 30,
//!   "rows": 3,
//!   "cols": 7,
//!   "temperature_grid": [[21.5, 21.75, -127.0, ...], ...],
//!   "statistics": { "min_temp": 21.5, "max_temp": 22.0, "avg_temp": 21.7, "valid_readings": 20 }
//! }
//! ```
//!
//! `statistics` is omitted entirely when no reading is valid.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde::Serialize;

/// Value written into `temperature_grid` for an invalid sample
///
/// Matches the disconnected sentinel of common 1-Wire temperature sensors,
/// so an endpoint cannot mistake it for a plausible reading.
pub const INVALID_READING_C: f32 = -127.0;

/// Errors producing the wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// Serialization failed
    Encode,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Encode => f.write_str("report encoding failed"),
        }
    }
}

/// Summary statistics over the valid samples of one report
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Statistics {
    pub min_temp: f32,
    pub max_temp: f32,
    pub avg_temp: f32,
    pub valid_readings: u16,
}

impl Statistics {
    /// Compute statistics over a set of readings
    ///
    /// Returns `None` for an empty set; zero is a valid temperature and
    /// must not stand in for "no data".
    pub fn from_readings<I>(readings: I) -> Option<Self>
    where
        I: IntoIterator<Item = f32>,
    {
        let mut count: u16 = 0;
        let mut sum = 0.0f32;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;

        for value in readings {
            count = count.saturating_add(1);
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }

        if count == 0 {
            return None;
        }

        Some(Self {
            min_temp: min,
            max_temp: max,
            avg_temp: sum / count as f32,
            valid_readings: count,
        })
    }
}

/// Telemetry report as sent to the endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryReport {
    /// Device identifier
    pub dev_num: String,
    /// Milliseconds since boot
    pub timestamp: u64,
    /// Current reporting period in seconds
    pub interval: u32,
    pub rows: u8,
    pub cols: u8,
    /// Row-major grid of calibrated readings; invalid cells hold
    /// [`INVALID_READING_C`]
    pub temperature_grid: Vec<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
}

impl TelemetryReport {
    /// Encode as a JSON request body
    pub fn to_json(&self) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(self).map_err(|_| ProtocolError::Encode)
    }
}
