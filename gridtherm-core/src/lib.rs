//! Board-agnostic core logic for the sensor-grid firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Grid model and sensor registry
//! - Auto-learning session (position inference from warming gestures)
//! - Mapping, calibration and settings persistence
//! - Measurement sampling and telemetry reporting
//! - Operator console and the cooperative scheduler tying it together
//!
//! Hardware is reached only through the traits of `gridtherm-hal`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod calibration;
pub mod config;
pub mod console;
pub mod grid;
pub mod learning;
pub mod mapping;
pub mod registry;
pub mod runtime;
pub mod sampler;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod timer;

#[cfg(test)]
mod testing;

pub use calibration::{calibrate, CalibrationError, CalibrationTable};
pub use config::{NetworkConfig, Settings, SettingsError};
pub use grid::{GridError, GridPosition, GridSize, MAX_POSITIONS};
pub use learning::{LearningSession, StepOutcome};
pub use mapping::{Mapping, MappingError};
pub use registry::SensorRegistry;
pub use runtime::Runtime;
pub use sampler::{sample, Snapshot, TemperatureSample};
pub use scheduler::{Activity, Peripherals, Scheduler};
pub use state::{Event, Mode};
pub use store::{MemoryStore, StoreError};
pub use telemetry::{build_report, ReportError, Reporter};
pub use timer::IntervalTimer;
