//! Gridtherm wire contract
//!
//! This crate defines everything that crosses the device boundary:
//!
//! - [`report`]: the JSON telemetry body POSTed once per reporting period
//! - [`directive`]: the optional cadence directive carried in the response
//! - [`command`]: the line-oriented operator console grammar
//!
//! # Telemetry exchange
//!
//! ```text
//! device                                   endpoint
//!   │  POST { dev_num, timestamp, ... }        │
//!   │ ───────────────────────────────────────▶ │
//!   │         { "edit": 1, "interval": 60 }    │
//!   │ ◀─────────────────────────────────────── │
//! ```
//!
//! A response that is not a well-formed directive is ignored.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod command;
pub mod directive;
pub mod report;

pub use command::{Command, CommandError};
pub use directive::{clamp_interval_s, parse_directive, IntervalDirective};
pub use report::{ProtocolError, Statistics, TelemetryReport, INVALID_READING_C};

/// Lower bound for the sampling/reporting period in seconds
///
/// Applies to remote directives (clamped) and operator commands (rejected).
pub const MIN_INTERVAL_S: u32 = 10;
