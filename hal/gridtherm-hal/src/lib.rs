//! Gridtherm Hardware Abstraction Layer
//!
//! This crate defines the narrow interfaces the sensor-grid core consumes.
//! Board support code (or the host simulator) implements them; the core
//! never talks to hardware directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (gridtherm-core scheduler) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  gridtherm-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ board support │       │ gridtherm-sim │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`bus::SensorBus`] - Shared temperature sensor bus
//! - [`net::Transport`], [`net::Connectivity`] - Telemetry delivery
//! - [`identity::DeviceIdentity`] - Stable device name
//! - [`time::Clock`] - Monotonic millisecond clock
//! - [`storage::KeyValueStore`] - Durable key-value storage
//!
//! All operations are blocking. The firmware runs a single cooperative
//! loop, so a bus conversion or a network send simply occupies the tick.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bus;
pub mod identity;
pub mod net;
pub mod storage;
pub mod time;

// Re-export key traits at crate root for convenience
pub use bus::{BusError, SensorBus, SensorId, MAX_BUS_DEVICES};
pub use identity::DeviceIdentity;
pub use net::{Connectivity, Transport, TransportError};
pub use storage::{KeyValueStore, Namespace, StorageError, StorageKey, KEY_LEN};
pub use time::Clock;
