//! Sensor registry
//!
//! Owns the bus, holds the identities found at discovery, and offers the
//! two primitives the rest of the core needs: one broadcast conversion and
//! a read of the latched value of one identity.

use heapless::Vec;
use log::{info, warn};

use gridtherm_hal::{BusError, SensorBus, SensorId, MAX_BUS_DEVICES};

/// Value some sensors report instead of failing a read when unplugged
const DISCONNECTED_C: f32 = -127.0;

/// Discovered sensors on one bus
pub struct SensorRegistry<B> {
    bus: B,
    ids: Vec<SensorId, MAX_BUS_DEVICES>,
}

impl<B: SensorBus> SensorRegistry<B> {
    /// Take ownership of the bus and enumerate it
    pub fn new(bus: B) -> Self {
        let mut registry = Self {
            bus,
            ids: Vec::new(),
        };
        registry.rediscover();
        registry
    }

    /// Enumerate the bus again, replacing the known identities
    pub fn rediscover(&mut self) {
        self.ids = self.bus.discover();
        if self.ids.is_empty() {
            warn!("No sensors found on the bus, running degraded");
        } else {
            info!("Discovered {} sensors", self.ids.len());
        }
    }

    /// Identities in enumeration order
    pub fn identities(&self) -> &[SensorId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &SensorId) -> bool {
        self.ids.contains(id)
    }

    /// Broadcast one conversion to every sensor
    pub fn convert(&mut self) -> Result<(), BusError> {
        self.bus.request_conversion()
    }

    /// Read the latched temperature of one sensor
    ///
    /// A disconnected sentinel from the bus is reported as
    /// [`BusError::Disconnected`], never as a temperature.
    pub fn read(&mut self, id: &SensorId) -> Result<f32, BusError> {
        let celsius = self.bus.read_celsius(id)?;
        if celsius <= DISCONNECTED_C || celsius.is_nan() {
            return Err(BusError::Disconnected);
        }
        Ok(celsius)
    }
}
