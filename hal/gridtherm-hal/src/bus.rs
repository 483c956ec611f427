//! Sensor bus abstractions
//!
//! A single shared bus carries every temperature sensor of the grid. Each
//! sensor is addressed by a factory-programmed 64-bit identity; the bus
//! itself knows nothing about grid positions.

use core::fmt;

use heapless::Vec;

/// Maximum number of devices a bus enumeration may return
pub const MAX_BUS_DEVICES: usize = 64;

/// Width of a sensor identity in bytes
pub const SENSOR_ID_LEN: usize = 8;

/// Identity of one physical sensor on the bus
///
/// An opaque fixed-width value with byte-wise equality. The first byte is
/// the device family code on 1-Wire style buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorId([u8; SENSOR_ID_LEN]);

impl SensorId {
    /// Create an identity from its raw bytes
    pub const fn new(bytes: [u8; SENSOR_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Create an identity from a slice, if it has exactly the right width
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; SENSOR_ID_LEN] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Raw identity bytes
    pub const fn to_bytes(self) -> [u8; SENSOR_ID_LEN] {
        self.0
    }

    /// Device family code (first byte)
    pub const fn family_code(&self) -> u8 {
        self.0[0]
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Errors from sensor bus operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Sensor did not answer (unplugged, or reported the disconnected sentinel)
    Disconnected,
    /// Bus-level failure (no presence pulse, CRC mismatch, ...)
    Bus,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Disconnected => f.write_str("sensor disconnected"),
            BusError::Bus => f.write_str("bus error"),
        }
    }
}

/// Shared temperature sensor bus
///
/// Reading is a two-phase operation: [`request_conversion`] broadcasts a
/// conversion to every sensor at once and blocks until it completes, then
/// [`read_celsius`] fetches each sensor's latched result. One conversion
/// serves any number of subsequent reads within the same tick.
///
/// [`request_conversion`]: SensorBus::request_conversion
/// [`read_celsius`]: SensorBus::read_celsius
pub trait SensorBus {
    /// Enumerate the identities currently present on the bus
    ///
    /// The order is stable across calls within one power cycle. An empty
    /// result is not an error; callers must keep running degraded.
    fn discover(&mut self) -> Vec<SensorId, MAX_BUS_DEVICES>;

    /// Trigger a synchronous conversion on every sensor
    fn request_conversion(&mut self) -> Result<(), BusError>;

    /// Read the result of the last conversion for one sensor, in °C
    fn read_celsius(&mut self, id: &SensorId) -> Result<f32, BusError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_id_display_is_hex() {
        let id = SensorId::new([0x28, 0xFF, 0x4A, 0x1B, 0x00, 0x16, 0x03, 0x9C]);
        let mut out = heapless::String::<32>::new();
        core::fmt::write(&mut out, format_args!("{}", id)).unwrap();
        assert_eq!(out.as_str(), "28FF4A1B0016039C");
        assert_eq!(id.family_code(), 0x28);
    }

    #[test]
    fn test_sensor_id_from_slice() {
        assert!(SensorId::from_slice(&[1, 2, 3]).is_none());
        let id = SensorId::from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(id.to_bytes(), [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_sensor_id_equality_is_bytewise() {
        let a = SensorId::new([1; 8]);
        let b = SensorId::new([1; 8]);
        let c = SensorId::new([2; 8]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
