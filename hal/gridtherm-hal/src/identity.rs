//! Device identity

/// Source of a stable, unique device name
///
/// Typically derived from a MAC address or chip serial. The derivation is
/// up to the implementation; the core only forwards the string.
pub trait DeviceIdentity {
    /// Unique device identifier
    fn device_id(&self) -> &str;
}
