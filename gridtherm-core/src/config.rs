//! Configuration constants and operator settings
//!
//! Settings are stored as a single postcard blob under the settings
//! namespace. Changing a field through the console persists the whole
//! record.

use core::fmt;

use heapless::String;
use serde::{Deserialize, Serialize};

/// Minimum rise over baseline that marks a sensor as touched (°C)
pub const LEARN_THRESHOLD_C: f32 = 1.5;

/// Learning poll period
pub const LEARN_POLL_MS: u64 = 1_000;

/// Default sampling/reporting period
pub const DEFAULT_INTERVAL_S: u32 = 30;

/// Link supervision period
pub const CONNECTIVITY_CHECK_MS: u64 = 30_000;

/// Fewest valid readings a calibration may be computed from
pub const MIN_CALIBRATION_READINGS: usize = 2;

pub use gridtherm_protocol::MIN_INTERVAL_S;

pub const SSID_LEN: usize = 32;
pub const PASSWORD_LEN: usize = 64;
pub const URL_LEN: usize = 128;

/// Errors updating settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// Value longer than the field allows
    TooLong { field: &'static str, max: usize },
    /// Interval below [`MIN_INTERVAL_S`]
    IntervalTooShort,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::TooLong { field, max } => {
                write!(f, "{} longer than {} bytes", field, max)
            }
            SettingsError::IntervalTooShort => {
                write!(f, "interval below {} s", MIN_INTERVAL_S)
            }
        }
    }
}

/// Network credentials and telemetry endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub ssid: String<SSID_LEN>,
    /// Empty for open networks
    pub password: String<PASSWORD_LEN>,
    /// Empty until configured; reports are skipped without an endpoint
    pub server_url: String<URL_LEN>,
}

impl NetworkConfig {
    pub fn set_wifi(&mut self, ssid: &str, password: &str) -> Result<(), SettingsError> {
        let ssid = copy_str(ssid, "ssid")?;
        let password = copy_str(password, "password")?;
        self.ssid = ssid;
        self.password = password;
        Ok(())
    }

    pub fn set_server(&mut self, url: &str) -> Result<(), SettingsError> {
        self.server_url = copy_str(url, "url")?;
        Ok(())
    }

    pub fn has_credentials(&self) -> bool {
        !self.ssid.is_empty()
    }

    pub fn has_endpoint(&self) -> bool {
        !self.server_url.is_empty()
    }
}

fn copy_str<const N: usize>(value: &str, field: &'static str) -> Result<String<N>, SettingsError> {
    let mut out = String::new();
    out.push_str(value)
        .map_err(|_| SettingsError::TooLong { field, max: N })?;
    Ok(out)
}

/// Persistent operator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Sampling/reporting period in seconds
    pub interval_s: u32,
    pub network: NetworkConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval_s: DEFAULT_INTERVAL_S,
            network: NetworkConfig::default(),
        }
    }
}

impl Settings {
    pub fn set_interval(&mut self, seconds: u32) -> Result<(), SettingsError> {
        if seconds < MIN_INTERVAL_S {
            return Err(SettingsError::IntervalTooShort);
        }
        self.interval_s = seconds;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.interval_s, DEFAULT_INTERVAL_S);
        assert!(!settings.network.has_credentials());
        assert!(!settings.network.has_endpoint());
    }

    #[test]
    fn test_set_wifi_open_network() {
        let mut network = NetworkConfig::default();
        network.set_wifi("Cafe", "").unwrap();
        assert_eq!(network.ssid.as_str(), "Cafe");
        assert!(network.password.is_empty());
        assert!(network.has_credentials());
    }

    #[test]
    fn test_too_long_leaves_previous_value() {
        let mut network = NetworkConfig::default();
        network.set_wifi("Home", "secret").unwrap();

        let long = "x".repeat(SSID_LEN + 1);
        assert_eq!(
            network.set_wifi(&long, "other"),
            Err(SettingsError::TooLong {
                field: "ssid",
                max: SSID_LEN
            })
        );
        assert_eq!(network.ssid.as_str(), "Home");
        assert_eq!(network.password.as_str(), "secret");
    }

    #[test]
    fn test_interval_floor() {
        let mut settings = Settings::default();
        assert_eq!(settings.set_interval(5), Err(SettingsError::IntervalTooShort));
        assert_eq!(settings.interval_s, DEFAULT_INTERVAL_S);
        settings.set_interval(MIN_INTERVAL_S).unwrap();
        assert_eq!(settings.interval_s, MIN_INTERVAL_S);
    }

    #[test]
    fn test_postcard_roundtrip() {
        let mut settings = Settings::default();
        settings.set_interval(120).unwrap();
        settings.network.set_wifi("Lab", "pw").unwrap();
        settings.network.set_server("http://10.0.0.2/ingest").unwrap();

        let bytes = postcard::to_allocvec(&settings).unwrap();
        let decoded: Settings = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, settings);
    }
}
