//! Network abstractions
//!
//! The core only needs to know whether the link is up and how to hand an
//! opaque payload to an endpoint. TLS, timeouts and header plumbing belong
//! to the implementation.

use core::fmt;

/// Errors from telemetry delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// No network link
    NotConnected,
    /// Request could not be completed (DNS, socket, timeout)
    Request,
    /// Endpoint answered with a non-success status code
    Status(u16),
    /// Response body did not fit the provided buffer
    ResponseTooLarge,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NotConnected => f.write_str("not connected"),
            TransportError::Request => f.write_str("request failed"),
            TransportError::Status(code) => write!(f, "HTTP status {}", code),
            TransportError::ResponseTooLarge => f.write_str("response too large"),
        }
    }
}

/// Payload delivery to a remote endpoint
pub trait Transport {
    /// POST `body` (JSON) to `url`
    ///
    /// On success the response body is copied into `response` and its
    /// length returned.
    fn post(&mut self, url: &str, body: &[u8], response: &mut [u8])
        -> Result<usize, TransportError>;
}

/// Link status and best-effort recovery
pub trait Connectivity {
    /// Check whether the link is currently up
    fn is_connected(&mut self) -> bool;

    /// Start a reconnection attempt with the given credentials
    ///
    /// Returns immediately; success shows up in a later [`is_connected`].
    ///
    /// [`is_connected`]: Connectivity::is_connected
    fn reconnect(&mut self, ssid: &str, password: &str);
}
