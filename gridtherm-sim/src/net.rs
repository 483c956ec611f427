//! Simulated network
//!
//! The link comes up as soon as credentials are supplied. Reports are
//! logged and answered with a canned response body.

use gridtherm_hal::{Connectivity, Transport, TransportError};
use log::{debug, info};

/// Link that connects to any non-empty SSID
#[derive(Debug, Default)]
pub struct SimLink {
    ssid: Option<String>,
}

impl Connectivity for SimLink {
    fn is_connected(&mut self) -> bool {
        self.ssid.is_some()
    }

    fn reconnect(&mut self, ssid: &str, _password: &str) {
        if ssid.is_empty() {
            self.ssid = None;
            return;
        }
        info!("Joined network {}", ssid);
        self.ssid = Some(ssid.to_string());
    }
}

/// Endpoint stand-in answering every request with the same body
#[derive(Debug)]
pub struct LoopbackTransport {
    response: Vec<u8>,
}

impl LoopbackTransport {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.as_bytes().to_vec(),
        }
    }
}

impl Transport for LoopbackTransport {
    fn post(
        &mut self,
        url: &str,
        body: &[u8],
        response: &mut [u8],
    ) -> Result<usize, TransportError> {
        debug!("POST {} {}", url, String::from_utf8_lossy(body));

        let target = response
            .get_mut(..self.response.len())
            .ok_or(TransportError::ResponseTooLarge)?;
        target.copy_from_slice(&self.response);
        Ok(self.response.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_follows_credentials() {
        let mut link = SimLink::default();
        assert!(!link.is_connected());
        link.reconnect("", "");
        assert!(!link.is_connected());
        link.reconnect("SimNet", "pw");
        assert!(link.is_connected());
    }

    #[test]
    fn test_loopback_answers() {
        let mut transport = LoopbackTransport::new(r#"{"edit":1,"interval":60}"#);
        let mut buffer = [0u8; 64];
        let len = transport.post("http://x", b"{}", &mut buffer).unwrap();
        assert_eq!(&buffer[..len], br#"{"edit":1,"interval":60}"#);
    }

    #[test]
    fn test_loopback_response_too_large() {
        let mut transport = LoopbackTransport::new("0123456789");
        let mut buffer = [0u8; 4];
        assert_eq!(
            transport.post("http://x", b"{}", &mut buffer),
            Err(TransportError::ResponseTooLarge)
        );
    }
}
