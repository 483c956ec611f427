//! Telemetry reporting
//!
//! Builds the wire report from a snapshot and hands it to the transport.
//! A failed send drops the report; the next scheduled report carries
//! fresh data instead of a retry.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use log::{debug, info, warn};

use gridtherm_hal::{Transport, TransportError};
use gridtherm_protocol::{parse_directive, IntervalDirective, ProtocolError, TelemetryReport};

use crate::sampler::Snapshot;

/// Size of the buffer receiving the endpoint's response
pub const RESPONSE_BUFFER_LEN: usize = 512;

/// Errors delivering a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportError {
    /// No endpoint configured
    NoEndpoint,
    /// Link is down
    Offline,
    Encode(ProtocolError),
    Transport(TransportError),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::NoEndpoint => f.write_str("no server configured"),
            ReportError::Offline => f.write_str("network offline"),
            ReportError::Encode(e) => write!(f, "{}", e),
            ReportError::Transport(e) => write!(f, "transport: {}", e),
        }
    }
}

impl From<ProtocolError> for ReportError {
    fn from(e: ProtocolError) -> Self {
        ReportError::Encode(e)
    }
}

impl From<TransportError> for ReportError {
    fn from(e: TransportError) -> Self {
        ReportError::Transport(e)
    }
}

/// Build the wire report for a snapshot
pub fn build_report(snapshot: &Snapshot, device_id: &str, interval_s: u32) -> TelemetryReport {
    let size = snapshot.size();
    let temperature_grid: Vec<Vec<f32>> = (0..size.rows())
        .map(|row| {
            snapshot
                .row(row)
                .iter()
                .map(|sample| sample.wire_value())
                .collect()
        })
        .collect();

    TelemetryReport {
        dev_num: String::from(device_id),
        timestamp: snapshot.taken_at_ms(),
        interval: interval_s,
        rows: size.rows(),
        cols: size.cols(),
        temperature_grid,
        statistics: snapshot.statistics(),
    }
}

/// Report sender over a transport
pub struct Reporter<T> {
    transport: T,
    response: [u8; RESPONSE_BUFFER_LEN],
    sent: u32,
    failed: u32,
}

impl<T: Transport> Reporter<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            response: [0; RESPONSE_BUFFER_LEN],
            sent: 0,
            failed: 0,
        }
    }

    /// Send one report
    ///
    /// Returns the interval directive carried by the response, if any. A
    /// response that is not a well-formed directive is not an error.
    pub fn send(
        &mut self,
        url: &str,
        report: &TelemetryReport,
    ) -> Result<Option<IntervalDirective>, ReportError> {
        if url.is_empty() {
            return Err(ReportError::NoEndpoint);
        }

        let body = report.to_json()?;
        let len = match self.transport.post(url, &body, &mut self.response) {
            Ok(len) if len <= self.response.len() => len,
            Ok(_) => return Err(self.drop_report(TransportError::ResponseTooLarge)),
            Err(e) => return Err(self.drop_report(e)),
        };
        self.sent = self.sent.wrapping_add(1);
        info!(
            "Report sent: {} bytes, {} valid readings",
            body.len(),
            report.statistics.map_or(0, |s| s.valid_readings)
        );

        let directive = parse_directive(&self.response[..len]);
        if directive.is_none() && len > 0 {
            debug!("Response carries no directive, ignored");
        }
        Ok(directive)
    }

    /// Reports delivered since boot
    pub fn sent(&self) -> u32 {
        self.sent
    }

    /// Reports dropped since boot
    pub fn failed(&self) -> u32 {
        self.failed
    }

    fn drop_report(&mut self, error: TransportError) -> ReportError {
        self.failed = self.failed.wrapping_add(1);
        warn!("Report dropped: {}", error);
        error.into()
    }
}
