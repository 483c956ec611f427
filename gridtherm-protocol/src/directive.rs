//! Remote cadence directive
//!
//! The telemetry endpoint may answer with `{ "edit": 1, "interval": <s> }`
//! to change the sampling/reporting period. Anything else in the response
//! is ignored, including unknown fields next to a valid directive.

use serde_json::Value;

use crate::MIN_INTERVAL_S;

/// Marker value of the `edit` field
const EDIT_INTERVAL: i64 = 1;

/// A well-formed interval directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IntervalDirective {
    /// Value sent by the endpoint
    pub requested_s: i64,
    /// Value to apply, after the safety clamp
    pub interval_s: u32,
}

impl IntervalDirective {
    /// Effective period in milliseconds
    pub fn interval_ms(&self) -> u64 {
        u64::from(self.interval_s) * 1000
    }

    /// Whether the requested value was raised to the floor
    pub fn was_clamped(&self) -> bool {
        self.requested_s < i64::from(MIN_INTERVAL_S)
    }
}

/// Clamp a requested period to `[MIN_INTERVAL_S, u32::MAX]` seconds
pub fn clamp_interval_s(requested_s: i64) -> u32 {
    let floor = i64::from(MIN_INTERVAL_S);
    let clamped = requested_s.max(floor).min(i64::from(u32::MAX));
    clamped as u32
}

/// Parse a response body for an interval directive
///
/// Returns `None` for any body that is not a JSON object carrying
/// `"edit": 1` and an integer `"interval"`.
pub fn parse_directive(body: &[u8]) -> Option<IntervalDirective> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let fields = value.as_object()?;

    if fields.get("edit").and_then(Value::as_i64) != Some(EDIT_INTERVAL) {
        return None;
    }

    let requested_s = fields.get("interval").and_then(Value::as_i64)?;
    Some(IntervalDirective {
        requested_s,
        interval_s: clamp_interval_s(requested_s),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_directive() {
        let directive = parse_directive(br#"{"edit":1,"interval":60}"#).unwrap();
        assert_eq!(directive.interval_s, 60);
        assert_eq!(directive.interval_ms(), 60_000);
        assert!(!directive.was_clamped());
    }

    #[test]
    fn test_directive_is_clamped() {
        let directive = parse_directive(br#"{"edit":1,"interval":3}"#).unwrap();
        assert_eq!(directive.interval_s, 10);
        assert_eq!(directive.interval_ms(), 10_000);
        assert!(directive.was_clamped());
    }

    #[test]
    fn test_negative_interval_is_clamped() {
        let directive = parse_directive(br#"{"edit":1,"interval":-5}"#).unwrap();
        assert_eq!(directive.interval_s, MIN_INTERVAL_S);
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let directive =
            parse_directive(br#"{"status":"ok","edit":1,"interval":45,"note":"x"}"#).unwrap();
        assert_eq!(directive.interval_s, 45);
    }

    #[test]
    fn test_malformed_bodies_are_ignored() {
        let bodies: [&[u8]; 12] = [
            b"",
            b"OK",
            b"[1,2]",
            b"[1,3]",
            b"1",
            b"null",
            br#"{"edit":0,"interval":60}"#,
            br#"{"edit":2,"interval":60}"#,
            br#"{"interval":60}"#,
            br#"{"edit":1}"#,
            br#"{"edit":1,"interval":"60"}"#,
            br#"{"edit":1,"interval":60.5}"#,
        ];
        for body in bodies {
            assert_eq!(parse_directive(body), None);
        }
    }

    proptest! {
        #[test]
        fn test_clamp_never_below_floor(requested in any::<i64>()) {
            let clamped = clamp_interval_s(requested);
            prop_assert!(clamped >= MIN_INTERVAL_S);
            if requested >= i64::from(MIN_INTERVAL_S) && requested <= i64::from(u32::MAX) {
                prop_assert_eq!(i64::from(clamped), requested);
            }
        }
    }
}
