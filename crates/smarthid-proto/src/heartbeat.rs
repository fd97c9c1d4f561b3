//! Device heartbeat record.

use serde_json::Value;

/// Contents of `hid/status`, written by the firmware.
///
/// `last_seen` is epoch seconds from the device clock, which may be skewed
/// against ours. It is optional because the seeded record is just
/// `{ "online": false }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeartbeatStatus {
    /// Device's own claim of being online.
    pub online: bool,
    /// Last heartbeat, epoch seconds.
    pub last_seen: Option<u64>,
}

impl HeartbeatStatus {
    /// Decodes the store value.
    ///
    /// Returns `None` when the record is absent entirely. Present records with
    /// missing or mistyped fields decode to their defaults; fractional
    /// timestamps are truncated to whole seconds.
    pub fn from_store(value: Option<&Value>) -> Option<Self> {
        let fields = match value? {
            Value::Object(fields) => fields,
            Value::Null => return None,
            _ => return Some(Self::default()),
        };

        let online = fields.get("online").and_then(Value::as_bool).unwrap_or(false);
        let last_seen = fields.get("lastSeen").and_then(epoch_seconds);

        Some(Self { online, last_seen })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn epoch_seconds(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| value.as_f64().filter(|s| s.is_finite() && *s >= 0.0).map(|s| s as u64))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn absent_record_is_none() {
        assert_eq!(HeartbeatStatus::from_store(None), None);
        assert_eq!(HeartbeatStatus::from_store(Some(&Value::Null)), None);
    }

    #[test]
    fn seeded_record_is_offline_without_timestamp() {
        let status = HeartbeatStatus::from_store(Some(&json!({ "online": false })));
        assert_eq!(status, Some(HeartbeatStatus { online: false, last_seen: None }));
    }

    #[test]
    fn decodes_integer_and_fractional_timestamps() {
        let whole = HeartbeatStatus::from_store(Some(&json!({ "online": true, "lastSeen": 1_700_000_000 })));
        assert_eq!(whole.and_then(|s| s.last_seen), Some(1_700_000_000));

        let frac = HeartbeatStatus::from_store(Some(&json!({ "online": true, "lastSeen": 1_700_000_000.75 })));
        assert_eq!(frac.and_then(|s| s.last_seen), Some(1_700_000_000));
    }

    #[test]
    fn negative_timestamp_is_dropped() {
        let status = HeartbeatStatus::from_store(Some(&json!({ "online": true, "lastSeen": -5 })));
        assert_eq!(status, Some(HeartbeatStatus { online: true, last_seen: None }));
    }

    #[test]
    fn non_object_record_reads_as_default() {
        let status = HeartbeatStatus::from_store(Some(&json!("online")));
        assert_eq!(status, Some(HeartbeatStatus::default()));
    }
}
