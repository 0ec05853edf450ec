//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_offsets_as_utc() {
        let ts: Timestamp = serde_json::from_str("\"2024-03-01T15:45:00+05:30\"").unwrap();
        let utc: Timestamp = serde_json::from_str("\"2024-03-01T10:15:00Z\"").unwrap();
        assert_eq!(ts, utc);
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Timestamp>("\"yesterday\"").is_err());
    }

    #[test]
    fn serializes_transparently() {
        let ts: Timestamp = serde_json::from_str("\"2024-03-01T10:15:00Z\"").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-03-01T10:15:00Z\"");
    }

    #[test]
    fn now_orders_after_past_instants() {
        let past: Timestamp = serde_json::from_str("\"2024-01-01T00:00:00Z\"").unwrap();
        assert!(past < Timestamp::now());
    }
}
