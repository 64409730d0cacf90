//! Microsecond timestamps
//!
//! A `Timestamp` is a signed count of microseconds since
//! 1970-01-01T00:00:00 UTC. `MIN` and `MAX` stand in for -inf and +inf
//! in open-ended range queries.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Point in time with microsecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Minimum possible timestamp (-inf)
    pub const MIN: Timestamp = Timestamp(i64::MIN);

    /// Maximum possible timestamp (+inf)
    pub const MAX: Timestamp = Timestamp(i64::MAX);

    /// Create a timestamp from microseconds since the epoch
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Microseconds since the epoch
    pub const fn as_micros(self) -> i64 {
        self.0
    }

    /// UTC timestamp of the current instant
    pub fn utc_now() -> Self {
        Self(Utc::now().timestamp_micros())
    }

    /// Convert to a chrono datetime, if the value is representable
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_micros(self.0).single()
    }

    /// Serialize to the on-page representation
    pub(crate) fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    /// Deserialize from the on-page representation
    pub(crate) fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Self(i64::from_le_bytes(bytes))
    }
}

impl From<i64> for Timestamp {
    fn from(micros: i64) -> Self {
        Self(micros)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_micros())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Timestamp::MIN => write!(f, "-inf"),
            Timestamp::MAX => write!(f, "+inf"),
            ts => match ts.to_datetime() {
                Some(dt) => write!(f, "{}", dt.to_rfc3339()),
                None => write!(f, "{}us", ts.0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        let a = Timestamp::from_micros(100);
        let b = Timestamp::from_micros(200);

        assert!(a < b);
        assert!(b > a);
        assert!(a <= a);
        assert!(a >= a);
        assert_eq!(a, Timestamp::from(100));
        assert!(Timestamp::MIN < a);
        assert!(Timestamp::MAX > b);
    }

    #[test]
    fn test_utc_now_is_recent() {
        let now = Timestamp::utc_now();
        // 2020-01-01T00:00:00Z in microseconds
        assert!(now.as_micros() > 1_577_836_800_000_000);
    }

    #[test]
    fn test_datetime_conversion() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let ts = Timestamp::from(dt);

        assert_eq!(ts.to_datetime(), Some(dt));
        assert_eq!(ts.to_string(), "2024-03-01T12:00:00+00:00");
    }

    #[test]
    fn test_sentinel_display() {
        assert_eq!(Timestamp::MIN.to_string(), "-inf");
        assert_eq!(Timestamp::MAX.to_string(), "+inf");
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Timestamp::from_micros(42)).unwrap();
        assert_eq!(json, "42");

        let ts: Timestamp = serde_json::from_str("-7").unwrap();
        assert_eq!(ts, Timestamp::from_micros(-7));
    }
}
