//! Signing timestamps.
//!
//! FalconX rejects requests whose `FX-ACCESS-TIMESTAMP` falls outside a short
//! freshness window, so the timestamp is read from a [`TimestampProvider`] at
//! the moment a request is signed, never ahead of time.

use std::fmt;

use time::OffsetDateTime;

/// Seconds since the Unix epoch with millisecond precision.
///
/// Rendered the way the server expects it: `1700000000.123`, with trailing
/// zeros trimmed and no fractional part for whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    millis: i64,
}

impl Timestamp {
    /// Create a timestamp from milliseconds since the Unix epoch.
    pub const fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        Self::from_millis((nanos / 1_000_000) as i64)
    }

    /// Milliseconds since the Unix epoch.
    pub const fn as_millis(&self) -> i64 {
        self.millis
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.millis.div_euclid(1000);
        let frac = self.millis.rem_euclid(1000);
        if frac == 0 {
            return write!(f, "{secs}");
        }
        let digits = format!("{frac:03}");
        write!(f, "{secs}.{}", digits.trim_end_matches('0'))
    }
}

/// Source of signing timestamps.
pub trait TimestampProvider: Send + Sync {
    /// The timestamp to sign the request being dispatched right now.
    fn timestamp(&self) -> Timestamp;
}

/// Wall-clock timestamp provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimestampProvider for SystemClock {
    fn timestamp(&self) -> Timestamp {
        Timestamp::now()
    }
}
