//! Package timestamps.
//!
//! DBPF headers store creation and modification times as 32-bit unsigned
//! Unix timestamps (whole seconds since 1970-01-01 UTC). Many tools leave
//! them zero.
//!
//! # Example
//!
//! ```rust
//! use sc4pack::Timestamp;
//!
//! let ts = Timestamp::from_unix_secs(1_700_000_000);
//! assert_eq!(ts.as_unix_secs(), 1_700_000_000);
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A whole-second timestamp as stored in a package header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    secs: u32,
}

impl Timestamp {
    /// The zero timestamp written by tools that do not track times.
    pub const ZERO: Timestamp = Timestamp { secs: 0 };

    /// Creates a timestamp from raw Unix seconds.
    pub const fn from_unix_secs(secs: u32) -> Self {
        Self { secs }
    }

    /// Returns the current time, saturated to the 32-bit range.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Converts a [`SystemTime`], clamping to the representable range.
    ///
    /// Times before the Unix epoch become zero; times past 2106 saturate.
    pub fn from_system_time(time: SystemTime) -> Self {
        let secs = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs().min(u32::MAX as u64) as u32)
            .unwrap_or(0);
        Self { secs }
    }

    /// Returns the raw Unix seconds value.
    pub const fn as_unix_secs(&self) -> u32 {
        self.secs
    }

    /// Returns the timestamp as a [`SystemTime`].
    pub fn as_system_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.secs as u64)
    }
}

impl From<u32> for Timestamp {
    fn from(secs: u32) -> Self {
        Self::from_unix_secs(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch() {
        assert_eq!(Timestamp::ZERO.as_system_time(), UNIX_EPOCH);
    }

    #[test]
    fn test_before_epoch_clamps_to_zero() {
        let early = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(Timestamp::from_system_time(early), Timestamp::ZERO);
    }

    #[test]
    fn test_far_future_saturates() {
        let late = UNIX_EPOCH + Duration::from_secs(u64::from(u32::MAX) + 1000);
        assert_eq!(Timestamp::from_system_time(late).as_unix_secs(), u32::MAX);
    }

    #[test]
    fn test_system_time_roundtrip() {
        let ts = Timestamp::from_unix_secs(1_234_567_890);
        assert_eq!(Timestamp::from_system_time(ts.as_system_time()), ts);
    }
}
