//! Platform access for the wall clock and the local time zone.
//!
//! Clock capture reads ambient OS state. Routing those reads through
//! [`TimeProvider`] keeps the capture logic a plain function of its inputs and
//! lets tests substitute a fixed clock and zone.

use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly",
))]
#[path = "pal/libc.rs"]
mod platform;

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly",
)))]
#[path = "pal/fallback.rs"]
mod platform;

/// Offset and abbreviation of the local time zone at some instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalZone {
    /// Local time minus UTC, in seconds.
    pub utc_offset_seconds: i32,

    /// Abbreviation such as `CET`; empty where the platform has none to offer.
    pub name: String,
}

/// Source of wall-clock time and local time zone information.
#[cfg_attr(test, mockall::automock)]
pub trait TimeProvider {
    /// Nanoseconds since the Unix epoch, not counting leap seconds.
    fn now_ns_since_epoch(&self) -> u64;

    /// The local zone in effect at `seconds_since_epoch`, if the platform can tell.
    fn local_zone(&self, seconds_since_epoch: i64) -> Option<LocalZone>;
}

/// The operating system's real-time clock and time zone database.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_ns_since_epoch(&self) -> u64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since_epoch) => u64::try_from(since_epoch.as_nanos()).unwrap_or(u64::MAX),
            Err(e) => {
                tracing::warn!(behind = ?e.duration(), "system clock reads earlier than the Unix epoch");
                0
            }
        }
    }

    fn local_zone(&self, seconds_since_epoch: i64) -> Option<LocalZone> {
        platform::local_zone(seconds_since_epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_now_is_close_to_std() {
        let provider = SystemTimeProvider;
        let before = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos() as u64;
        let now = provider.now_ns_since_epoch();
        let after = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos() as u64;

        assert!(before <= now && now <= after, "provider time should lie between two std samples");
    }

    #[test]
    fn test_system_local_zone_offset_is_plausible() {
        let provider = SystemTimeProvider;
        let seconds = (provider.now_ns_since_epoch() / 1_000_000_000) as i64;

        if let Some(zone) = provider.local_zone(seconds) {
            assert!(
                zone.utc_offset_seconds.abs() <= 26 * 3600,
                "offset {} is outside any real time zone",
                zone.utc_offset_seconds
            );
        }
    }
}
