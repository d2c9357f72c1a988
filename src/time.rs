//! Timestamp reconstruction.
//!
//! Producers record raw clock ticks; consumers turn them back into wall-clock
//! time using a [`ClockSync`], a snapshot pairing one tick value with the wall
//! clock reading taken at the same instant.
//!
//! Adjustments to the system clock after the sync point (NTP steps, leap
//! seconds, DST transitions) are invisible to a tick counter and are not
//! reflected in reconstructed timestamps until the next sync is captured.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

use crate::deserialize::Deserialize;
use crate::error::Result;
use crate::pal::{SystemTimeProvider, TimeProvider};
use crate::serialize::Serialize;
use crate::shape::{Classify, Shape};
use crate::stream::{InputStream, OutputStream};

pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Longest time zone abbreviation a [`ClockSync`] carries, in bytes.
pub const TIMEZONE_NAME_CAPACITY: usize = 127;

pub type TimezoneName = heapless::String<TIMEZONE_NAME_CAPACITY>;

/// Correspondence between a tick clock and the wall clock at one instant.
///
/// Later tick values are interpreted relative to the most recent sync. A sync
/// is never modified after capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockSync {
    /// Tick count at the sync point.
    pub clock_value: u64,

    /// Ticks per second. Must not be zero.
    pub clock_frequency: u64,

    /// Wall clock at the sync point, nanoseconds since the Unix epoch.
    pub ns_since_epoch: u64,

    /// Local time minus UTC at the sync point.
    pub utc_offset_seconds: i32,

    /// Best-effort zone abbreviation, possibly empty.
    pub timezone_name: TimezoneName,
}

impl ClockSync {
    /// Wall-clock time of `clock_value` in nanoseconds since the Unix epoch.
    pub fn to_ns_since_epoch(&self, clock_value: u64) -> i64 {
        clock_to_ns_since_epoch(self, clock_value)
    }

    /// Local calendar time of `clock_value`, using the offset recorded at the sync point.
    pub fn to_local_time(&self, clock_value: u64) -> BrokenDownTime {
        ns_since_epoch_to_broken_down_time(self.to_ns_since_epoch(clock_value), self.utc_offset_seconds)
    }
}

/// Copies `name` into a [`TimezoneName`], cutting it at a char boundary if it is too long.
pub fn bounded_timezone_name(name: &str) -> TimezoneName {
    let mut bounded = TimezoneName::new();
    for c in name.chars() {
        if bounded.push(c).is_err() {
            break;
        }
    }
    bounded
}

type ClockSyncFields = (u64, u64, u64, i32, TimezoneName);

impl Classify for ClockSync {
    fn shape() -> Shape {
        <ClockSyncFields as Classify>::shape()
    }
}

impl Serialize for ClockSync {
    fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()> {
        self.clock_value.serialize(ostream)?;
        self.clock_frequency.serialize(ostream)?;
        self.ns_since_epoch.serialize(ostream)?;
        self.utc_offset_seconds.serialize(ostream)?;
        self.timezone_name.serialize(ostream)
    }

    fn serialized_size(&self) -> usize {
        8 + 8 + 8 + 4 + self.timezone_name.serialized_size()
    }
}

impl Deserialize for ClockSync {
    fn deserialize<I: InputStream + ?Sized>(istream: &mut I) -> Result<Self> {
        let (clock_value, clock_frequency, ns_since_epoch, utc_offset_seconds, timezone_name) =
            <ClockSyncFields as Deserialize>::deserialize(istream)?;

        Ok(Self {
            clock_value,
            clock_frequency,
            ns_since_epoch,
            utc_offset_seconds,
            timezone_name,
        })
    }
}

fn saturate(nanos: i128) -> i64 {
    i64::try_from(nanos).unwrap_or(if nanos < 0 { i64::MIN } else { i64::MAX })
}

/// Number of complete nanoseconds elapsed during `ticks` ticks of a clock
/// running at `frequency` ticks per second.
///
/// Sub-nanosecond remainders are truncated toward zero: four ticks of a 3 GHz
/// clock are one nanosecond, not 1⅓.
///
/// # Panics
///
/// If `frequency` is zero.
///
/// # Examples
///
/// ```
/// use binlog_core::time::ticks_to_nanoseconds;
///
/// assert_eq!(ticks_to_nanoseconds(3_000_000_000, 4), 1);
/// assert_eq!(ticks_to_nanoseconds(1_000, -3), -3_000_000);
/// ```
pub fn ticks_to_nanoseconds(frequency: u64, ticks: i64) -> i64 {
    let nanos = i128::from(ticks) * i128::from(NANOS_PER_SECOND) / i128::from(frequency);
    saturate(nanos)
}

/// Nanoseconds since the Unix epoch at the instant the clock read `clock_value`.
///
/// `clock_value` may precede the sync point. Clock adjustments made after the
/// sync are not accounted for.
///
/// # Panics
///
/// If `clock_sync.clock_frequency` is zero.
pub fn clock_to_ns_since_epoch(clock_sync: &ClockSync, clock_value: u64) -> i64 {
    // Two's complement reinterpretation yields the signed distance from the sync point.
    let ticks = clock_value.wrapping_sub(clock_sync.clock_value) as i64;
    let elapsed = ticks_to_nanoseconds(clock_sync.clock_frequency, ticks);
    saturate(i128::from(clock_sync.ns_since_epoch) + i128::from(elapsed))
}

/// Calendar decomposition of a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrokenDownTime {
    /// Full proleptic Gregorian year, e.g. 2024.
    pub year: i32,
    /// Months since January, `0..=11`.
    pub month: u32,
    /// Day of the month, `1..=31`.
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// Days since Sunday, `0..=6`.
    pub weekday: u32,
    /// Days since January 1, `0..=365`.
    pub year_day: u32,
    /// Fraction of the second, `0..1_000_000_000`.
    pub nanosecond: u32,
    /// Offset the fields are expressed in; zero for UTC.
    pub utc_offset_seconds: i32,
}

impl BrokenDownTime {
    /// Reassembles the nanoseconds since the Unix epoch these fields describe.
    ///
    /// Returns `None` if the fields do not form a valid date and time.
    pub fn to_ns_since_epoch(&self) -> Option<i64> {
        let date = NaiveDate::from_ymd_opt(self.year, self.month + 1, self.day)?;
        let local = date.and_hms_nano_opt(self.hour, self.minute, self.second, self.nanosecond)?;
        let shifted = local.and_utc().timestamp_nanos_opt()?;
        shifted.checked_sub(i64::from(self.utc_offset_seconds) * NANOS_PER_SECOND as i64)
    }
}

/// RFC 3339 with nanosecond precision, e.g. `2024-02-29T13:05:09.000000042Z`.
///
/// An offset that is not a whole number of minutes is rendered with seconds,
/// `-04:56:02`, which RFC 3339 itself cannot express.
impl fmt::Display for BrokenDownTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:09}",
            self.year,
            self.month + 1,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.nanosecond
        )?;

        if self.utc_offset_seconds == 0 {
            return f.write_str("Z");
        }

        let sign = if self.utc_offset_seconds < 0 { '-' } else { '+' };
        let offset = self.utc_offset_seconds.unsigned_abs();
        write!(f, "{}{:02}:{:02}", sign, offset / 3600, offset % 3600 / 60)?;
        if offset % 60 != 0 {
            write!(f, ":{:02}", offset % 60)?;
        }
        Ok(())
    }
}

/// Converts nanoseconds since the Unix epoch into UTC calendar fields.
///
/// No leap seconds are accounted for; the input is POSIX time.
///
/// # Examples
///
/// ```
/// use binlog_core::time::ns_since_epoch_to_broken_down_time_utc;
///
/// let t = ns_since_epoch_to_broken_down_time_utc(86_400_000_000_123);
/// assert_eq!((t.year, t.month, t.day), (1970, 0, 2));
/// assert_eq!(t.nanosecond, 123);
/// assert_eq!(t.to_string(), "1970-01-02T00:00:00.000000123Z");
/// ```
pub fn ns_since_epoch_to_broken_down_time_utc(since_epoch: i64) -> BrokenDownTime {
    ns_since_epoch_to_broken_down_time(since_epoch, 0)
}

/// Converts nanoseconds since the Unix epoch into calendar fields at a fixed UTC offset.
///
/// Local times that fall outside the `i64` nanosecond range are returned as
/// UTC fields instead, with `utc_offset_seconds` set to zero.
pub fn ns_since_epoch_to_broken_down_time(since_epoch: i64, utc_offset_seconds: i32) -> BrokenDownTime {
    let offset = i64::from(utc_offset_seconds) * NANOS_PER_SECOND as i64;
    let (local, utc_offset_seconds) = match since_epoch.checked_add(offset) {
        Some(local) => (local, utc_offset_seconds),
        None => {
            tracing::debug!(since_epoch, utc_offset_seconds, "local time out of range, using UTC");
            (since_epoch, 0)
        }
    };
    let time = DateTime::<Utc>::from_timestamp_nanos(local);

    BrokenDownTime {
        year: time.year(),
        month: time.month0(),
        day: time.day(),
        hour: time.hour(),
        minute: time.minute(),
        second: time.second(),
        weekday: time.weekday().num_days_from_sunday(),
        year_day: time.ordinal0(),
        nanosecond: time.nanosecond(),
        utc_offset_seconds,
    }
}

/// Reads the local zone at `ns_since_epoch`, falling back to UTC with no name.
pub(crate) fn local_zone_or_utc<P: TimeProvider + ?Sized>(provider: &P, ns_since_epoch: u64) -> (i32, TimezoneName) {
    let seconds = i64::try_from(ns_since_epoch / NANOS_PER_SECOND).unwrap_or(i64::MAX);

    match provider.local_zone(seconds) {
        Some(zone) => (zone.utc_offset_seconds, bounded_timezone_name(&zone.name)),
        None => {
            tracing::warn!("local time zone unavailable, recording UTC offset 0");
            (0, TimezoneName::new())
        }
    }
}

/// Captures a sync whose tick clock is the provider's wall clock itself:
/// one tick per nanosecond.
pub fn clock_sync_from<P: TimeProvider + ?Sized>(provider: &P) -> ClockSync {
    let now = provider.now_ns_since_epoch();
    let (utc_offset_seconds, timezone_name) = local_zone_or_utc(provider, now);

    let sync = ClockSync {
        clock_value: now,
        clock_frequency: NANOS_PER_SECOND,
        ns_since_epoch: now,
        utc_offset_seconds,
        timezone_name,
    };
    tracing::debug!(?sync, "captured clock sync");
    sync
}

/// Captures a sync against the system real-time clock.
pub fn system_clock_sync() -> ClockSync {
    clock_sync_from(&SystemTimeProvider)
}
