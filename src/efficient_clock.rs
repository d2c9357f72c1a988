//! High-precision tick source for log producers.
//!
//! Producers stamp records with [`get_timestamp`], which costs a handful of
//! cycles. The ticks mean nothing on their own; [`calibrate`] pairs them with
//! the wall clock and measures their rate, producing the [`ClockSync`] a
//! consumer needs to turn ticks back into time.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::_rdtsc;
use std::thread;
use std::time::Duration;

use crate::pal::{SystemTimeProvider, TimeProvider};
use crate::time::{local_zone_or_utc, ClockSync, NANOS_PER_SECOND};

/// Returns a monotonic timestamp with the highest precision available.
///
/// This function uses architecture-specific instructions when available:
/// - x86_64: RDTSC instruction (CPU time stamp counter)
/// - aarch64: CNTVCT_EL0 register (ARM virtual counter)
/// - Other platforms: System time with nanosecond precision
///
/// # Performance
///
/// - On x86_64: ~25 CPU cycles
/// - On aarch64: ~10-20 CPU cycles
/// - Other platforms: Varies by OS
#[inline(always)]
pub fn get_timestamp() -> u64 {
    #[cfg(target_arch = "x86_64")]
    unsafe {
        _rdtsc()
    }

    #[cfg(target_arch = "aarch64")]
    unsafe {
        let mut value: u64;
        std::arch::asm!("mrs {}, cntvct_el0", out(reg) value);
        value
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        SystemTimeProvider.now_ns_since_epoch()
    }
}

/// Tick rate of [`get_timestamp`] when the architecture publishes it.
///
/// The x86_64 time stamp counter rate has to be measured instead.
pub fn known_frequency() -> Option<u64> {
    #[cfg(target_arch = "x86_64")]
    {
        None
    }

    #[cfg(target_arch = "aarch64")]
    unsafe {
        let mut frequency: u64;
        std::arch::asm!("mrs {}, cntfrq_el0", out(reg) frequency);
        Some(frequency).filter(|&f| f != 0)
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        Some(NANOS_PER_SECOND)
    }
}

/// Reads the tick counter on both sides of a wall clock read and returns the
/// midpoint tick with the wall time.
fn sample<P: TimeProvider + ?Sized>(provider: &P) -> (u64, u64) {
    let before = get_timestamp();
    let ns_since_epoch = provider.now_ns_since_epoch();
    let after = get_timestamp();

    (before + after.saturating_sub(before) / 2, ns_since_epoch)
}

fn measure_frequency<P: TimeProvider + ?Sized>(provider: &P, window: Duration) -> u64 {
    let (start_ticks, start_ns) = sample(provider);
    thread::sleep(window);
    let (end_ticks, end_ns) = sample(provider);

    let ticks = u128::from(end_ticks.saturating_sub(start_ticks));
    let elapsed_ns = u128::from(end_ns.saturating_sub(start_ns));
    if ticks == 0 || elapsed_ns == 0 {
        tracing::warn!(%ticks, %elapsed_ns, "degenerate calibration window, assuming 1 GHz");
        return NANOS_PER_SECOND;
    }

    u64::try_from(ticks * u128::from(NANOS_PER_SECOND) / elapsed_ns)
        .unwrap_or(u64::MAX)
        .max(1)
}

/// Builds a [`ClockSync`] for [`get_timestamp`] ticks against the system clock.
///
/// Where the tick rate is not published by the hardware it is measured over
/// `window`; longer windows give a more accurate rate.
pub fn calibrate(window: Duration) -> ClockSync {
    calibrate_with(&SystemTimeProvider, window)
}

/// Like [`calibrate`], reading wall time and zone from `provider`.
pub fn calibrate_with<P: TimeProvider + ?Sized>(provider: &P, window: Duration) -> ClockSync {
    let clock_frequency = match known_frequency() {
        Some(frequency) => frequency,
        None => measure_frequency(provider, window),
    };

    let (clock_value, ns_since_epoch) = sample(provider);
    let (utc_offset_seconds, timezone_name) = local_zone_or_utc(provider, ns_since_epoch);

    let sync = ClockSync {
        clock_value,
        clock_frequency,
        ns_since_epoch,
        utc_offset_seconds,
        timezone_name,
    };
    tracing::debug!(?sync, "calibrated tick clock");
    sync
}
