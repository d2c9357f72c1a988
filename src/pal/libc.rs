use std::ffi::CStr;

use lazy_static::lazy_static;

use crate::pal::LocalZone;

extern "C" {
    fn tzset();
}

lazy_static! {
    /// `localtime_r` is not required to consult `TZ` itself.
    // SAFETY: `tzset` takes no arguments and only initializes libc's zone state.
    static ref TZSET: () = unsafe { tzset() };
}

pub(crate) fn local_zone(seconds_since_epoch: i64) -> Option<LocalZone> {
    lazy_static::initialize(&TZSET);

    let time: libc::time_t = seconds_since_epoch.try_into().ok()?;

    // SAFETY: `tm` is a plain C struct for which all-zero bytes are valid.
    let mut tm: libc::tm = unsafe { std::mem::zeroed() };

    // SAFETY: both pointers are valid for the duration of the call.
    let result = unsafe { libc::localtime_r(&time, &mut tm) };
    if result.is_null() {
        tracing::warn!(seconds_since_epoch, "localtime_r failed");
        return None;
    }

    let utc_offset_seconds = i32::try_from(tm.tm_gmtoff).ok()?;
    let name = if tm.tm_zone.is_null() {
        String::new()
    } else {
        // SAFETY: `tm_zone` points at a NUL-terminated abbreviation owned by the C library.
        unsafe { CStr::from_ptr(tm.tm_zone) }
            .to_string_lossy()
            .into_owned()
    };

    Some(LocalZone {
        utc_offset_seconds,
        name,
    })
}
