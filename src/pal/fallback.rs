use chrono::{Local, TimeZone};

use crate::pal::LocalZone;

/// The platform exposes no zone abbreviation here, only the offset.
pub(crate) fn local_zone(seconds_since_epoch: i64) -> Option<LocalZone> {
    let local = Local.timestamp_opt(seconds_since_epoch, 0).single()?;

    Some(LocalZone {
        utc_offset_seconds: local.offset().local_minus_utc(),
        name: String::new(),
    })
}
