use std::env;
use std::io;
use std::time::Duration;

use binlog_core::efficient_clock::{calibrate, get_timestamp};
use binlog_core::time::ClockSync;
use binlog_core::visit::visit;
use binlog_core::{deserialize, serialize, Classify, Result};
use tracing_subscriber::EnvFilter;

/// Calibration window used when none is given on the command line.
const DEFAULT_CALIBRATION_MS: u64 = 10;

/// (ticks, label, samples, flags)
type Record = (u64, String, Vec<i32>, [bool; 3]);

fn main() -> Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .init();

    let window_ms = env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_CALIBRATION_MS);

    // Producer side
    let sync = calibrate(Duration::from_millis(window_ms));
    tracing::info!(
        frequency = sync.clock_frequency,
        zone = %sync.timezone_name,
        "tick clock calibrated"
    );

    let record: Record = (
        get_timestamp(),
        "disk usage".to_string(),
        vec![71, 72, 75],
        [true, false, true],
    );

    let mut stream = Vec::<u8>::new();
    serialize(&sync, &mut stream)?;
    serialize(&record, &mut stream)?;
    tracing::info!(bytes = stream.len(), "encoded sync and record");

    // Consumer side
    let mut source = stream.as_slice();
    let sync: ClockSync = deserialize(&mut source)?;

    let shape = <Record as Classify>::shape();
    let mut typed = source;
    let (ticks, ..): Record = deserialize(&mut typed)?;
    let value = visit(&shape, &mut source)?;

    println!("{} {} {}", sync.to_local_time(ticks), shape, value);
    Ok(())
}
