use binlog_core::efficient_clock::{calibrate, get_timestamp};
use binlog_core::shape::{Classify, Shape};
use binlog_core::stream::{IoSink, OutputStream};
use binlog_core::{serialize, Serialize};
use criterion::{black_box, criterion_group, Criterion};
use log::{info, LevelFilter};
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::env;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use std::sync::Once;
use std::time::{Duration, Instant};
use tempfile::{tempdir, TempDir};

const ITERATIONS: usize = 65_536;

static LOGGER_INIT: Once = Once::new();

#[derive(Debug)]
struct TestEvent {
    id: i32,
    active: bool,
    data: [u8; 16],
    large_number: u64,
    description: String,
}

impl std::fmt::Display for TestEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event[id={}, active={}, data={:?}, large_number={}, desc={}]",
            self.id, self.active, self.data, self.large_number, self.description)
    }
}

impl Classify for TestEvent {
    fn shape() -> Shape {
        <(i32, bool, [u8; 16], u64, String) as Classify>::shape()
    }
}

impl Serialize for TestEvent {
    fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> binlog_core::Result<()> {
        self.id.serialize(ostream)?;
        self.active.serialize(ostream)?;
        self.data.serialize(ostream)?;
        self.large_number.serialize(ostream)?;
        self.description.serialize(ostream)
    }

    fn serialized_size(&self) -> usize {
        4 + 1 + 16 + 8 + self.description.serialized_size()
    }
}

fn test_event() -> TestEvent {
    TestEvent {
        id: 42,
        active: true,
        data: [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16],
        large_number: u64::MAX,
        description: "This is a longer description that includes some special characters !@#$%^&*() \
                    and provides more context about the event. It also contains some metrics like \
                    CPU: 95%, Memory: 2.5GB, Network: 1.2Gbps".to_string(),
    }
}

fn setup_log4rs(log_file: &Path) {
    LOGGER_INIT.call_once(|| {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{d} - {m}{n}")))
            .append(true)
            .build(log_file)
            .unwrap();

        let config = Config::builder()
            .appender(Appender::builder().build("logfile", Box::new(logfile)))
            .build(Root::builder().appender("logfile").build(LevelFilter::Info))
            .unwrap();

        log4rs::init_config(config).unwrap();
    });
}

fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Writes `ITERATIONS` records to a file in `dir` through the binary encoder.
fn binary_run(dir: &TempDir, event: &TestEvent) -> (Duration, u64) {
    let path = dir.path().join("binary.log");
    let mut sink = IoSink::new(BufWriter::new(File::create(&path).unwrap()));
    serialize(&calibrate(Duration::from_millis(1)), &mut sink).unwrap();

    let start = Instant::now();
    for i in 0..ITERATIONS {
        serialize(&(get_timestamp(), "Test perf", i as u64, event), &mut sink).unwrap();
    }
    sink.flush().unwrap();
    let elapsed = start.elapsed();

    drop(sink);
    (elapsed, file_size(&path))
}

/// Writes `ITERATIONS` formatted lines through log4rs.
fn traditional_run(log_file: &Path, event: &TestEvent) -> (Duration, u64) {
    setup_log4rs(log_file);
    let size_before = file_size(log_file);

    let start = Instant::now();
    for i in 0..ITERATIONS {
        info!("Test perf: iteration={}, event={}", i, event);
    }
    log::logger().flush();
    let elapsed = start.elapsed();

    (elapsed, file_size(log_file) - size_before)
}

fn run_comparison(dir: &TempDir, log_file: &Path) -> (Duration, Duration) {
    let event = test_event();

    let (binary_duration, binary_size) = binary_run(dir, &event);
    let (traditional_duration, traditional_size) = traditional_run(log_file, &event);

    println!("\nPerformance comparison ({} iterations):", ITERATIONS);
    println!("Binary logging: {:.3}ms", binary_duration.as_secs_f64() * 1000.0);
    println!("Traditional logging: {:.3}ms", traditional_duration.as_secs_f64() * 1000.0);
    println!("Binary log size: {:.3} MB", megabytes(binary_size));
    println!("Traditional log size: {:.3} MB", megabytes(traditional_size));
    println!("Speedup: {:.2}x", traditional_duration.as_secs_f64() / binary_duration.as_secs_f64());
    println!("Binary throughput: {:.2} million msgs/sec",
            ITERATIONS as f64 / binary_duration.as_secs_f64() / 1_000_000.0);

    (binary_duration, traditional_duration)
}

fn bench_encoding(c: &mut Criterion) {
    let event = test_event();
    let mut buffer = Vec::<u8>::with_capacity(1 << 20);

    c.bench_function("encode_record_in_memory", |b| {
        b.iter(|| {
            buffer.clear();
            serialize(&(get_timestamp(), "Test perf", 7u64, &event), &mut buffer).unwrap();
            black_box(buffer.len())
        })
    });
}

fn bench_logging_comparison(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let log_file = dir.path().join("traditional.log");

    let mut group = c.benchmark_group("Logging Comparison");
    group.sample_size(10); // Fewer samples due to I/O operations
    group.bench_function("binary_vs_traditional", |b| {
        b.iter(|| black_box(run_comparison(&dir, &log_file)))
    });
    group.finish();
}

criterion_group!(benches, bench_encoding, bench_logging_comparison);

fn main() {
    // One comparison with parseable output, for scripts/bench_stats.rs
    if env::var_os("SINGLE_ITERATION").is_some() {
        let dir = tempdir().unwrap();
        let log_file = dir.path().join("traditional.log");
        run_comparison(&dir, &log_file);
        return;
    }

    benches();
    Criterion::default().configure_from_args().final_summary();
}
