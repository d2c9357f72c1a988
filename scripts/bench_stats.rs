use std::env;
use std::io::{self, Write};
use std::process::Command;
use std::time::Instant;

/// A metric printed by the perf_tests bench: (line prefix, unit suffix, report title).
const METRICS: [(&str, &str, &str); 4] = [
    ("Binary logging: ", "ms", "Binary Encoding Time (ms)"),
    ("Traditional logging: ", "ms", "Traditional Logging Time (ms)"),
    ("Binary log size: ", " MB", "Binary Log Size (MB)"),
    ("Traditional log size: ", " MB", "Traditional Log Size (MB)"),
];

fn main() -> io::Result<()> {
    let num_runs = env::args()
        .nth(1)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10);

    println!("Running benchmark {} times...", num_runs);

    let mut samples: Vec<Vec<f64>> = vec![Vec::with_capacity(num_runs); METRICS.len()];
    let mut speedups = Vec::with_capacity(num_runs);
    let mut size_ratios = Vec::with_capacity(num_runs);

    let start_time = Instant::now();

    for i in 1..=num_runs {
        print!("Run {}/{}... ", i, num_runs);
        io::stdout().flush()?;

        let output = Command::new("cargo")
            .args(["bench", "--bench", "perf_tests"])
            .env("SINGLE_ITERATION", "1")
            .output()?;

        if !output.status.success() {
            eprintln!("Benchmark failed on run {}", i);
            continue;
        }

        let output_str = String::from_utf8_lossy(&output.stdout);
        let parsed: Vec<Option<f64>> = METRICS
            .iter()
            .map(|(prefix, suffix, _)| parse_value(&output_str, prefix, suffix))
            .collect();

        for (metric, value) in samples.iter_mut().zip(&parsed) {
            metric.extend(*value);
        }

        if let [Some(binary), Some(traditional), ..] = parsed[..] {
            let speedup = traditional / binary;
            speedups.push(speedup);
            println!("Speedup: {:.2}x", speedup);
        } else {
            println!("no timings in output");
        }

        if let [_, _, Some(binary), Some(traditional)] = parsed[..] {
            size_ratios.push(traditional / binary);
        }
    }

    println!("\nCompleted {} runs in {:.2?}", speedups.len(), start_time.elapsed());
    println!("\n===== PERFORMANCE SUMMARY =====");

    for ((_, _, title), values) in METRICS.iter().zip(&samples) {
        report(title, values);
    }
    report("Speedup (Traditional/Binary)", &speedups);
    report("Size Ratio (Traditional/Binary)", &size_ratios);

    Ok(())
}

fn parse_value(text: &str, prefix: &str, suffix: &str) -> Option<f64> {
    text.lines()
        .find(|line| line.contains(prefix))
        .and_then(|line| {
            let start = line.find(prefix)? + prefix.len();
            let end = line[start..].find(suffix)?;
            line[start..start + end].trim().parse::<f64>().ok()
        })
}

struct Stats {
    min: f64,
    max: f64,
    mean: f64,
    median: f64,
    std_dev: f64,
}

fn calculate_stats(values: &[f64]) -> Option<Stats> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / count;
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    let variance = sorted.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count;

    Some(Stats {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean,
        median,
        std_dev: variance.sqrt(),
    })
}

fn report(title: &str, values: &[f64]) {
    let Some(stats) = calculate_stats(values) else {
        return;
    };

    let std_dev_percent = if stats.mean != 0.0 { stats.std_dev / stats.mean * 100.0 } else { 0.0 };

    println!("\n{}:", title);
    println!("  Min: {:.3}", stats.min);
    println!("  Max: {:.3}", stats.max);
    println!("  Mean: {:.3}", stats.mean);
    println!("  Median: {:.3}", stats.median);
    println!("  Std Dev: {:.3} ({:.2}% of mean)", stats.std_dev, std_dev_percent);
}
