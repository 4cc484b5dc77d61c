use skiload_core::RunSummary;
use std::io::{self, Write};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Print the human readable summary and log it as a structured event.
pub fn report<W: Write>(summary: &RunSummary, mut out: W) -> io::Result<()> {
    match summary.latency {
        Some(latency) => info!(
            wall_clock_ms = summary.wall_clock_ms() as u64,
            success = summary.total_success,
            failure = summary.total_failure,
            throughput = summary.throughput_per_second,
            max_ms = latency.max,
            mean_ms = latency.mean,
            median_ms = latency.median,
            p99_ms = latency.p99,
            "Run complete."
        ),
        None => info!(
            wall_clock_ms = summary.wall_clock_ms() as u64,
            success = summary.total_success,
            failure = summary.total_failure,
            "Run complete without measurements."
        ),
    }

    writeln!(out, "{summary}")?;
    out.flush()
}
