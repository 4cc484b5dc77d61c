use std::fmt;
use std::time::Duration;

/// Order statistics over every latency recorded in a run, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    pub max: u64,
    pub mean: u64,
    pub median: u64,
    pub p99: u64,
}

impl LatencyStats {
    /// Returns `None` for an empty run.
    ///
    /// The median is the element at `len / 2` and p99 the element at `floor(len * 0.99)` of
    /// the ascending sequence; the mean uses integer division.
    pub fn from_latencies(latencies: &[u64]) -> Option<Self> {
        if latencies.is_empty() {
            return None;
        }

        let mut sorted = latencies.to_vec();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u128 = sorted.iter().map(|l| u128::from(*l)).sum();
        let p99_idx = ((count as f64 * 0.99) as usize).min(count - 1);

        Some(Self {
            max: sorted[count - 1],
            mean: (sum / count as u128) as u64,
            median: sorted[count / 2],
            p99: sorted[p99_idx],
        })
    }
}

/// Final report of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub latency: Option<LatencyStats>,
    pub total_success: u64,
    pub total_failure: u64,
    pub wall_clock: Duration,
    pub throughput_per_second: f64,
}

impl RunSummary {
    pub fn new(
        latency: Option<LatencyStats>,
        total_success: u64,
        total_failure: u64,
        wall_clock: Duration,
    ) -> Self {
        let secs = wall_clock.as_secs_f64();
        let throughput_per_second = if secs > 0. {
            total_success as f64 / secs
        } else {
            0.
        };

        Self {
            latency,
            total_success,
            total_failure,
            wall_clock,
            throughput_per_second,
        }
    }

    pub fn wall_clock_ms(&self) -> u128 {
        self.wall_clock.as_millis()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Drop sub-millisecond noise from the human readable form.
        let rounded = Duration::from_millis(self.wall_clock.as_millis() as u64);
        writeln!(
            f,
            "Wall time: {}ms ({})",
            self.wall_clock_ms(),
            humantime::format_duration(rounded)
        )?;
        writeln!(f, "Successful requests: {}", self.total_success)?;
        writeln!(f, "Unsuccessful requests: {}", self.total_failure)?;
        writeln!(f, "Throughput: {:.2} requests/s", self.throughput_per_second)?;
        match self.latency {
            Some(stats) => {
                writeln!(f, "Max latency: {}ms", stats.max)?;
                writeln!(f, "Mean latency: {}ms", stats.mean)?;
                writeln!(f, "Median latency: {}ms", stats.median)?;
                write!(f, "p99 latency: {}ms", stats.p99)
            }
            None => write!(f, "Latency: n/a (no requests recorded)"),
        }
    }
}
