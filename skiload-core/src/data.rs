use crate::{REQUEST_KIND, UNSET_STATUS};
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Inclusive slice of the skier population owned by one worker of a phase.
///
/// An empty range is represented with `end == start - 1`, which only happens when a phase
/// has more workers than skiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationRange {
    pub start: u32,
    pub end: u32,
}

impl PopulationRange {
    pub fn len(&self) -> u64 {
        (u64::from(self.end) + 1).saturating_sub(u64::from(self.start))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }
}

impl fmt::Display for PopulationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Split `[1, population]` into `workers` contiguous ranges in worker order.
///
/// Every worker gets `population / workers` ids and the first `population % workers`
/// workers get one more, so e.g. 10 skiers over 3 workers yields `[1,4] [5,8] [9,10]`.
pub fn partition(population: u32, workers: usize) -> Vec<PopulationRange> {
    if workers == 0 {
        return vec![];
    }

    let workers_u64 = workers as u64;
    let population = u64::from(population);
    let base = population / workers_u64;
    let remainder = population % workers_u64;

    let mut next = 1u64;
    (0..workers_u64)
        .map(|idx| {
            let len = base + u64::from(idx < remainder);
            let range = PopulationRange {
                start: next as u32,
                end: (next + len - 1) as u32,
            };
            next += len;
            range
        })
        .collect()
}

/// Inclusive window of ride times ("minutes into the day") a phase draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: u32,
    pub end: u32,
}

impl TimeWindow {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: u32) -> bool {
        (self.start..=self.end).contains(&time)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Outcome of one request attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub issued_at_ms: i64,
    pub kind: &'static str,
    pub latency_ms: u64,
    /// `None` when the request failed before any status was obtained.
    pub status: Option<u16>,
}

impl Measurement {
    pub fn new(issued_at_ms: i64, latency: Duration, status: Option<u16>) -> Self {
        Self {
            issued_at_ms,
            kind: REQUEST_KIND,
            latency_ms: latency.as_millis() as u64,
            status,
        }
    }

    /// Status as persisted, with [`UNSET_STATUS`] standing in for a missing one.
    pub fn status_code(&self) -> i32 {
        self.status.map_or(UNSET_STATUS, i32::from)
    }
}
