use crate::{
    partition, PopulationRange, RunConfig, TimeWindow, COMPLETION_SHARE, COOL_DOWN_RUN_SHARE,
    PEAK_RUN_SHARE, QUARTER_DIVISOR, RAMP_UP_RUN_SHARE,
};
use std::fmt;

pub const RAMP_UP_WINDOW: TimeWindow = TimeWindow::new(1, 90);
pub const PEAK_WINDOW: TimeWindow = TimeWindow::new(91, 360);
pub const COOL_DOWN_WINDOW: TimeWindow = TimeWindow::new(361, 420);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    RampUp,
    Peak,
    CoolDown,
}

impl PhaseKind {
    pub fn id(&self) -> u8 {
        match self {
            PhaseKind::RampUp => 1,
            PhaseKind::Peak => 2,
            PhaseKind::CoolDown => 3,
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseKind::RampUp => "ramp-up",
            PhaseKind::Peak => "peak",
            PhaseKind::CoolDown => "cool-down",
        };
        f.write_str(name)
    }
}

/// Where a run currently is: `RampUp -> Peak -> CoolDown -> Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RampUp,
    Peak,
    CoolDown,
    Done,
}

impl From<PhaseKind> for Stage {
    fn from(kind: PhaseKind) -> Self {
        match kind {
            PhaseKind::RampUp => Stage::RampUp,
            PhaseKind::Peak => Stage::Peak,
            PhaseKind::CoolDown => Stage::CoolDown,
        }
    }
}

/// Immutable description of one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseConfig {
    pub id: PhaseKind,
    pub population: u32,
    pub worker_count: usize,
    pub window: TimeWindow,
    pub repetition_factor: u32,
    /// Number of finished workers after which the next phase may start. Never more than
    /// `worker_count`.
    pub completion_threshold: usize,
}

impl PhaseConfig {
    pub fn new(
        id: PhaseKind,
        population: u32,
        worker_count: usize,
        window: TimeWindow,
        repetition_factor: u32,
    ) -> Self {
        let threshold = (worker_count as f64 * COMPLETION_SHARE).ceil() as usize;
        Self {
            id,
            population,
            worker_count,
            window,
            repetition_factor,
            completion_threshold: threshold.max(1).min(worker_count),
        }
    }

    pub fn with_completion_threshold(mut self, threshold: usize) -> Self {
        self.completion_threshold = threshold.min(self.worker_count);
        self
    }

    pub fn partition(&self) -> Vec<PopulationRange> {
        partition(self.population, self.worker_count)
    }

    /// Requests this phase issues in total, one per skier per repetition.
    pub fn expected_requests(&self) -> u64 {
        self.partition()
            .iter()
            .map(|range| range.len() * u64::from(self.repetition_factor))
            .sum()
    }
}

/// The ordered phases of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    phases: Vec<PhaseConfig>,
}

impl Plan {
    pub fn new(phases: Vec<PhaseConfig>) -> Self {
        Self { phases }
    }

    /// Ramp-up on a quarter of the workers, peak on all of them, cool-down on a quarter.
    pub fn from_config(config: &RunConfig) -> Self {
        let quarter = (config.max_workers / QUARTER_DIVISOR).max(1);
        let runs = config.runs_per_day;

        Self::new(vec![
            PhaseConfig::new(
                PhaseKind::RampUp,
                config.skiers,
                quarter,
                RAMP_UP_WINDOW,
                run_share(runs, RAMP_UP_RUN_SHARE),
            ),
            PhaseConfig::new(
                PhaseKind::Peak,
                config.skiers,
                config.max_workers,
                PEAK_WINDOW,
                run_share(runs, PEAK_RUN_SHARE),
            ),
            PhaseConfig::new(
                PhaseKind::CoolDown,
                config.skiers,
                quarter,
                COOL_DOWN_WINDOW,
                run_share(runs, COOL_DOWN_RUN_SHARE),
            ),
        ])
    }

    pub fn phases(&self) -> &[PhaseConfig] {
        &self.phases
    }

    pub fn total_requests(&self) -> u64 {
        self.phases.iter().map(PhaseConfig::expected_requests).sum()
    }
}

fn run_share(runs: u32, share: f64) -> u32 {
    ((f64::from(runs) * share) as u32).max(1)
}
