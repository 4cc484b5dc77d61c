use std::ops::Range;

pub const DEFAULT_MAX_WORKERS: usize = 100;
pub const DEFAULT_SKIERS: u32 = 20_000;
pub const DEFAULT_LIFTS: u32 = 40;
pub const DEFAULT_RUNS_PER_DAY: u32 = 20;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "localhost";

/// Status code the target replies with when a lift ride was recorded.
pub const STATUS_CREATED: u16 = 201;

/// Status recorded when the target could not be reached at all.
pub const STATUS_BAD_REQUEST: u16 = 400;

/// Written in place of a status code when no response was ever obtained.
pub const UNSET_STATUS: i32 = -1;

/// The only request kind the generator issues.
pub const REQUEST_KIND: &str = "POST";

pub const RESORT_IDS: Range<u32> = 0..11;
pub const SEASON_IDS: Range<u32> = 2016..2020;
pub const DAY_IDS: Range<u32> = 1..366;

// Share of `runs_per_day` each worker repeats its range for, per phase.
pub const RAMP_UP_RUN_SHARE: f64 = 0.1;
pub const PEAK_RUN_SHARE: f64 = 0.8;
pub const COOL_DOWN_RUN_SHARE: f64 = 0.1;

/// Share of a phase's workers that must finish before the next phase starts.
pub const COMPLETION_SHARE: f64 = 0.1;

/// Ramp-up and cool-down run with `max_workers / QUARTER_DIVISOR` workers.
pub const QUARTER_DIVISOR: usize = 4;
