//! Interactive collection of run parameters.
use skiload_core::{ConfigError, RunConfig};
use std::fmt::Display;
use std::io::{BufRead, Write};
use std::num::ParseIntError;
use std::str::FromStr;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Values already decided on the command line; these are not asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub max_workers: Option<usize>,
    pub skiers: Option<u32>,
    pub lifts: Option<u32>,
    pub runs_per_day: Option<u32>,
    pub port: Option<u16>,
}

impl Overrides {
    /// Apply without asking anything.
    pub fn apply(&self, mut config: RunConfig) -> RunConfig {
        if let Some(v) = self.max_workers {
            config.max_workers = v;
        }
        if let Some(v) = self.skiers {
            config.skiers = v;
        }
        if let Some(v) = self.lifts {
            config.lifts = v;
        }
        if let Some(v) = self.runs_per_day {
            config.runs_per_day = v;
        }
        if let Some(v) = self.port {
            config.port = v;
        }
        config
    }
}

/// Ask for every parameter not covered by `overrides`, one line each.
///
/// An empty line or end of input keeps the value already in `config`.
pub fn ask_for_params<R, W>(
    mut input: R,
    mut output: W,
    config: RunConfig,
    overrides: &Overrides,
) -> Result<RunConfig, ConfigError>
where
    R: BufRead,
    W: Write,
{
    let mut config = overrides.apply(config);

    if overrides.max_workers.is_none() {
        config.max_workers = ask(
            &mut input,
            &mut output,
            "max_workers",
            format!(
                "What is the maximum number of threads? (default {}, max 256)",
                config.max_workers
            ),
            config.max_workers,
        )?;
    }
    if overrides.skiers.is_none() {
        config.skiers = ask(
            &mut input,
            &mut output,
            "skiers",
            format!(
                "What is the number of skiers? (default {}, max 50000)",
                config.skiers
            ),
            config.skiers,
        )?;
    }
    if overrides.lifts.is_none() {
        config.lifts = ask(
            &mut input,
            &mut output,
            "lifts",
            format!(
                "What is the number of ski lifts? (range 5-60, default {})",
                config.lifts
            ),
            config.lifts,
        )?;
    }
    if overrides.runs_per_day.is_none() {
        config.runs_per_day = ask(
            &mut input,
            &mut output,
            "runs_per_day",
            format!(
                "What is the mean numbers of ski lifts each skier rides each day? (numRuns - default {}, max 20)",
                config.runs_per_day
            ),
            config.runs_per_day,
        )?;
    }
    if overrides.port.is_none() {
        config.port = ask(
            &mut input,
            &mut output,
            "port",
            format!("What is the port number? (default {})", config.port),
            config.port,
        )?;
    }

    debug!(
        "Run parameters: {} workers, {} skiers, {} lifts, {} runs, port {}.",
        config.max_workers, config.skiers, config.lifts, config.runs_per_day, config.port
    );
    Ok(config)
}

fn ask<T, R, W>(
    input: &mut R,
    output: &mut W,
    field: &'static str,
    question: impl Display,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr<Err = ParseIntError>,
    R: BufRead,
    W: Write,
{
    writeln!(output, "{question}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();
    if answer.is_empty() {
        return Ok(default);
    }

    answer.parse().map_err(|source| ConfigError::Parse {
        field,
        value: answer.to_string(),
        source,
    })
}
