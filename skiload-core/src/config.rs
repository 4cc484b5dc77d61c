use crate::{
    DEFAULT_HOST, DEFAULT_LIFTS, DEFAULT_MAX_WORKERS, DEFAULT_PORT, DEFAULT_RUNS_PER_DAY,
    DEFAULT_SKIERS,
};
use std::num::ParseIntError;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid integer {value:?} for {field}")]
    Parse {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },

    #[error("Invalid target url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Unable to read parameters: {0}")]
    Io(#[from] std::io::Error),
}

/// Parameters for a single run.
///
/// Built once before the first phase starts and shared read-only with every component
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Worker count of the peak phase. Ramp-up and cool-down use a quarter of it.
    pub max_workers: usize,
    /// Size of the skier population partitioned across the workers of every phase.
    pub skiers: u32,
    /// Lift ids are drawn from `0..lifts`.
    pub lifts: u32,
    /// Mean number of lift rides per skier per day; scales each phase's repetitions.
    pub runs_per_day: u32,
    pub port: u16,
    pub host: String,
    /// Path prefix the target service is mounted under, e.g. `/skiers-api`.
    pub base_path: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            skiers: DEFAULT_SKIERS,
            lifts: DEFAULT_LIFTS,
            runs_per_day: DEFAULT_RUNS_PER_DAY,
            port: DEFAULT_PORT,
            host: DEFAULT_HOST.to_string(),
            base_path: String::new(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(invalid("max_workers"));
        }
        if self.skiers == 0 {
            return Err(invalid("skiers"));
        }
        if self.lifts == 0 {
            return Err(invalid("lifts"));
        }
        if self.runs_per_day == 0 {
            return Err(invalid("runs_per_day"));
        }
        Ok(())
    }

    /// Base url every request path is appended to, without a trailing slash.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        let url = Url::parse(&format!(
            "http://{}:{}{}",
            self.host,
            self.port,
            normalize_base_path(&self.base_path)
        ))?;
        Ok(url.as_str().trim_end_matches('/').to_string())
    }
}

/// `base_path` with exactly one leading `/` and no trailing one; empty stays empty.
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn invalid(field: &'static str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: "must be at least 1",
    }
}
