//! A phased load generator for lift ride ingestion services.
//!
//! A run is split into a ramp-up, a peak and a cool-down phase. Each phase partitions the
//! skier population across its workers, every worker posts synthetic lift rides for its
//! skiers, and the next phase starts as soon as a fraction of the current phase's workers
//! are done. Every request yields a [`Measurement`] which ends up in a [`RecordSink`] and in
//! the final [`RunSummary`].
//!
//! ```no_run
//! # async fn demo() -> Result<(), skiload::RunError> {
//! let config = skiload::RunConfig {
//!     max_workers: 32,
//!     ..Default::default()
//! };
//! let summary = skiload::run_to_file(&config, "lift_rides.csv").await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```
mod aggregator;
mod error;
mod issuer;
mod orchestrator;
mod phase;
mod prompt;
mod report;
mod sink;
mod worker;

#[cfg(test)]
mod testing;

pub use aggregator::{Aggregate, ResultAggregator};
pub use error::{PhaseError, RunError, SinkError};
pub use issuer::{HttpTarget, LiftRide, LocalTarget, RequestIssuer, RideBody, Target, TargetError};
pub use orchestrator::{RunOutcome, TestOrchestrator};
pub use phase::{PhaseOrchestrator, RunningPhase};
pub use prompt::{ask_for_params, Overrides};
pub use report::report;
pub use sink::{CsvSink, RecordSink};
pub use skiload_core::*;

use std::path::Path;
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Run every phase of `config` against `target`, writing each measurement to `sink`.
pub async fn run<T, S>(config: &RunConfig, target: T, sink: S) -> Result<RunSummary, RunError>
where
    T: Target + Sync + 'static,
    S: RecordSink,
{
    config.validate()?;
    let plan = Plan::from_config(config);
    run_plan(plan, config.lifts, target, sink).await
}

/// Like [`run`] for an explicit set of phases.
pub async fn run_plan<T, S>(
    plan: Plan,
    lifts: u32,
    target: T,
    sink: S,
) -> Result<RunSummary, RunError>
where
    T: Target + Sync + 'static,
    S: RecordSink,
{
    let outcome = TestOrchestrator::new(plan, target, lifts).run().await?;

    let mut aggregator = ResultAggregator::new(sink);
    let aggregate = aggregator.drain(outcome.results).await?;
    if aggregate.rows != outcome.success + outcome.failure {
        warn!(
            "Recorded {} measurements for {} requests.",
            aggregate.rows,
            outcome.success + outcome.failure
        );
    }

    Ok(RunSummary::new(
        aggregate.latency,
        outcome.success,
        outcome.failure,
        outcome.wall_clock,
    ))
}

/// Run against the HTTP service described by `config`, writing measurements as CSV to `path`.
#[instrument(skip_all, fields(url = tracing::field::Empty))]
pub async fn run_to_file(
    config: &RunConfig,
    path: impl AsRef<Path>,
) -> Result<RunSummary, RunError> {
    config.validate()?;
    let base_url = config.base_url()?;
    tracing::Span::current().record("url", base_url.as_str());

    let target = HttpTarget::new(base_url)?;
    let sink = CsvSink::create(path)?;
    run(config, target, sink).await
}
