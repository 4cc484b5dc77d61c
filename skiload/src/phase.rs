//! Running a single phase: partitioning, launching workers and the two-step teardown.
use crate::error::{PhaseError, WorkerError};
use crate::issuer::{RequestIssuer, Target};
use crate::worker::Worker;
use async_channel::Sender;
use skiload_core::{Measurement, PhaseConfig, PhaseKind};
use std::sync::Arc;
use tokio::sync::{Barrier, Semaphore};
use tokio::task::{JoinError, JoinSet};
#[allow(unused)]
use tracing::{debug, error, info, info_span, instrument, trace, warn, Instrument};

/// Handed to each worker; consumed when the worker reports that it is done.
///
/// Dropping it unsignalled, because the worker failed or panicked, closes the completion
/// count so the threshold wait is interrupted instead of waiting forever.
pub(crate) struct CompletionSignal(Option<Arc<Semaphore>>);

impl CompletionSignal {
    pub fn new(completions: Arc<Semaphore>) -> Self {
        Self(Some(completions))
    }

    pub fn signal(mut self) {
        if let Some(completions) = self.0.take() {
            completions.add_permits(1);
        }
    }
}

impl Drop for CompletionSignal {
    fn drop(&mut self) {
        if let Some(completions) = self.0.take() {
            completions.close();
        }
    }
}

pub struct PhaseOrchestrator<T> {
    config: PhaseConfig,
    issuer: Arc<RequestIssuer<T>>,
    results: Sender<Measurement>,
}

impl<T> PhaseOrchestrator<T>
where
    T: Target + Sync + 'static,
{
    pub fn new(
        config: PhaseConfig,
        issuer: Arc<RequestIssuer<T>>,
        results: Sender<Measurement>,
    ) -> Self {
        Self {
            config,
            issuer,
            results,
        }
    }

    /// Spawn one worker per population range onto a pool sized to the phase.
    pub fn launch(self) -> RunningPhase {
        let PhaseOrchestrator {
            config,
            issuer,
            results,
        } = self;

        let span = info_span!("phase", id = config.id.id());
        let completions = Arc::new(Semaphore::new(0));
        // Every worker plus the orchestrator.
        let barrier = Arc::new(Barrier::new(config.worker_count + 1));

        let mut pool = JoinSet::new();
        for (index, skiers) in config.partition().into_iter().enumerate() {
            let worker = Worker {
                index,
                phase: config.id,
                skiers,
                window: config.window,
                repetition_factor: config.repetition_factor,
                issuer: issuer.clone(),
                results: results.clone(),
                completion: CompletionSignal::new(completions.clone()),
                barrier: barrier.clone(),
            };
            pool.spawn(worker.run().instrument(span.clone()));
        }

        span.in_scope(|| {
            info!(
                "Phase {} launched {} workers over {} skiers, window {}, factor {}.",
                config.id,
                config.worker_count,
                config.population,
                config.window,
                config.repetition_factor
            )
        });

        RunningPhase {
            id: config.id,
            threshold: config.completion_threshold,
            completions,
            barrier,
            pool,
            issued: 0,
        }
    }

    /// Launch, wait for the threshold and then for every worker.
    pub async fn run(self) -> Result<u64, PhaseError> {
        let mut running = self.launch();
        running.await_threshold().await?;
        running.finish().await
    }
}

/// A launched phase whose workers may still be issuing requests.
pub struct RunningPhase {
    id: PhaseKind,
    threshold: usize,
    completions: Arc<Semaphore>,
    barrier: Arc<Barrier>,
    pool: JoinSet<Result<u64, WorkerError>>,
    issued: u64,
}

impl RunningPhase {
    pub fn id(&self) -> PhaseKind {
        self.id
    }

    /// Block until `completion_threshold` workers have signalled completion.
    ///
    /// Fails if the wait is interrupted or any worker dies first. The pool is aborted on
    /// failure.
    #[instrument(name = "phase", skip_all, fields(id = self.id.id()))]
    pub async fn await_threshold(&mut self) -> Result<(), PhaseError> {
        if self.threshold == 0 {
            return Ok(());
        }

        let id = self.id;
        let threshold = self.threshold;
        let completions = self.completions.clone();

        tokio::select! {
            biased;

            permits = completions.acquire_many(threshold as u32) => match permits {
                Ok(permits) => permits.forget(),
                Err(_) => {
                    self.pool.abort_all();
                    error!("Phase {id} was interrupted before {threshold} workers finished.");
                    return Err(PhaseError::ThresholdInterrupted { phase: id, threshold });
                }
            },
            Some(joined) = self.pool.join_next() => {
                self.pool.abort_all();
                return Err(early_exit(id, joined));
            }
        }

        info!("Count down of phase {id} reached zero.");
        Ok(())
    }

    /// Wait at the phase barrier until every worker arrived, then release the pool.
    ///
    /// Returns the number of requests the phase issued.
    #[instrument(name = "phase", skip_all, fields(id = self.id.id()))]
    pub async fn finish(mut self) -> Result<u64, PhaseError> {
        let id = self.id;
        let barrier = self.barrier.clone();
        let arrived = barrier.wait();
        tokio::pin!(arrived);

        // Workers released by the barrier may be joined before our own wait completes.
        loop {
            tokio::select! {
                biased;

                _ = &mut arrived => break,
                Some(joined) = self.pool.join_next() => {
                    self.issued += worker_result(id, joined)?;
                }
            }
        }

        while let Some(joined) = self.pool.join_next().await {
            self.issued += worker_result(id, joined)?;
        }

        info!("Phase {id} has ended after {} requests.", self.issued);
        Ok(self.issued)
    }
}

fn worker_result(
    phase: PhaseKind,
    joined: Result<Result<u64, WorkerError>, JoinError>,
) -> Result<u64, PhaseError> {
    match joined {
        Ok(Ok(issued)) => Ok(issued),
        Ok(Err(err)) => Err(PhaseError::WorkerFailed {
            phase,
            reason: err.to_string(),
        }),
        Err(err) => Err(PhaseError::WorkerFailed {
            phase,
            reason: err.to_string(),
        }),
    }
}

// Workers only return after the barrier releases, so any exit before that is a failure.
fn early_exit(
    phase: PhaseKind,
    joined: Result<Result<u64, WorkerError>, JoinError>,
) -> PhaseError {
    match worker_result(phase, joined) {
        Ok(_) => PhaseError::WorkerFailed {
            phase,
            reason: "worker exited before the phase barrier".to_string(),
        },
        Err(err) => err,
    }
}
