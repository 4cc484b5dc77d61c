//! Running the phases of a run back to back.
use crate::error::PhaseError;
use crate::issuer::{RequestIssuer, Target};
use crate::phase::{PhaseOrchestrator, RunningPhase};
use async_channel::{Receiver, Sender};
use skiload_core::{Measurement, Plan, RunCounters, Stage};
use std::sync::Arc;
use std::time::{Duration, Instant};
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn};

/// What is left once every phase barrier has cleared.
pub struct RunOutcome {
    pub wall_clock: Duration,
    pub success: u64,
    pub failure: u64,
    /// Stages in the order the run entered them, ending with [`Stage::Done`].
    pub transitions: Vec<Stage>,
    /// Every measurement of the run; no producer is left.
    pub results: Receiver<Measurement>,
}

/// Owns the result channel and the run counters for the whole run.
pub struct TestOrchestrator<T> {
    plan: Plan,
    issuer: Arc<RequestIssuer<T>>,
    results_tx: Sender<Measurement>,
    results_rx: Receiver<Measurement>,
}

impl<T> TestOrchestrator<T>
where
    T: Target + Sync + 'static,
{
    pub fn new(plan: Plan, target: T, lifts: u32) -> Self {
        let counters = Arc::new(RunCounters::new());
        // Sized to the whole run: the consumer only starts draining once every phase is done.
        let capacity = plan.total_requests().max(1) as usize;
        let (results_tx, results_rx) = async_channel::bounded(capacity);

        Self {
            plan,
            issuer: Arc::new(RequestIssuer::new(target, counters, lifts)),
            results_tx,
            results_rx,
        }
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn counters(&self) -> Arc<RunCounters> {
        self.issuer.counters().clone()
    }

    /// Each phase starts once the previous one reached its completion threshold. The
    /// phases still running are then torn down last-first, so the final phase's barrier
    /// clears before the run is done and no worker outlives the run.
    #[instrument(name = "run", skip_all)]
    pub async fn run(self) -> Result<RunOutcome, PhaseError> {
        let TestOrchestrator {
            plan,
            issuer,
            results_tx,
            results_rx,
        } = self;

        info!(
            "Starting run of {} phases, {} requests in total.",
            plan.phases().len(),
            plan.total_requests()
        );

        let start = Instant::now();
        let mut transitions = vec![];
        let mut running: Vec<RunningPhase> = vec![];

        for phase in plan.phases() {
            let stage = Stage::from(phase.id);
            transitions.push(stage);
            info!("Test phase {} initiated.", phase.id);

            let mut launched =
                PhaseOrchestrator::new(phase.clone(), issuer.clone(), results_tx.clone()).launch();
            launched.await_threshold().await?;
            running.push(launched);
        }
        drop(results_tx);

        while let Some(phase) = running.pop() {
            let id = phase.id();
            phase.finish().await?;
            debug!("Execution pool of phase {id} released.");
        }
        transitions.push(Stage::Done);

        let wall_clock = start.elapsed();
        let counters = issuer.counters();
        info!("All phases finished in {}ms.", wall_clock.as_millis());

        Ok(RunOutcome {
            wall_clock,
            success: counters.success(),
            failure: counters.failure(),
            transitions,
            results: results_rx,
        })
    }
}
