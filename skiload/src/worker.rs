use crate::error::WorkerError;
use crate::issuer::{RequestIssuer, Target};
use crate::phase::CompletionSignal;
use async_channel::Sender;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use skiload_core::{Measurement, PhaseKind, PopulationRange, TimeWindow};
use std::sync::Arc;
use tokio::sync::Barrier;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// One concurrent unit of a phase, owning a slice of the skier population.
pub(crate) struct Worker<T> {
    pub index: usize,
    pub phase: PhaseKind,
    pub skiers: PopulationRange,
    pub window: TimeWindow,
    pub repetition_factor: u32,
    pub issuer: Arc<RequestIssuer<T>>,
    pub results: Sender<Measurement>,
    pub completion: CompletionSignal,
    pub barrier: Arc<Barrier>,
}

impl<T> Worker<T>
where
    T: Target + Sync,
{
    /// Issue `repetition_factor` requests per skier in range, then signal completion and
    /// wait for the rest of the phase. Returns the number of requests issued.
    pub async fn run(self) -> Result<u64, WorkerError> {
        let Worker {
            index,
            phase,
            skiers,
            window,
            repetition_factor,
            issuer,
            results,
            completion,
            barrier,
        } = self;

        debug!("Worker {index} of phase {phase} has started on skiers {skiers}.");

        let mut rng = SmallRng::from_entropy();
        let mut issued = 0u64;
        for _ in 0..repetition_factor {
            for _ in 0..skiers.len() {
                let measurement = issuer.issue(&mut rng, skiers, window).await;
                results
                    .send(measurement)
                    .await
                    .map_err(|_| WorkerError::ResultsClosed)?;
                issued += 1;
            }
        }

        // Nothing may be pushed once completion is signalled.
        drop(results);
        debug!("Worker {index} of phase {phase} has ended after {issued} requests.");
        completion.signal();

        barrier.wait().await;
        Ok(issued)
    }
}
