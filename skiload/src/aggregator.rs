//! Draining the result channel into a sink and latency statistics.
use crate::error::SinkError;
use crate::sink::RecordSink;
use async_channel::Receiver;
use skiload_core::{LatencyStats, Measurement};
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Everything the aggregator learned from one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub rows: u64,
    pub latency: Option<LatencyStats>,
}

pub struct ResultAggregator<S> {
    sink: S,
}

impl<S: RecordSink> ResultAggregator<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Consume measurements until every producer has dropped its sender.
    #[instrument(name = "aggregator", skip_all)]
    pub async fn drain(&mut self, results: Receiver<Measurement>) -> Result<Aggregate, SinkError> {
        let mut latencies = Vec::with_capacity(results.len());

        while let Ok(measurement) = results.recv().await {
            self.sink.write(&measurement)?;
            latencies.push(measurement.latency_ms);
        }
        self.sink.flush()?;

        let rows = latencies.len() as u64;
        debug!("Wrote {rows} measurements.");

        Ok(Aggregate {
            rows,
            latency: LatencyStats::from_latencies(&latencies),
        })
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
