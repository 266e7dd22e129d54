use crate::error::AggregationError;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

const FUNNEL_CAPACITY: usize = 10_000;
const STATUS_OK: u16 = 200;

// =============================================================================
// Data Structures
// =============================================================================

/// Outcome of one completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestResult {
    pub status: u16,
    pub latency: Duration,
}

impl RequestResult {
    pub fn new(status: u16, latency: Duration) -> Self {
        Self { status, latency }
    }

    pub fn is_error(&self) -> bool {
        self.status != STATUS_OK
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub request_count: u64,
    pub error_count: u64,
    pub mean_latency: Duration,
}

impl RunStats {
    pub fn mean_latency_ms(&self) -> f64 {
        self.mean_latency.as_micros() as f64 / 1000.0
    }
}

// =============================================================================
// Funnel
// =============================================================================

/// Sending half of the funnel. Cloned into every client.
#[derive(Debug, Clone)]
pub struct Funnel {
    tx: mpsc::Sender<RequestResult>,
}

impl Funnel {
    /// Returns false once the collector is gone.
    pub async fn send(&self, result: RequestResult) -> bool {
        self.tx.send(result).await.is_ok()
    }
}

/// Receiving half of the funnel. Drains into an [`Aggregator`].
#[derive(Debug)]
pub struct Collector {
    rx: mpsc::Receiver<RequestResult>,
    aggregator: Aggregator,
}

impl Collector {
    /// Runs until every [`Funnel`] clone has been dropped.
    pub async fn run(mut self) -> Aggregator {
        while let Some(result) = self.rx.recv().await {
            self.aggregator.record(result);
        }
        debug!(
            "Funnel closed after {} results",
            self.aggregator.results.len()
        );
        self.aggregator
    }
}

pub fn funnel() -> (Funnel, Collector) {
    let (tx, rx) = mpsc::channel(FUNNEL_CAPACITY);
    (
        Funnel { tx },
        Collector {
            rx,
            aggregator: Aggregator::default(),
        },
    )
}

// =============================================================================
// Aggregator
// =============================================================================

#[derive(Debug, Default)]
pub struct Aggregator {
    results: Vec<RequestResult>,
}

impl Aggregator {
    pub fn record(&mut self, result: RequestResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Computes the run statistics. Does not consume the collected results, so
    /// repeated calls return the same value.
    pub fn finalize(&self) -> Result<RunStats, AggregationError> {
        if self.results.is_empty() {
            return Err(AggregationError::NoData);
        }

        let mut error_count = 0u64;
        let mut latency_sum_us = 0u128;
        for result in &self.results {
            if result.is_error() {
                error_count += 1;
            }
            latency_sum_us += result.latency.as_micros();
        }

        let request_count = self.results.len() as u64;
        let mean_us = latency_sum_us / request_count as u128;

        Ok(RunStats {
            request_count,
            error_count,
            mean_latency: Duration::from_micros(mean_us as u64),
        })
    }
}
