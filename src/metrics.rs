use crate::aggregator::RunStats;
use crate::error::AggregationError;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{error, info};

// =============================================================================
// Live Counters
// =============================================================================

/// Counters updated by clients while the run is in progress.
#[derive(Clone, Default)]
pub struct Metrics {
    pub requests_fired: Arc<AtomicU64>,
    pub transport_failures: Arc<AtomicU64>,
    pub active_clients: Arc<AtomicUsize>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fired(&self) -> u64 {
        self.requests_fired.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.transport_failures.load(Ordering::Relaxed)
    }

    pub fn active(&self) -> usize {
        self.active_clients.load(Ordering::Relaxed)
    }

    pub fn summary(&self, stats: &Result<RunStats, AggregationError>) -> Summary {
        match stats {
            Ok(stats) => Summary {
                request_count: stats.request_count,
                error_count: stats.error_count,
                transport_failures: self.failures(),
                mean_latency_ms: Some(stats.mean_latency_ms()),
                error: None,
            },
            Err(AggregationError::NoData) => Summary {
                request_count: 0,
                error_count: 0,
                transport_failures: self.failures(),
                mean_latency_ms: None,
                error: None,
            },
            Err(e @ AggregationError::Collector(_)) => Summary {
                request_count: 0,
                error_count: 0,
                transport_failures: self.failures(),
                mean_latency_ms: None,
                error: Some(e.to_string()),
            },
        }
    }

    pub fn print_summary(&self, stats: &Result<RunStats, AggregationError>) {
        info!("╔════════════════════════════════════════════════════════════╗");
        info!("║                      LOAD TEST SUMMARY                     ║");
        info!("╚════════════════════════════════════════════════════════════╝");

        info!("");
        info!("Requests:");
        info!("  Fired:               {}", self.fired());
        info!("  Transport Failures:  {}", self.failures());

        info!("");
        match stats {
            Ok(stats) => {
                info!("  RequestCount:        {}", stats.request_count);
                info!("  ErrorCount:          {}", stats.error_count);
                info!("  MeanResponseTime:    {:.2}ms", stats.mean_latency_ms());
            }
            Err(AggregationError::NoData) => {
                info!("  No data");
            }
            Err(e) => {
                error!("  {}", e);
            }
        }

        info!("");
        info!("═══════════════════════════════════════════════════════════");
    }
}

// =============================================================================
// Report
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub request_count: u64,
    pub error_count: u64,
    pub transport_failures: u64,
    pub mean_latency_ms: Option<f64>,
    /// Set when the run failed for a reason other than an empty result set.
    pub error: Option<String>,
}

impl Summary {
    pub fn to_json(&self) -> Result<String, sonic_rs::Error> {
        sonic_rs::to_string(self)
    }
}
