use crate::aggregator::{self, RunStats};
use crate::client::SimulatedClient;
use crate::config::RunConfig;
use crate::error::{AggregationError, TransportError};
use crate::executor::{Executor, HttpExecutor};
use crate::metrics::Metrics;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval_at, sleep, sleep_until, Instant};
use tracing::{debug, error, info, warn};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

// =============================================================================
// Dispatcher
// =============================================================================

/// Owns one run: spawns a client per connection, holds the shared deadline and
/// shutdown signal, and finalizes the statistics once every client has stopped.
pub struct Dispatcher {
    config: RunConfig,
    executor: Arc<dyn Executor>,
    metrics: Metrics,
}

impl Dispatcher {
    pub fn new(config: RunConfig, executor: Arc<dyn Executor>) -> Self {
        Self {
            config,
            executor,
            metrics: Metrics::new(),
        }
    }

    pub fn with_http(config: RunConfig) -> Result<Self, TransportError> {
        let executor = HttpExecutor::new(config.connections(), config.timeout())?;
        Ok(Self::new(config, Arc::new(executor)))
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.clone()
    }

    pub async fn run(self) -> Result<RunStats, AggregationError> {
        let schedule = *self.config.schedule();

        info!(
            "Request start with rps {} and connections {}",
            self.config.rps(),
            self.config.connections()
        );
        info!(
            "Fire interval {:?}, stagger step {:?}, duration {:?}",
            schedule.fire_interval(),
            schedule.stagger_step(),
            self.config.duration()
        );

        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let (funnel, collector) = aggregator::funnel();
        let collector = tokio::spawn(collector.run());

        let url = Arc::new(self.config.url().clone());
        let run_start = Instant::now();
        let deadline = run_start + self.config.duration();

        let mut tasks = Vec::with_capacity(self.config.connections());
        for handle in schedule.handles() {
            let client = SimulatedClient::new(
                handle,
                Arc::clone(&url),
                Arc::clone(&self.executor),
                funnel.clone(),
                self.metrics.clone(),
            );
            let shutdown_rx = shutdown_tx.subscribe();
            tasks.push(tokio::spawn(client.run(run_start, deadline, shutdown_rx)));
        }

        // Only clients hold the funnel from here on.
        drop(funnel);

        let deadline_sleep = sleep_until(deadline);
        tokio::pin!(deadline_sleep);
        let mut progress = interval_at(run_start + PROGRESS_INTERVAL, PROGRESS_INTERVAL);

        loop {
            tokio::select! {
                _ = &mut deadline_sleep => break,
                _ = progress.tick() => {
                    info!(
                        "Progress: fired={}, active={}, transport_failures={}",
                        self.metrics.fired(),
                        self.metrics.active(),
                        self.metrics.failures()
                    );
                }
            }
        }

        info!("Deadline reached, stopping {} clients", tasks.len());
        shutdown_tx.send(()).ok();

        let grace = self.config.grace();
        let abort_handles: Vec<_> = tasks.iter().map(|t| t.abort_handle()).collect();

        tokio::select! {
            _ = sleep(grace) => {
                warn!(
                    "Grace period of {:?} elapsed with {} clients still in flight, aborting",
                    grace,
                    self.metrics.active()
                );
                for handle in &abort_handles {
                    handle.abort();
                }
            }
            results = join_all(tasks) => {
                let fired: u64 = results.iter().filter_map(|r| r.as_ref().ok()).sum();
                debug!("All clients stopped after firing {} requests", fired);
            }
        }

        let aggregator = collector.await.map_err(|e| {
            error!("Result collector failed: {}", e);
            AggregationError::Collector(e.to_string())
        })?;

        aggregator.finalize()
    }
}
