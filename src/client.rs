use crate::aggregator::Funnel;
use crate::executor::Executor;
use crate::metrics::Metrics;
use crate::schedule::ClientHandle;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};
use url::Url;

// =============================================================================
// Simulated Client
// =============================================================================

/// Holds one slot in the active client gauge. Released on drop, so a client
/// aborted mid-request is still subtracted.
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn acquire(active: &Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::Relaxed);
        Self(Arc::clone(active))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// One logical connection: fires after its stagger delay, then once per
/// interval, until shutdown is signalled or the deadline has passed.
pub struct SimulatedClient {
    handle: ClientHandle,
    url: Arc<Url>,
    executor: Arc<dyn Executor>,
    funnel: Funnel,
    metrics: Metrics,
}

impl SimulatedClient {
    pub fn new(
        handle: ClientHandle,
        url: Arc<Url>,
        executor: Arc<dyn Executor>,
        funnel: Funnel,
        metrics: Metrics,
    ) -> Self {
        Self {
            handle,
            url,
            executor,
            funnel,
            metrics,
        }
    }

    /// Runs the fire loop and returns how many requests this client fired.
    ///
    /// Shutdown is only observed between requests; one already in flight
    /// completes and its result is still sent.
    pub async fn run(
        self,
        run_start: Instant,
        deadline: Instant,
        mut shutdown: broadcast::Receiver<()>,
    ) -> u64 {
        let id = self.handle.index;
        let mut ticker = interval_at(
            run_start + self.handle.start_delay,
            self.handle.fire_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let _active = ActiveGuard::acquire(&self.metrics.active_clients);
        debug!(
            "Client {} started (delay {:?}, interval {:?})",
            id, self.handle.start_delay, self.handle.fire_interval
        );

        let mut fired = 0u64;
        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    debug!("Client {} received shutdown signal", id);
                    break;
                }

                _ = ticker.tick() => {}
            }

            if Instant::now() >= deadline {
                debug!("Client {} reached deadline", id);
                break;
            }

            fired += 1;
            self.metrics.requests_fired.fetch_add(1, Ordering::Relaxed);

            match self.executor.execute(&self.url).await {
                Ok(result) => {
                    debug!("status: {} (client {})", result.status, id);
                    if !self.funnel.send(result).await {
                        warn!("Client {} result funnel closed", id);
                        break;
                    }
                }
                Err(e) => {
                    warn!("Client {} request failed: {}", id, e);
                    self.metrics
                        .transport_failures
                        .fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        debug!("Client {} stopped after {} requests", id, fired);

        fired
    }
}
