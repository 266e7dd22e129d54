use crate::aggregator::RequestResult;
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(100);

// =============================================================================
// Executor
// =============================================================================

/// Issues one request and reports its status and latency.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, url: &Url) -> Result<RequestResult, TransportError>;
}

/// GET executor backed by a shared reqwest connection pool.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    timeout: Duration,
}

impl HttpExecutor {
    pub fn new(connections: usize, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(connections)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .build()?;

        Ok(Self { client, timeout })
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Request(err)
        }
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(&self, url: &Url) -> Result<RequestResult, TransportError> {
        let start = Instant::now();

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();

        // Latency includes the full body transfer.
        loop {
            match response.chunk().await {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) if e.is_timeout() => return Err(TransportError::Timeout(self.timeout)),
                Err(e) => return Err(TransportError::Body(e)),
            }
        }

        Ok(RequestResult::new(status, start.elapsed()))
    }
}
