use std::time::Duration;

// =============================================================================
// Errors
// =============================================================================

/// Rejected run parameters. Raised before any client starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("Connections must be at least 1")]
    NoConnections,

    #[error("RPS must be a positive finite number, got {0}")]
    InvalidRate(f64),

    #[error("Duration must be greater than zero")]
    ZeroDuration,

    #[error("Duration {0:?} is too long")]
    DurationTooLong(Duration),

    #[error("Request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("RPS {rps} is too high for {connections} connections")]
    RateTooHigh { rps: f64, connections: usize },
}

/// Failure of a single request. Never aborts a client loop.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregationError {
    #[error("No data: no requests completed during the run")]
    NoData,

    #[error("Result collector failed: {0}")]
    Collector(String),
}
