use crate::error::ConfigError;
use crate::schedule::Schedule;
use clap::Parser;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

pub const USAGE: &str =
    "usage: http-loadgen --url <URL> --connections <CONNECTIONS> --rps <RPS> --duration <DURATION>";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_GRACE: Duration = Duration::from_secs(5);
// Slack for the instant the run actually starts at.
const DEADLINE_HEADROOM: Duration = Duration::from_secs(24 * 60 * 60);

// =============================================================================
// Command Line
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "http-loadgen")]
#[command(about = "Controlled-rate concurrent HTTP load generator", long_about = None)]
pub struct Config {
    /// URL to send GET requests to
    #[arg(long, env = "TARGET_URL")]
    pub url: String,

    /// Number of simulated clients
    #[arg(long, env = "CONNECTIONS")]
    pub connections: usize,

    /// Aggregate target requests per second across all clients
    #[arg(long, env = "RPS")]
    pub rps: f64,

    /// Run duration in seconds
    #[arg(long, env = "DURATION")]
    pub duration: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "30")]
    pub timeout: u64,

    /// Seconds to wait for in-flight requests after the deadline
    #[arg(long, env = "GRACE_PERIOD", default_value = "5")]
    pub grace: u64,

    /// Print the final statistics as JSON on stdout
    #[arg(long, env = "JSON_OUTPUT")]
    pub json: bool,
}

impl Config {
    pub fn into_run_config(self) -> Result<RunConfig, ConfigError> {
        if self.timeout == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(RunConfig::new(
            &self.url,
            self.connections,
            self.rps,
            Duration::from_secs(self.duration),
        )?
        .with_timeout(Duration::from_secs(self.timeout))
        .with_grace(Duration::from_secs(self.grace)))
    }
}

// =============================================================================
// Run Parameters
// =============================================================================

/// Validated, immutable parameters for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    url: Url,
    connections: usize,
    rps: f64,
    duration: Duration,
    timeout: Duration,
    grace: Duration,
    schedule: Schedule,
}

impl RunConfig {
    pub fn new(
        url: &str,
        connections: usize,
        rps: f64,
        duration: Duration,
    ) -> Result<Self, ConfigError> {
        let parsed = Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        if duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        // The run deadline is computed as `Instant + duration`.
        let deadline = Instant::now()
            .checked_add(duration)
            .and_then(|d| d.checked_add(DEADLINE_HEADROOM));
        if deadline.is_none() {
            return Err(ConfigError::DurationTooLong(duration));
        }

        let schedule = Schedule::compute(connections, rps)?;

        Ok(Self {
            url: parsed,
            connections,
            rps,
            duration,
            timeout: DEFAULT_TIMEOUT,
            grace: DEFAULT_GRACE,
            schedule,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn connections(&self) -> usize {
        self.connections
    }

    pub fn rps(&self) -> f64 {
        self.rps
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = RunConfig::new("http://localhost:8080/", 2, 10.0, Duration::from_secs(1))
            .unwrap();
        assert_eq!(config.connections(), 2);
        assert_eq!(config.url().as_str(), "http://localhost:8080/");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.grace(), DEFAULT_GRACE);
        assert_eq!(config.schedule().fire_interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_rejects_bad_url() {
        let err = RunConfig::new("not a url", 1, 1.0, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));

        let err = RunConfig::new("ftp://example.com", 1, 1.0, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(s) if s == "ftp"));
    }

    #[test]
    fn test_rejects_zero_values() {
        let url = "http://localhost/";
        assert!(matches!(
            RunConfig::new(url, 0, 1.0, Duration::from_secs(1)),
            Err(ConfigError::NoConnections)
        ));
        assert!(matches!(
            RunConfig::new(url, 1, 0.0, Duration::from_secs(1)),
            Err(ConfigError::InvalidRate(_))
        ));
        assert!(matches!(
            RunConfig::new(url, 1, f64::NAN, Duration::from_secs(1)),
            Err(ConfigError::InvalidRate(_))
        ));
        assert!(matches!(
            RunConfig::new(url, 1, 1.0, Duration::ZERO),
            Err(ConfigError::ZeroDuration)
        ));
    }

    #[test]
    fn test_cli_flags() {
        let config = Config::try_parse_from([
            "http-loadgen",
            "--url",
            "http://127.0.0.1:3000/",
            "--connections",
            "4",
            "--rps",
            "20",
            "--duration",
            "3",
        ])
        .unwrap();
        assert_eq!(config.timeout, 30);
        assert_eq!(config.grace, 5);
        assert!(!config.json);

        let run = config.into_run_config().unwrap();
        assert_eq!(run.connections(), 4);
        assert_eq!(run.duration(), Duration::from_secs(3));
    }

    #[test]
    fn test_rejects_unrepresentable_duration() {
        let err = RunConfig::new("http://localhost/", 1, 1.0, Duration::MAX).unwrap_err();
        assert!(matches!(err, ConfigError::DurationTooLong(_)));

        let config = Config::try_parse_from([
            "http-loadgen",
            "--url",
            "http://127.0.0.1:3000/",
            "--connections",
            "1",
            "--rps",
            "1",
            "--duration",
            "18446744073709551615",
        ])
        .unwrap();
        assert!(matches!(
            config.into_run_config(),
            Err(ConfigError::DurationTooLong(_))
        ));
    }

    #[test]
    fn test_cli_rejects_zero_timeout() {
        let config = Config::try_parse_from([
            "http-loadgen",
            "--url",
            "http://127.0.0.1:3000/",
            "--connections",
            "1",
            "--rps",
            "1",
            "--duration",
            "1",
            "--timeout",
            "0",
        ])
        .unwrap();
        assert!(matches!(config.into_run_config(), Err(ConfigError::ZeroTimeout)));
    }
}
