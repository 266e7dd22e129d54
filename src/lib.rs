//! Controlled-rate concurrent HTTP load generator.
//!
//! A [`Dispatcher`] turns a target rate and a connection count into a
//! [`Schedule`], runs one [`SimulatedClient`] per connection until a shared
//! deadline, and funnels every completed request into an [`Aggregator`] that
//! computes [`RunStats`] once the run is over.

pub mod aggregator;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod schedule;

pub use aggregator::{Aggregator, RequestResult, RunStats};
pub use client::SimulatedClient;
pub use config::{Config, RunConfig};
pub use dispatcher::Dispatcher;
pub use error::{AggregationError, ConfigError, TransportError};
pub use executor::{Executor, HttpExecutor};
pub use metrics::{Metrics, Summary};
pub use schedule::{ClientHandle, Schedule};
