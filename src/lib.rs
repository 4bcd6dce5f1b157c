//! Memcache Checker
//!
//! Health checking and reporting for a memcached server farm:
//! - **Stats Retrieval**: Per-host `stats` via the `memcache` crate, behind a trait
//! - **Derived Metrics**: Fill percent, get rate and hit rate with explicit "no data" handling
//! - **Partial-Failure Isolation**: One unreachable host never hides the others
//! - **Severity Roll-Up**: Worst host decides the farm's `OK`/`WARNING`/`CRITICAL`/`UNKNOWN`
//! - **Reports**: Terminal text, Nagios-style plugin line, or JSON
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use memcache_checker::{Endpoint, FarmCheckBuilder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let farm = FarmCheckBuilder::new().build()?;
//!
//!     let result = farm
//!         .run_farm(&[Endpoint::new("localhost", 11211), Endpoint::new("localhost", 11212)])
//!         .await;
//!
//!     for outcome in &result.outcomes {
//!         tracing::info!("{}: {}", outcome.endpoint(), outcome.severity());
//!     }
//!     std::process::exit(result.exit_code());
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! EndpointProvider → FarmAggregator ─┬→ HostChecker → StatsConnector (memcached)
//!                                    │        ↓
//!                                    │   stats::derive
//!                                    ↓
//!                               FarmResult → Reporter
//! ```

pub mod backends;
pub mod builder;
pub mod checker;
pub mod endpoint;
pub mod farm;
pub mod report;
pub mod severity;
pub mod stats;
pub mod traits;

#[cfg(feature = "backend-memcached")]
pub use backends::MemcachedConnector;

pub use builder::FarmCheckBuilder;
pub use checker::{FailureReason, HostChecker, HostOutcome};
pub use endpoint::{
    BackendUrl, DEFAULT_PORT, Endpoint, EndpointError, EndpointProvider, EnvEndpoints,
    StaticEndpoints,
};
pub use farm::{CheckConfig, FarmAggregator, FarmError, FarmResult};
pub use report::{ReportFormat, ReportOptions, Reporter};
pub use severity::Severity;
pub use stats::{DerivedMetrics, MalformedStats, RawStats, StatCounters, derive};
pub use traits::{ClientError, StatsConnector, StatsHandle};

// Re-export async_trait for implementors of the client traits
pub use async_trait::async_trait;
