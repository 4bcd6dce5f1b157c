//! Farm Aggregator - Multi-Host Roll-Up
//!
//! Runs a [`HostChecker`] over every endpoint and reduces the per-host
//! outcomes to one overall [`Severity`]: the worst host decides.
//!
//! ```text
//! endpoints ─┬─ check(A) ─┐
//!            ├─ check(B) ─┼─ outcomes (input order) ─ max(severity) ─ FarmResult
//!            └─ check(C) ─┘
//! ```

use futures_util::stream::{self, StreamExt};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::checker::{DEFAULT_TIMEOUT, HostChecker, HostOutcome};
use crate::endpoint::{Endpoint, EndpointError, EndpointProvider};
use crate::severity::Severity;
use crate::traits::StatsConnector;

/// Default number of hosts checked at the same time
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Farm-level conditions that leave nothing to check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FarmError {
    #[error("No server specified!")]
    NoEndpoints,

    #[error("could not resolve servers: {0}")]
    Endpoints(#[from] EndpointError),
}

impl FarmError {
    pub fn severity(&self) -> Severity {
        Severity::FAILED
    }
}

impl Serialize for FarmError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Tuning for a farm check run
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Bound on each connect and each stats call
    pub timeout: Duration,

    /// Maximum hosts in flight at once (values below 1 are treated as 1)
    pub max_concurrency: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// Everything one run found out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmResult {
    /// One outcome per endpoint, in input order
    pub outcomes: Vec<HostOutcome>,
    pub overall_severity: Severity,
    /// Set when there was nothing to check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FarmError>,
}

impl FarmResult {
    /// Roll up per-host outcomes; an empty list counts as [`FarmError::NoEndpoints`]
    pub fn from_outcomes(outcomes: Vec<HostOutcome>) -> Self {
        match Severity::worst(outcomes.iter().map(HostOutcome::severity)) {
            Some(overall_severity) => Self {
                outcomes,
                overall_severity,
                error: None,
            },
            None => Self::from_error(FarmError::NoEndpoints),
        }
    }

    pub fn from_error(error: FarmError) -> Self {
        Self {
            outcomes: Vec::new(),
            overall_severity: error.severity(),
            error: Some(error),
        }
    }

    /// Process exit code for this result
    pub fn exit_code(&self) -> i32 {
        self.overall_severity.exit_code()
    }

    pub fn failed_hosts(&self) -> impl Iterator<Item = &HostOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }
}

/// Checks a whole farm
///
/// # Example
///
/// ```rust,no_run
/// use memcache_checker::backends::MemcachedConnector;
/// use memcache_checker::{BackendUrl, FarmAggregator};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let farm = FarmAggregator::new(Arc::new(MemcachedConnector::new()));
///     let result = farm.run(&BackendUrl::new("memcached://localhost:11211/")).await;
///     std::process::exit(result.exit_code());
/// }
/// ```
#[derive(Clone)]
pub struct FarmAggregator {
    checker: HostChecker,
    max_concurrency: usize,
}

impl FarmAggregator {
    pub fn new(connector: Arc<dyn StatsConnector>) -> Self {
        Self::with_config(connector, CheckConfig::default())
    }

    pub fn with_config(connector: Arc<dyn StatsConnector>, config: CheckConfig) -> Self {
        Self {
            checker: HostChecker::new(connector).with_timeout(config.timeout),
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    pub fn checker(&self) -> &HostChecker {
        &self.checker
    }

    /// Check every endpoint and roll the outcomes up
    ///
    /// Hosts are checked independently, up to `max_concurrency` at a time.
    /// Outcomes come back in `endpoints` order no matter which host answers
    /// first.
    pub async fn run_farm(&self, endpoints: &[Endpoint]) -> FarmResult {
        if endpoints.is_empty() {
            warn!("No memcached endpoints to check");
            return FarmResult::from_error(FarmError::NoEndpoints);
        }

        let outcomes: Vec<HostOutcome> = stream::iter(endpoints)
            .map(|endpoint| self.checker.check(endpoint))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let result = FarmResult::from_outcomes(outcomes);
        info!(
            hosts = result.outcomes.len(),
            failed = result.failed_hosts().count(),
            severity = %result.overall_severity,
            "Farm check complete"
        );
        result
    }

    /// Resolve endpoints from `provider`, then [`run_farm`](Self::run_farm)
    pub async fn run(&self, provider: &dyn EndpointProvider) -> FarmResult {
        match provider.endpoints() {
            Ok(endpoints) => self.run_farm(&endpoints).await,
            Err(e) => {
                warn!(error = %e, "Could not resolve memcached endpoints");
                FarmResult::from_error(e.into())
            }
        }
    }
}
