//! Host Checker - Single Endpoint Probe
//!
//! Connects to one endpoint, reads its stats, derives metrics and classifies
//! the result. Every exit path produces a [`HostOutcome`]; nothing escapes as
//! an error or a panic.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::endpoint::Endpoint;
use crate::severity::Severity;
use crate::stats::{DerivedMetrics, RawStats, StatCounters};
use crate::traits::{ClientError, StatsConnector, StatsHandle};

/// Default bound on each connect and stats call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// RAII release guard for a stats handle
/// Ensures the connection is released on every return path, and also when
/// the check future is dropped mid-flight
struct ReleaseGuard {
    handle: Box<dyn StatsHandle>,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.handle.release();
    }
}

/// Why a host could not be reported on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Connection could not be established (or timed out)
    ConnectFailed,
    /// Connected, but no stats came back
    StatsUnavailable,
    /// Stats came back without the required numeric fields
    MalformedStats,
}

impl FailureReason {
    pub fn severity(self) -> Severity {
        match self {
            Self::ConnectFailed | Self::StatsUnavailable | Self::MalformedStats => {
                Severity::Critical
            }
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ConnectFailed => "memcached server down",
            Self::StatsUnavailable => "could not read stats from memcached server",
            Self::MalformedStats => "memcached server returned malformed stats",
        })
    }
}

/// Result of checking a single endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HostOutcome {
    Success {
        endpoint: Endpoint,
        raw_stats: RawStats,
        counters: StatCounters,
        derived: DerivedMetrics,
        connections: u64,
    },
    Failure {
        endpoint: Endpoint,
        reason: FailureReason,
        /// Underlying cause, for humans
        detail: String,
    },
}

impl HostOutcome {
    pub fn endpoint(&self) -> &Endpoint {
        match self {
            Self::Success { endpoint, .. } | Self::Failure { endpoint, .. } => endpoint,
        }
    }

    /// `Ok` for successes; failures carry their reason's severity
    pub fn severity(&self) -> Severity {
        match self {
            Self::Success { .. } => Severity::Ok,
            Self::Failure { reason, .. } => reason.severity(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn derived(&self) -> Option<&DerivedMetrics> {
        match self {
            Self::Success { derived, .. } => Some(derived),
            Self::Failure { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason, .. } => Some(*reason),
        }
    }
}

/// Checks one endpoint at a time using a shared connector
///
/// The connector is shared; the handles it opens are not. Each call to
/// [`check`](Self::check) owns its handle exclusively and releases it before
/// returning.
#[derive(Clone)]
pub struct HostChecker {
    connector: Arc<dyn StatsConnector>,
    timeout: Duration,
}

impl HostChecker {
    pub fn new(connector: Arc<dyn StatsConnector>) -> Self {
        Self {
            connector,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe `endpoint` once
    ///
    /// No retries: a failed connection attempt is final for this run.
    pub async fn check(&self, endpoint: &Endpoint) -> HostOutcome {
        debug!(endpoint = %endpoint, client = self.connector.name(), "Checking host");

        let handle = match timeout(self.timeout, self.connector.connect(endpoint)).await {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => return Self::failure(endpoint, FailureReason::ConnectFailed, &e),
            Err(_) => {
                let e = ClientError::Timeout(self.timeout);
                return Self::failure(endpoint, FailureReason::ConnectFailed, &e);
            }
        };
        let mut guard = ReleaseGuard { handle };

        let records = match timeout(self.timeout, guard.handle.stats()).await {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => return Self::failure(endpoint, FailureReason::StatsUnavailable, &e),
            Err(_) => {
                let e = ClientError::Timeout(self.timeout);
                return Self::failure(endpoint, FailureReason::StatsUnavailable, &e);
            }
        };

        let raw_stats = match records.into_iter().next() {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                return Self::failure(
                    endpoint,
                    FailureReason::StatsUnavailable,
                    &"server returned no stats",
                );
            }
        };

        let parsed = StatCounters::parse(&raw_stats)
            .and_then(|counters| Ok((counters, DerivedMetrics::from_counters(&counters)?)));
        let (counters, derived) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => return Self::failure(endpoint, FailureReason::MalformedStats, &e),
        };

        drop(guard);

        info!(
            endpoint = %endpoint,
            fill_percent = derived.fill_percent,
            connections = counters.curr_connections,
            "Host check passed"
        );

        HostOutcome::Success {
            endpoint: endpoint.clone(),
            raw_stats,
            counters,
            derived,
            connections: counters.curr_connections,
        }
    }

    fn failure(endpoint: &Endpoint, reason: FailureReason, cause: &dyn fmt::Display) -> HostOutcome {
        warn!(endpoint = %endpoint, reason = %reason, cause = %cause, "Host check failed");
        HostOutcome::Failure {
            endpoint: endpoint.clone(),
            reason,
            detail: cause.to_string(),
        }
    }
}
