//! Common utilities for integration tests
//!
//! This module provides shared test infrastructure including:
//! - A scripted in-memory stats connector
//! - Stats fixtures
//! - Connection bookkeeping (connects vs. releases)

#![allow(dead_code)]

use memcache_checker::{
    CheckConfig, ClientError, Endpoint, FarmAggregator, RawStats, StatsConnector, StatsHandle,
    async_trait,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Timeout used by tests that exercise hanging servers
pub const SHORT_TIMEOUT: Duration = Duration::from_millis(50);

/// How a scripted server behaves
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Accept the connection and return these records
    Serve(Vec<RawStats>),
    /// Like `Serve`, but wait before answering `stats`
    Slow(Duration, Vec<RawStats>),
    /// Connection refused
    RefuseConnection,
    /// Connect never completes
    HangOnConnect,
    /// Connected, but `stats` fails
    FailStats,
    /// Connected, but `stats` never answers
    HangOnStats,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub connects: AtomicUsize,
    pub releases: AtomicUsize,
}

impl Counters {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

/// Connector whose servers follow a script; unknown endpoints refuse connections
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    behaviors: HashMap<Endpoint, Behavior>,
    counters: Arc<Counters>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, endpoint: &Endpoint, behavior: Behavior) -> Self {
        self.behaviors.insert(endpoint.clone(), behavior);
        self
    }

    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }
}

#[async_trait]
impl StatsConnector for ScriptedConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn StatsHandle>, ClientError> {
        let behavior = self
            .behaviors
            .get(endpoint)
            .cloned()
            .unwrap_or(Behavior::RefuseConnection);

        match behavior {
            Behavior::RefuseConnection => {
                Err(ClientError::Connect(format!("{endpoint}: connection refused")))
            }
            Behavior::HangOnConnect => std::future::pending().await,
            behavior => {
                self.counters.connects.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(ScriptedHandle {
                    behavior,
                    counters: Arc::clone(&self.counters),
                    released: false,
                }))
            }
        }
    }

    fn name(&self) -> &'static str {
        "Scripted"
    }
}

struct ScriptedHandle {
    behavior: Behavior,
    counters: Arc<Counters>,
    released: bool,
}

#[async_trait]
impl StatsHandle for ScriptedHandle {
    async fn stats(&mut self) -> Result<Vec<RawStats>, ClientError> {
        match &self.behavior {
            Behavior::Serve(records) => Ok(records.clone()),
            Behavior::Slow(delay, records) => {
                tokio::time::sleep(*delay).await;
                Ok(records.clone())
            }
            Behavior::FailStats => Err(ClientError::Stats("connection reset by peer".into())),
            Behavior::HangOnStats => std::future::pending().await,
            Behavior::RefuseConnection | Behavior::HangOnConnect => {
                Err(ClientError::Stats("not connected".into()))
            }
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.counters.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Stats for a server with the given memory use and traffic counters
pub fn server_stats(bytes: u64, limit: u64, gets: u64, sets: u64, hits: u64, misses: u64) -> RawStats {
    RawStats::from_iter([
        ("pid", "4242".to_string()),
        ("uptime", "86400".to_string()),
        ("curr_items", "56".to_string()),
        ("bytes", bytes.to_string()),
        ("limit_maxbytes", limit.to_string()),
        ("curr_connections", "3".to_string()),
        ("cmd_get", gets.to_string()),
        ("cmd_set", sets.to_string()),
        ("get_hits", hits.to_string()),
        ("get_misses", misses.to_string()),
    ])
}

/// The server from the classic status report example
pub fn documented_stats() -> RawStats {
    server_stats(2_131_956, 67_108_864, 600, 0, 453, 147)
}

/// Farm aggregator over `connector` with a short timeout
pub fn farm(connector: ScriptedConnector) -> FarmAggregator {
    FarmAggregator::with_config(
        Arc::new(connector),
        CheckConfig {
            timeout: SHORT_TIMEOUT,
            ..CheckConfig::default()
        },
    )
}

pub fn endpoint(name: &str) -> Endpoint {
    Endpoint::new(name, 11211)
}
