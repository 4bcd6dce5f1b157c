//! Memcached Client - Stats Backend
//!
//! Memcached-based implementation of the stats client traits, using the
//! blocking `memcache` crate on tokio's blocking thread pool.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::endpoint::Endpoint;
use crate::stats::RawStats;
use crate::traits::{ClientError, StatsConnector, StatsHandle};

/// Connect and socket read/write timeout applied to every connection
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(3);

/// Opens one `memcache::Client` per endpoint
///
/// **Note**: Each handle talks to exactly one server, so `stats()` yields a
/// single record in practice. Nothing is pooled across endpoints.
#[derive(Debug, Clone)]
pub struct MemcachedConnector {
    io_timeout: Duration,
}

impl MemcachedConnector {
    /// Create a connector with the default socket timeout
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use memcache_checker::backends::MemcachedConnector;
    /// # use memcache_checker::{Endpoint, StatsConnector};
    /// # async fn example() -> anyhow::Result<()> {
    /// let connector = MemcachedConnector::new();
    /// let mut handle = connector.connect(&Endpoint::new("localhost", 11211)).await?;
    /// let records = handle.stats().await?;
    /// handle.release();
    /// # Ok(())
    /// # }
    /// ```
    pub fn new() -> Self {
        Self {
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    /// Use a custom connect and socket read/write timeout
    #[must_use]
    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Connection URL for `endpoint`
    ///
    /// `memcache` reads `connect_timeout` (pool checkout, which includes the
    /// TCP connect) and `timeout` (socket read/write) from the query string.
    /// Without `connect_timeout` an unreachable host blocks for r2d2's 30 s
    /// default.
    fn url(&self, endpoint: &Endpoint) -> String {
        let secs = self.io_timeout.as_secs_f64();
        let host = if endpoint.host().contains(':') && !endpoint.host().starts_with('[') {
            format!("[{}]", endpoint.host())
        } else {
            endpoint.host().to_string()
        };
        format!(
            "memcache://{host}:{}?connect_timeout={secs}&timeout={secs}",
            endpoint.port()
        )
    }
}

impl Default for MemcachedConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatsConnector for MemcachedConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn StatsHandle>, ClientError> {
        let url = self.url(endpoint);

        let client = tokio::task::spawn_blocking(move || memcache::connect(url.as_str()))
            .await
            .map_err(|e| ClientError::Connect(format!("client task failed: {e}")))?
            .map_err(|e| ClientError::Connect(e.to_string()))?;

        info!(endpoint = %endpoint, "Memcached client connected");

        Ok(Box::new(MemcachedHandle {
            endpoint: endpoint.clone(),
            client: Some(client),
        }))
    }

    fn name(&self) -> &'static str {
        "Memcached"
    }
}

/// Connection to a single memcached server
pub struct MemcachedHandle {
    endpoint: Endpoint,
    /// `None` once released
    client: Option<memcache::Client>,
}

#[async_trait]
impl StatsHandle for MemcachedHandle {
    async fn stats(&mut self) -> Result<Vec<RawStats>, ClientError> {
        let client = self
            .client
            .clone()
            .ok_or_else(|| ClientError::Stats("handle already released".to_string()))?;

        let records = tokio::task::spawn_blocking(move || client.stats())
            .await
            .map_err(|e| ClientError::Stats(format!("client task failed: {e}")))?
            .map_err(|e| ClientError::Stats(e.to_string()))?;

        debug!(endpoint = %self.endpoint, records = records.len(), "[Memcached] Fetched stats");

        Ok(records
            .into_iter()
            .map(|(_server, stats)| RawStats::from(stats))
            .collect())
    }

    fn release(&mut self) {
        if self.client.take().is_some() {
            debug!(endpoint = %self.endpoint, "[Memcached] Released connection");
        }
    }
}
