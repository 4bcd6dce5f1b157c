//! Farm Check Builder
//!
//! Provides a builder for constructing a [`FarmAggregator`] with a custom
//! stats client and tuning.
//!
//! # Example: Using the Default Client
//!
//! ```rust,no_run
//! use memcache_checker::FarmCheckBuilder;
//! use std::time::Duration;
//!
//! # fn example() -> anyhow::Result<()> {
//! let farm = FarmCheckBuilder::new()
//!     .with_timeout(Duration::from_secs(1))
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example: Custom Client
//!
//! ```rust,ignore
//! use memcache_checker::FarmCheckBuilder;
//! use std::sync::Arc;
//!
//! let farm = FarmCheckBuilder::new()
//!     .with_connector(Arc::new(MyStatsConnector::new()))
//!     .build()?;
//! ```

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::farm::{CheckConfig, FarmAggregator};
use crate::traits::StatsConnector;

/// Builder for [`FarmAggregator`]
///
/// # Default Behavior
///
/// Without `.with_connector()`, the builder uses
/// [`MemcachedConnector`](crate::backends::MemcachedConnector) with its socket
/// timeout set to the check timeout. Building fails if the
/// `backend-memcached` feature is disabled and no connector was given.
#[derive(Default)]
pub struct FarmCheckBuilder {
    connector: Option<Arc<dyn StatsConnector>>,
    config: CheckConfig,
}

impl FarmCheckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom stats client
    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn StatsConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Bound each connect and stats call
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Cap the number of hosts checked at once
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    /// Replace the whole configuration
    #[must_use]
    pub fn with_config(mut self, config: CheckConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the farm aggregator
    ///
    /// # Errors
    ///
    /// Returns an error if no connector was configured and no default client
    /// is compiled in.
    pub fn build(self) -> Result<FarmAggregator> {
        let connector = match self.connector {
            Some(connector) => connector,
            None => default_connector(&self.config)?,
        };

        debug!(
            client = connector.name(),
            timeout_ms = u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
            max_concurrency = self.config.max_concurrency,
            "Building farm check"
        );

        Ok(FarmAggregator::with_config(connector, self.config))
    }
}

#[cfg(feature = "backend-memcached")]
#[allow(clippy::unnecessary_wraps)]
fn default_connector(config: &CheckConfig) -> Result<Arc<dyn StatsConnector>> {
    use crate::backends::MemcachedConnector;

    Ok(Arc::new(
        MemcachedConnector::new().with_io_timeout(config.timeout),
    ))
}

#[cfg(not(feature = "backend-memcached"))]
fn default_connector(_config: &CheckConfig) -> Result<Arc<dyn StatsConnector>> {
    Err(anyhow::anyhow!(
        "no stats connector configured and the memcached backend is disabled"
    ))
}
