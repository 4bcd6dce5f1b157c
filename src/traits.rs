//! Stats Client Traits
//!
//! This module defines the capability the checker needs from a cache client:
//! connect to one endpoint, read its stats, release the connection. The wire
//! protocol stays behind these traits.
//!
//! # Architecture
//!
//! - `StatsConnector`: Factory that opens a handle for an endpoint
//! - `StatsHandle`: One exclusively owned connection to one server
//!
//! # Example: Custom Connector
//!
//! ```rust,ignore
//! use memcache_checker::{async_trait, ClientError, Endpoint, RawStats, StatsConnector, StatsHandle};
//!
//! struct MyConnector;
//! struct MyHandle { /* connection state */ }
//!
//! #[async_trait]
//! impl StatsConnector for MyConnector {
//!     async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn StatsHandle>, ClientError> {
//!         // Open a connection to `endpoint`
//!     }
//! }
//!
//! #[async_trait]
//! impl StatsHandle for MyHandle {
//!     async fn stats(&mut self) -> Result<Vec<RawStats>, ClientError> {
//!         // Issue a `stats` command
//!     }
//!
//!     fn release(&mut self) {
//!         // Close the connection (must be safe to call twice)
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::endpoint::Endpoint;
use crate::stats::RawStats;

/// Failure reported by a stats client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("stats request failed: {0}")]
    Stats(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Opens stats handles
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: a farm check opens handles for
/// several endpoints concurrently from one connector.
#[async_trait]
pub trait StatsConnector: Send + Sync {
    /// Connect to a single endpoint
    ///
    /// # Returns
    ///
    /// * `Ok(handle)` - Connection established, exclusively owned by the caller
    /// * `Err(e)` - Server unreachable or client construction failed
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn StatsHandle>, ClientError>;

    /// Get the name of this client implementation
    ///
    /// Used for logging.
    fn name(&self) -> &'static str {
        "unknown"
    }
}

/// A live connection to one server
#[async_trait]
pub trait StatsHandle: Send {
    /// Fetch the stats records the server returns
    ///
    /// # Returns
    ///
    /// * `Ok(records)` - One record per server answering on this handle
    /// * `Err(e)` - Transport failure
    async fn stats(&mut self) -> Result<Vec<RawStats>, ClientError>;

    /// Drop the connection
    ///
    /// Idempotent: calling it on an already released handle is a no-op.
    fn release(&mut self);
}
