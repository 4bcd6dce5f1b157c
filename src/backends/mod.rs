//! Stats Client Backends
//!
//! Implementations of [`StatsConnector`](crate::traits::StatsConnector).
//!
//! # Available Backends
//!
//! - **Memcached** - `memcache` crate client (feature: `backend-memcached`, on by default)
//!
//! # Usage
//!
//! ```rust,no_run
//! use memcache_checker::backends::MemcachedConnector;
//! use memcache_checker::{Endpoint, FarmAggregator};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let farm = FarmAggregator::new(Arc::new(MemcachedConnector::new()));
//! let result = farm.run_farm(&[Endpoint::new("localhost", 11211)]).await;
//! # }
//! ```

#[cfg(feature = "backend-memcached")]
pub mod memcached_client;

#[cfg(feature = "backend-memcached")]
pub use memcached_client::{MemcachedConnector, MemcachedHandle};
