//! Raw Stats and Derived Metrics
//!
//! Validates the stat mapping a memcached server returns and derives the
//! three health metrics from it: fill percent, get rate and hit rate.
//!
//! Rates whose denominator is zero are reported as `None`. A server that has
//! never seen a `get` has no hit rate, which is not the same as a 0% hit rate.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// The server answered, but not with something we can compute on
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedStats {
    #[error("missing stat '{0}'")]
    MissingKey(&'static str),

    #[error("stat '{key}' is not a number: '{value}'")]
    NotNumeric { key: &'static str, value: String },

    #[error("limit_maxbytes is zero")]
    ZeroCapacity,
}

/// Stat name to value mapping exactly as reported by one server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawStats(BTreeMap<String, String>);

impl RawStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn counter(&self, key: &'static str) -> Result<u64, MalformedStats> {
        let value = self.get(key).ok_or(MalformedStats::MissingKey(key))?;
        value.trim().parse::<u64>().map_err(|_| MalformedStats::NotNumeric {
            key,
            value: value.to_string(),
        })
    }
}

impl From<HashMap<String, String>> for RawStats {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawStats {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The required stats, parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCounters {
    pub curr_items: u64,
    pub bytes: u64,
    pub limit_maxbytes: u64,
    pub curr_connections: u64,
    pub cmd_get: u64,
    pub cmd_set: u64,
    pub get_hits: u64,
    pub get_misses: u64,
}

impl StatCounters {
    /// Pull every required key out of `raw`
    ///
    /// # Errors
    ///
    /// Returns [`MalformedStats`] if a required key is missing or not an
    /// unsigned integer.
    pub fn parse(raw: &RawStats) -> Result<Self, MalformedStats> {
        Ok(Self {
            curr_items: raw.counter("curr_items")?,
            bytes: raw.counter("bytes")?,
            limit_maxbytes: raw.counter("limit_maxbytes")?,
            curr_connections: raw.counter("curr_connections")?,
            cmd_get: raw.counter("cmd_get")?,
            cmd_set: raw.counter("cmd_set")?,
            get_hits: raw.counter("get_hits")?,
            get_misses: raw.counter("get_misses")?,
        })
    }
}

/// Health metrics computed from one server's stats
///
/// Percentages are unrounded; rounding is a presentation concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Share of `limit_maxbytes` currently used
    pub fill_percent: f64,
    /// `cmd_get` share of all gets and sets, `None` before any traffic
    pub get_rate_percent: Option<f64>,
    /// `get_hits` share of all gets, `None` before any gets
    pub hit_rate_percent: Option<f64>,
}

impl DerivedMetrics {
    /// Compute metrics from already parsed counters
    ///
    /// # Errors
    ///
    /// Returns [`MalformedStats::ZeroCapacity`] when `limit_maxbytes` is zero.
    pub fn from_counters(counters: &StatCounters) -> Result<Self, MalformedStats> {
        if counters.limit_maxbytes == 0 {
            return Err(MalformedStats::ZeroCapacity);
        }

        Ok(Self {
            fill_percent: percent(counters.bytes, u128::from(counters.limit_maxbytes)),
            get_rate_percent: rate(counters.cmd_get, counters.cmd_set),
            hit_rate_percent: rate(counters.get_hits, counters.get_misses),
        })
    }
}

/// Validate `raw` and derive its health metrics
///
/// # Errors
///
/// Returns [`MalformedStats`] if a required key is missing, non-numeric, or
/// `limit_maxbytes` is zero.
pub fn derive(raw: &RawStats) -> Result<DerivedMetrics, MalformedStats> {
    DerivedMetrics::from_counters(&StatCounters::parse(raw)?)
}

/// `part` as a percentage of `part + rest`, `None` if both are zero
fn rate(part: u64, rest: u64) -> Option<f64> {
    let total = u128::from(part) + u128::from(rest);
    (total > 0).then(|| percent(part, total))
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: u64, whole: u128) -> f64 {
    100.0 * part as f64 / whole as f64
}
