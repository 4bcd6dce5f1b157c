//! Endpoints and Endpoint Providers
//!
//! An [`Endpoint`] names one memcached server. The farm check never looks up
//! servers on its own; callers hand it an [`EndpointProvider`] or an explicit
//! list.
//!
//! # Example
//!
//! ```rust
//! use memcache_checker::{BackendUrl, EndpointProvider};
//!
//! # fn example() -> Result<(), memcache_checker::EndpointError> {
//! let provider = BackendUrl::new("memcached://cache-a:11211;cache-b:11212/");
//! let endpoints = provider.endpoints()?;
//! assert_eq!(endpoints.len(), 2);
//! assert_eq!(endpoints[1].to_string(), "cache-b:11212");
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Port memcached listens on unless told otherwise
pub const DEFAULT_PORT: u16 = 11211;

/// Environment variable consulted by [`EnvEndpoints`]
pub const MEMCACHED_URL_VAR: &str = "MEMCACHED_URL";

/// Errors raised while turning configuration text into endpoints
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("missing host in endpoint '{0}'")]
    EmptyHost(String),

    #[error("invalid port in endpoint '{0}'")]
    InvalidPort(String),

    #[error("IPv6 address in endpoint '{0}' must be bracketed, as in [::1]:11211")]
    UnbracketedIpv6(String),

    #[error("unsupported backend scheme '{0}' (expected memcached://)")]
    UnsupportedScheme(String),
}

/// Address of a single cache server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host:port`, or a bare `host` on the default port
    ///
    /// IPv6 addresses must be bracketed: `[::1]:11211` or `[::1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is empty, the port is not a valid `u16`,
    /// or an IPv6 address is given without brackets.
    pub fn parse(input: &str) -> Result<Self, EndpointError> {
        let trimmed = input.trim();
        let invalid_port = || EndpointError::InvalidPort(trimmed.to_string());

        let (host, port) = if let Some(rest) = trimmed.strip_prefix('[') {
            let (host, after) = rest.split_once(']').ok_or_else(invalid_port)?;
            let port = match after {
                "" => DEFAULT_PORT,
                _ => after
                    .strip_prefix(':')
                    .and_then(|port| port.parse::<u16>().ok())
                    .ok_or_else(invalid_port)?,
            };
            (host, port)
        } else {
            match trimmed.rsplit_once(':') {
                Some((host, _)) if host.contains(':') => {
                    return Err(EndpointError::UnbracketedIpv6(trimmed.to_string()));
                }
                Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid_port())?),
                None => (trimmed, DEFAULT_PORT),
            }
        };

        if host.is_empty() {
            return Err(EndpointError::EmptyHost(trimmed.to_string()));
        }

        Ok(Self::new(host, port))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Source of the endpoints a farm check should cover
///
/// An empty list is a valid answer; the farm check reports it as a warning.
pub trait EndpointProvider: Send + Sync {
    /// Resolve the ordered list of endpoints
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying configuration cannot be parsed.
    fn endpoints(&self) -> Result<Vec<Endpoint>, EndpointError>;
}

/// Fixed, caller-supplied endpoint list
#[derive(Debug, Clone, Default)]
pub struct StaticEndpoints(Vec<Endpoint>);

impl StaticEndpoints {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self(endpoints)
    }
}

impl EndpointProvider for StaticEndpoints {
    fn endpoints(&self) -> Result<Vec<Endpoint>, EndpointError> {
        Ok(self.0.clone())
    }
}

/// Cache backend URL such as `memcached://host1:11211;host2:11212/`
///
/// A plain `host:port;host:port` list without a scheme is accepted too.
/// Entries may be separated by `;` or `,`.
#[derive(Debug, Clone)]
pub struct BackendUrl {
    url: String,
}

impl BackendUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl EndpointProvider for BackendUrl {
    fn endpoints(&self) -> Result<Vec<Endpoint>, EndpointError> {
        let trimmed = self.url.trim();
        let hosts = match trimmed.split_once("://") {
            Some((scheme, rest)) => {
                if !matches!(scheme, "memcached" | "memcache") {
                    return Err(EndpointError::UnsupportedScheme(scheme.to_string()));
                }
                rest
            }
            None => trimmed,
        };

        hosts
            .trim_end_matches('/')
            .split([';', ','])
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(Endpoint::parse)
            .collect()
    }
}

/// Endpoints taken from an environment variable holding a backend URL
///
/// Defaults to `MEMCACHED_URL`. An unset or empty variable yields no
/// endpoints.
#[derive(Debug, Clone)]
pub struct EnvEndpoints {
    var: String,
}

impl EnvEndpoints {
    pub fn from_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvEndpoints {
    fn default() -> Self {
        Self::from_var(MEMCACHED_URL_VAR)
    }
}

impl EndpointProvider for EnvEndpoints {
    fn endpoints(&self) -> Result<Vec<Endpoint>, EndpointError> {
        match std::env::var(&self.var) {
            Ok(url) => BackendUrl::new(url).endpoints(),
            Err(_) => Ok(Vec::new()),
        }
    }
}
