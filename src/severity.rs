//! Check Severity
//!
//! Ordered health levels shared by per-host outcomes and the farm roll-up.
//! The numeric values double as monitoring-plugin exit codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::ExitCode;

/// Health level of a host or of the whole farm
///
/// Variant order defines the total order used for roll-up:
/// `Ok < Warning < Critical < Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Severity {
    /// Everything checked out
    Ok = 0,
    /// Something is off but the farm is not known to be down
    Warning = 1,
    /// A host is unreachable or unusable
    Critical = 2,
    /// The check itself could not decide
    Unknown = 3,
}

impl Severity {
    /// Severity used for failures whose classification is not otherwise defined
    pub const FAILED: Self = Self::Warning;

    /// Process exit code for this severity
    #[must_use]
    pub fn exit_code(self) -> i32 {
        i32::from(self as u8)
    }

    /// Upper-case label used in monitoring output
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Worst severity of a sequence, or `None` if it is empty
    pub fn worst<I>(severities: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        severities.into_iter().max()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Severity> for ExitCode {
    fn from(severity: Severity) -> Self {
        ExitCode::from(severity as u8)
    }
}
