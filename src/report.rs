//! Report Rendering
//!
//! Turns a [`FarmResult`] into terminal text, a single monitoring-plugin
//! line, or JSON. Nothing here recomputes metrics; rounding happens only at
//! display time.
//!
//! ```text
//! ------------------------------------------------
//! MemCache status for localhost:11211
//! 56 items using 2131956 of 67108864
//!  3.18% full 3 connections being handled
//! get rate: 50.5 % hit rate: 75.5 %
//! ```

use std::io::{self, Write};

use crate::checker::HostOutcome;
use crate::farm::FarmResult;

/// Prefix of every monitoring-plugin line
pub const PLUGIN_NAME: &str = "CHECKMEMCACHE";

/// Rates below this are highlighted in colorized output
pub const LOW_RATE_THRESHOLD: f64 = 50.5;

const BANNER: &str = "------------------------------------------------";

mod ansi {
    pub const DEFAULT: &str = "\x1b[m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// Human-readable, one block per host
    #[default]
    Text,
    /// One monitoring-plugin line for the whole farm
    Nagios,
    /// Machine-readable JSON
    Json,
}

/// What to include and how to decorate it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ReportOptions {
    pub format: ReportFormat,
    pub colorize: bool,
    pub banner: bool,
    pub get_rate: bool,
    pub hit_rate: bool,
    /// Dump every raw stat after each host
    pub verbose: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            colorize: false,
            banner: true,
            get_rate: false,
            hit_rate: false,
            verbose: false,
        }
    }
}

/// Writes reports for farm results
pub struct Reporter<W: Write = Box<dyn Write>> {
    out: W,
    options: ReportOptions,
}

impl Reporter<Box<dyn Write>> {
    /// Create a reporter writing to stdout
    pub fn stdout(options: ReportOptions) -> Self {
        Self {
            out: Box::new(io::stdout()),
            options,
        }
    }
}

impl<W: Write> Reporter<W> {
    /// Create a reporter with a custom writer
    pub fn new(out: W, options: ReportOptions) -> Self {
        Self { out, options }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Render `result` in the configured format
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying writer fails.
    pub fn render(&mut self, result: &FarmResult) -> io::Result<()> {
        match self.options.format {
            ReportFormat::Text => self.render_text(result)?,
            ReportFormat::Nagios => {
                let line = nagios_line(result, &self.options);
                writeln!(self.out, "{line}")?;
            }
            ReportFormat::Json => {
                serde_json::to_writer_pretty(&mut self.out, result).map_err(io::Error::other)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()
    }

    fn render_text(&mut self, result: &FarmResult) -> io::Result<()> {
        if let Some(error) = &result.error {
            let label = self.paint(result.overall_severity.label(), ansi::RED);
            return writeln!(self.out, "{label}: {error}");
        }

        for outcome in &result.outcomes {
            if self.options.banner {
                writeln!(self.out, "{BANNER}")?;
            }
            self.render_host(outcome)?;
        }
        Ok(())
    }

    fn render_host(&mut self, outcome: &HostOutcome) -> io::Result<()> {
        let host = self.paint(&outcome.endpoint().to_string(), ansi::GREEN);
        writeln!(self.out, "MemCache status for {host}")?;

        match outcome {
            HostOutcome::Success {
                raw_stats,
                counters,
                derived,
                connections,
                ..
            } => {
                let items = self.paint(&counters.curr_items.to_string(), ansi::YELLOW);
                let bytes = self.paint(&counters.bytes.to_string(), ansi::YELLOW);
                let limit = self.paint(&counters.limit_maxbytes.to_string(), ansi::YELLOW);
                writeln!(self.out, "{items} items using {bytes} of {limit}")?;

                let fill = self.paint(&format!("{:5.2}", derived.fill_percent), ansi::YELLOW);
                let conns = self.paint(&connections.to_string(), ansi::YELLOW);
                writeln!(self.out, "{fill}% full {conns} connections being handled")?;

                let mut rates = Vec::new();
                if self.options.get_rate {
                    rates.push(self.rate("get", derived.get_rate_percent));
                }
                if self.options.hit_rate {
                    rates.push(self.rate("hit", derived.hit_rate_percent));
                }
                if !rates.is_empty() {
                    writeln!(self.out, "{}", rates.join(" "))?;
                }

                if self.options.verbose {
                    for (key, value) in raw_stats.iter() {
                        writeln!(self.out, "  {key}: {value}")?;
                    }
                }
                Ok(())
            }
            HostOutcome::Failure { reason, detail, .. } => {
                let label = self.paint(outcome.severity().label(), ansi::RED);
                writeln!(self.out, "{label}: {reason} ({detail})")
            }
        }
    }

    fn rate(&self, name: &str, value: Option<f64>) -> String {
        let color = match value {
            Some(v) if v < LOW_RATE_THRESHOLD => ansi::RED,
            _ => ansi::YELLOW,
        };
        format!("{name} rate: {} %", self.paint(&format_rate(value), color))
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.options.colorize {
            format!("{color}{text}{}", ansi::DEFAULT)
        } else {
            text.to_string()
        }
    }
}

/// Rate rounded to one decimal, or `n/a` when there is no meaningful rate
pub fn format_rate(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}"))
}

/// Single monitoring-plugin line for the whole farm
///
/// `CHECKMEMCACHE <LABEL>: <host>; <host>; ...`
pub fn nagios_line(result: &FarmResult, options: &ReportOptions) -> String {
    let label = result.overall_severity.label();
    if let Some(error) = &result.error {
        return format!("{PLUGIN_NAME} {label}: {error}");
    }

    let hosts: Vec<String> = result
        .outcomes
        .iter()
        .map(|outcome| nagios_host_summary(outcome, options))
        .collect();
    format!("{PLUGIN_NAME} {label}: {}", hosts.join("; "))
}

fn nagios_host_summary(outcome: &HostOutcome, options: &ReportOptions) -> String {
    match outcome {
        HostOutcome::Success {
            endpoint, derived, ..
        } => {
            let mut summary = String::new();
            if options.get_rate {
                summary.push_str(&format!("get rate: {} % ", format_rate(derived.get_rate_percent)));
            }
            if options.hit_rate {
                summary.push_str(&format!("hit rate: {} % ", format_rate(derived.hit_rate_percent)));
            }
            summary.push_str(&format!("{:5.2}% full on {endpoint}", derived.fill_percent));
            summary
        }
        HostOutcome::Failure {
            endpoint, reason, ..
        } => format!("{reason} on {endpoint}"),
    }
}
