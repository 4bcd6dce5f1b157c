use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use memcache_checker::endpoint::DEFAULT_PORT;
use memcache_checker::farm::DEFAULT_MAX_CONCURRENCY;
use memcache_checker::{
    BackendUrl, Endpoint, EndpointError, EndpointProvider, EnvEndpoints, FarmCheckBuilder,
    ReportFormat, ReportOptions, Reporter, Severity,
};

/// Memcached farm status and monitoring check
///
/// Reports fill level, connections and optional get/hit rates for every
/// server. The exit code is the worst host's severity
/// (0 OK, 1 WARNING, 2 CRITICAL, 3 UNKNOWN).
///
/// Servers come from the positional arguments, then `--host/--port`, then
/// the `MEMCACHED_URL` environment variable.
#[derive(Parser, Debug)]
#[command(name = "check_memcache", version, about)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Servers to check: `host:port`, `host:port;host:port`, or `memcached://host:port;host:port/`
    servers: Vec<String>,

    /// Single host to check.
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port used with --host.
    #[arg(short = 'P', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Output format (text, nagios or json).
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Print a single Nagios-compatible status line (same as `--format nagios`).
    #[arg(short = 'n', long, default_value_t = false)]
    nagios: bool,

    /// Colorize output for terminals with color.
    #[arg(short, long, default_value_t = false)]
    colorize: bool,

    /// Show the get rate.
    #[arg(short, long, default_value_t = false)]
    get_rate: bool,

    /// Show the hit rate.
    #[arg(short = 'r', long, default_value_t = false)]
    hit_rate: bool,

    /// Dump every raw stat reported by each server.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Do not print a banner above each host.
    #[arg(short = 'b', long, default_value_t = false)]
    no_banner: bool,

    /// Timeout for each connect and stats call, in milliseconds.
    #[arg(long, default_value_t = 3000)]
    timeout_ms: u64,

    /// Maximum number of hosts checked at once.
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    concurrency: usize,
}

impl Cli {
    fn report_options(&self) -> ReportOptions {
        let format = if self.nagios {
            ReportFormat::Nagios
        } else {
            self.format
        };

        ReportOptions {
            format,
            colorize: self.colorize,
            banner: !self.no_banner,
            get_rate: self.get_rate,
            hit_rate: self.hit_rate,
            verbose: self.verbose,
        }
    }
}

/// Endpoints named on the command line, falling back to `MEMCACHED_URL`
struct CliEndpoints<'a> {
    servers: &'a [String],
    host: Option<&'a str>,
    port: u16,
}

impl EndpointProvider for CliEndpoints<'_> {
    fn endpoints(&self) -> Result<Vec<Endpoint>, EndpointError> {
        if !self.servers.is_empty() {
            let mut endpoints = Vec::new();
            for server in self.servers {
                endpoints.extend(BackendUrl::new(server.as_str()).endpoints()?);
            }
            return Ok(endpoints);
        }

        if let Some(host) = self.host {
            return Ok(vec![Endpoint::new(host, self.port)]);
        }

        EnvEndpoints::default().endpoints()
    }
}

async fn run(cli: Cli) -> anyhow::Result<Severity> {
    let farm = FarmCheckBuilder::new()
        .with_timeout(Duration::from_millis(cli.timeout_ms))
        .with_max_concurrency(cli.concurrency)
        .build()
        .context("failed to set up the farm check")?;

    let provider = CliEndpoints {
        servers: &cli.servers,
        host: cli.host.as_deref(),
        port: cli.port,
    };
    let result = farm.run(&provider).await;

    Reporter::stdout(cli.report_options())
        .render(&result)
        .context("failed to write report")?;

    Ok(result.overall_severity)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(severity) => severity.into(),
        Err(e) => {
            error!(error = %format!("{e:#}"), "Check could not complete");
            Severity::Unknown.into()
        }
    }
}
