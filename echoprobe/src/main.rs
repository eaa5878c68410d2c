//! Send ICMP echo requests to a list of hosts and report which ones answer.
//!
//! ```sh
//! sudo echoprobe -c 3 -t 1.5 127.0.0.1 example.com
//! ```
//!
//! Every probe produces one line: the round-trip time of a valid reply, a
//! timeout, or why the reply or socket failed, together with a hex dump of any
//! reply which was rejected. A summary is printed after the last probe to each
//! host. Probes are sent over a raw socket, which usually requires root or
//! `CAP_NET_RAW`.
//!
//! The process exits successfully as long as the run could be performed, even
//! if every host was unreachable.
//!
//! ## Configuration
//!
//! Defaults can be provided through any number of TOML files specified with
//! `--config <path>`. Options on the command line take precedence.
//!
//! ```toml
//! # Hosts to probe when none are given on the command line.
//! targets = ["127.0.0.1", "example.com"]
//! # Probes per host.
//! count = 3
//! # Seconds to wait for each reply.
//! timeout = 2.0
//! # Seconds to wait between probes to the same host.
//! pause = 0.1
//! # Size of the ICMP message in bytes, header included.
//! size = 28
//! ```

use core::time::Duration;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use lib::{ProbeConfig, Prober, SocketTransport};
use tracing::Level;

mod config;
mod render;

#[derive(Parser)]
#[clap(version, about)]
struct Opts {
    /// Hosts to probe, by name or IPv4 address.
    targets: Vec<String>,
    /// Number of probes to send to each host. Defaults to 1.
    #[clap(short, long)]
    count: Option<u32>,
    /// Seconds to wait for each reply, fractions allowed. Defaults to 2.
    #[clap(short, long, value_name = "SECS", value_parser = parse_seconds)]
    timeout: Option<Duration>,
    /// Seconds to pause between probes to the same host, fractions allowed.
    /// Defaults to 0.1.
    #[clap(short, long, value_name = "SECS", value_parser = parse_seconds)]
    pause: Option<Duration>,
    /// Size of the ICMP message in bytes, header included. Defaults to 28.
    #[clap(short, long, value_name = "BYTES")]
    size: Option<usize>,
    /// Path to load configuration files from.
    #[clap(long)]
    config: Vec<PathBuf>,
    /// Log progress of every probe.
    #[clap(short, long)]
    verbose: bool,
    /// Log socket level details.
    #[clap(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let opts = Opts::parse();

    let level = if opts.debug {
        Level::TRACE
    } else if opts.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = inner(opts).await {
        tracing::error!("Error: {err}");

        for e in err.chain().skip(1) {
            tracing::error!("Caused by: {e}");
        }

        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn inner(opts: Opts) -> Result<()> {
    let mut config = config::Config::default();

    let mut has_errors = false;

    for path in &opts.config {
        let d = config::Diagnostics::new();

        config
            .add_from_path(path, &d)
            .with_context(|| path.display().to_string())?;

        for error in d.into_errors() {
            tracing::error!("{}: {error}", path.display());
            has_errors = true;
        }
    }

    if has_errors {
        return Err(anyhow!("Configuration had errors"));
    }

    let probe = build(opts, config)?;

    println!("start time: {}", render::timestamp());

    let mut prober = Prober::new(SocketTransport::new());

    tracing::debug!(
        identifier = prober.identifier(),
        sequence = prober.sequence(),
        targets = probe.targets.len(),
        "starting run"
    );

    prober
        .run(&probe, |event| print!("{}", render::event(&event)))
        .await
        .context("probing")?;

    println!("finish time: {}", render::timestamp());
    Ok(())
}

/// Merge command line options over loaded configuration.
fn build(opts: Opts, config: config::Config) -> Result<ProbeConfig> {
    let targets = if opts.targets.is_empty() {
        config.targets
    } else {
        opts.targets
    };

    if targets.is_empty() {
        bail!("No targets given, specify them as arguments or in a configuration file");
    }

    let mut probe = ProbeConfig::new(targets);

    if let Some(count) = opts.count.or(config.count) {
        probe.count = count;
    }

    if let Some(timeout) = opts.timeout.or(config.timeout) {
        probe.reply_timeout = timeout;
    }

    if let Some(pause) = opts.pause.or(config.pause) {
        probe.pause = pause;
    }

    if let Some(size) = opts.size.or(config.size) {
        probe.packet_size = size;
    }

    probe.validate().context("invalid configuration")?;
    Ok(probe)
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs = s.parse::<f64>().map_err(|e| e.to_string())?;
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}
