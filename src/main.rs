//! `llhls` - fetch chunks from a local low-latency HLS producer.

use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use llhls_unix::constants::DEFAULT_IDLE_TIMEOUT;
use llhls_unix::{commands, ProtocolRegistry, TransportError, TransportOptions};

/// Exit status when the producer reported it could not serve the chunk.
const EXIT_PRODUCER_FAILED: i32 = 2;

// CLI
#[derive(Parser)]
#[command(name = "llhls")]
#[command(version)]
#[command(about = "Fetch media chunks from a producer over a Unix domain socket")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one chunk and write it to stdout or a file
    Fetch {
        /// Locator, e.g. llhls:/tmp/producer.sock?seg42
        locator: String,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// JSON transport options file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Connect timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Read/write timeout in milliseconds
        #[arg(long)]
        rw_timeout_ms: Option<u64>,
        /// Give up when no data arrives for this long (default 5000)
        #[arg(long)]
        idle_timeout_ms: Option<u64>,
    },
    /// List registered protocols
    Protocols,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        let code = match e.downcast_ref::<TransportError>() {
            Some(TransportError::ProducerFailed { .. }) => EXIT_PRODUCER_FAILED,
            _ => 1,
        };
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let registry = ProtocolRegistry::with_defaults();

    match cli.command {
        Commands::Fetch {
            locator,
            output,
            config,
            timeout_ms,
            rw_timeout_ms,
            idle_timeout_ms,
        } => {
            let mut options = TransportOptions::load(config.as_deref())?;
            if timeout_ms.is_some() {
                options.timeout_ms = timeout_ms;
            }
            if rw_timeout_ms.is_some() {
                options.rw_timeout_ms = rw_timeout_ms;
            }

            let mut transport = registry
                .open(&locator, &options)
                .with_context(|| format!("open {locator}"))?;

            let idle_timeout = idle_timeout_ms.map_or(DEFAULT_IDLE_TIMEOUT, Duration::from_millis);
            let summary = match &output {
                Some(path) => commands::fetch_to_file(transport.as_mut(), path, idle_timeout)?,
                None => {
                    let mut out = BufWriter::new(std::io::stdout().lock());
                    commands::fetch(transport.as_mut(), &mut out, idle_timeout)?
                }
            };
            log::info!("[llhls] fetched {} bytes from {locator}", summary.bytes);
        }
        Commands::Protocols => {
            commands::protocols(&registry, &mut std::io::stdout().lock())?;
        }
    }

    Ok(())
}
