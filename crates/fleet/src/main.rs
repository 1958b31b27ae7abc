//! Fleet - Vehicle position relay
//!
//! # Usage
//!
//! ```bash
//! # Run producer, topic and consumer in one process (default)
//! fleet
//! fleet --config configs/fleet.toml
//!
//! # Watch the live push channel of a running relay
//! fleet tail
//! fleet tail --address 127.0.0.1:8082 --pull
//! ```

mod cmd;

use std::fs::OpenOptions;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleet_config::{LogConfig, LogFormat, LogLevel, LogOutput};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Fleet - Vehicle position relay
#[derive(Parser, Debug)]
#[command(name = "fleet")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    // Global args that apply to serve when no subcommand given
    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the relay
    Serve(cmd::serve::ServeArgs),

    /// Stream live locations from a running relay
    Tail(cmd::tail::TailArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Serve(mut args)) => {
            args.config = cli.config;
            serve(args, cli.log_level).await
        }
        Some(Command::Tail(args)) => {
            // Tail initializes its own logging
            cmd::tail::run(args).await
        }
        // No subcommand = run the relay (default behavior)
        None => {
            let args = cmd::serve::ServeArgs { config: cli.config };
            serve(args, cli.log_level).await
        }
    }
}

async fn serve(args: cmd::serve::ServeArgs, log_level: Option<LogLevel>) -> Result<()> {
    let loaded = cmd::serve::load_config(args.config.as_deref())?;
    init_logging(&loaded.config.log, log_level)?;
    cmd::serve::run(loaded).await
}

/// Initialize the tracing subscriber for logging
///
/// Base level comes from `cli_level` when given, else from the config file.
/// Target overrides from `[log.targets]` apply either way.
fn init_logging(log: &LogConfig, cli_level: Option<LogLevel>) -> Result<()> {
    let directives = log.filter_directives(cli_level.as_ref().map(LogLevel::as_str));
    let filter = EnvFilter::try_new(&directives)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log filter '{}': {}", directives, e))?;

    let writer = match &log.output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path))?;
            BoxMakeWriter::new(Arc::new(file))
        }
    };
    let ansi = log.output.is_console();

    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Console => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(false)
                    .with_writer(writer),
            )
            .init(),
    }

    Ok(())
}
