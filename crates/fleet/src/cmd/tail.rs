//! Tail command - Watch the live push channel
//!
//! Connects to a running relay's live endpoint and prints every location
//! as it is pushed.

use std::io::IsTerminal;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing_subscriber::EnvFilter;

use fleet_tap::PULL_COMMAND;

/// Tail command arguments
#[derive(Args, Debug)]
pub struct TailArgs {
    /// Live push channel address
    #[arg(short, long, default_value = "127.0.0.1:8082")]
    address: String,

    /// Ask for the current location before streaming
    #[arg(short, long)]
    pull: bool,

    /// Exit after this many locations
    #[arg(short = 'n', long, value_name = "N")]
    count: Option<usize>,

    /// Verbose output (show debug info)
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (suppress connection messages)
    #[arg(short, long)]
    quiet: bool,
}

/// Client for the live push channel
struct LiveClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl LiveClient {
    /// Connect to the live endpoint
    async fn connect(address: &str) -> Result<Self> {
        let stream = TcpStream::connect(address)
            .await
            .with_context(|| format!("failed to connect to {}", address))?;
        let (reader, writer) = stream.into_split();

        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    /// Request the pull payload on this connection
    async fn pull(&mut self) -> Result<()> {
        self.writer
            .write_all(format!("{}\n", PULL_COMMAND).as_bytes())
            .await
            .context("failed to send pull request")
    }

    /// Receive the next line from the server
    ///
    /// Returns `Ok(None)` if the connection is closed.
    async fn recv(&mut self) -> Result<Option<String>> {
        self.lines
            .next_line()
            .await
            .context("failed to read from live channel")
    }
}

/// Run the tail command
pub async fn run(args: TailArgs) -> Result<()> {
    // Set up logging for tail command
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else if args.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    tracing::info!(address = %args.address, "connecting to relay");

    let mut client = LiveClient::connect(&args.address).await?;

    if args.pull {
        client.pull().await?;
    }

    tracing::info!("streaming locations (Ctrl+C to stop)");

    let mut received = 0usize;
    loop {
        tokio::select! {
            result = client.recv() => match result? {
                Some(line) => {
                    println!("{}", line);
                    // Pull replies are JSON; only pushed locations count
                    if !line.starts_with('{') {
                        received += 1;
                        if args.count.is_some_and(|n| received >= n) {
                            break;
                        }
                    }
                }
                None => {
                    tracing::info!("relay closed the connection");
                    break;
                }
            },

            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                break;
            }
        }
    }

    tracing::debug!(received, "tail finished");
    Ok(())
}
