//! TCP server for the live push channel
//!
//! `LiveServer` accepts listener connections and streams every pushed
//! location to each of them.
//!
//! # Protocol
//!
//! Line-oriented UTF-8 text, `\n` terminated.
//!
//! Server → Client:
//! - `<lat>,<lng>` - a location update, verbatim as delivered by the broker
//! - `{"location": ...}` / `{"error": ...}` - pull payload, only in reply to `PULL`
//!
//! Client → Server:
//! - `PULL` - request the current location on this connection
//!
//! Other client lines are ignored. A line that is not UTF-8 or is longer
//! than `MAX_COMMAND_LENGTH` is answered with the processing-failure payload
//! and the connection stays subscribed.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broadcaster::LiveBroadcaster;
use crate::codec::{ClientCommand, CommandCodec};
use crate::error::{Result, TapError};
use crate::pull::PullResponse;

/// Client command requesting the pull payload
pub const PULL_COMMAND: &str = "PULL";

/// TCP server for live listeners
pub struct LiveServer {
    listener: TcpListener,
    broadcaster: Arc<LiveBroadcaster>,
}

impl LiveServer {
    /// Bind the live endpoint
    pub async fn bind(address: &str, broadcaster: Arc<LiveBroadcaster>) -> Result<Self> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| TapError::Bind {
                address: address.to_string(),
                source: e,
            })?;
        Ok(Self {
            listener,
            broadcaster,
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until cancelled
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        info!(address = %self.local_addr()?, "live push channel listening");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let broadcaster = Arc::clone(&self.broadcaster);
                        let cancel = cancel.clone();

                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, broadcaster, cancel).await {
                                debug!(error = %e, %peer, "listener connection ended");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "failed to accept connection");
                    }
                },
            }
        }

        info!("live push channel stopped");
        Ok(())
    }
}

/// Handle a single listener connection
async fn handle_connection(
    stream: TcpStream,
    broadcaster: Arc<LiveBroadcaster>,
    cancel: CancellationToken,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();

    let (listener_id, mut receiver) = match broadcaster.register() {
        Ok(registered) => registered,
        Err(e) => {
            warn!(error = %e, "rejecting live listener");
            return Err(e);
        }
    };

    info!(listener_id, "live listener connected");

    let mut commands = FramedRead::new(reader, CommandCodec::new());

    let result = async {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                location = receiver.recv() => {
                    let Some(location) = location else { break };
                    write_line(&mut writer, location.as_str()).await?;
                }

                command = commands.next() => match command {
                    Some(Ok(ClientCommand::Pull)) => {
                        write_line(&mut writer, &broadcaster.pull().to_json()).await?;
                    }
                    Some(Ok(ClientCommand::Unknown(line))) => {
                        debug!(listener_id, line = %line, "ignoring unknown command");
                    }
                    Some(Ok(ClientCommand::Malformed)) => {
                        debug!(listener_id, "malformed command line");
                        write_line(&mut writer, &PullResponse::failed().to_json()).await?;
                    }
                    Some(Err(e)) => return Err(TapError::Io(e)),
                    // Client closed its side
                    None => break,
                },
            }
        }
        Ok::<_, TapError>(())
    }
    .await;

    // Clean up
    let _ = broadcaster.deregister(listener_id);
    info!(listener_id, "live listener disconnected");

    result
}

async fn write_line(writer: &mut OwnedWriteHalf, text: &str) -> std::io::Result<()> {
    let mut line = String::with_capacity(text.len() + 1);
    line.push_str(text);
    line.push('\n');
    writer.write_all(line.as_bytes()).await
}

#[cfg(test)]
#[path = "server_test.rs"]
mod tests;
