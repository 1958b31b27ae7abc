//! Client command framing for the live push channel
//!
//! Clients send `\n`-terminated command lines. Lines are decoded from raw
//! bytes, so a bad line becomes a value instead of a stream error:
//!
//! - a line that is not UTF-8 decodes to `ClientCommand::Malformed`
//! - a line longer than the limit decodes to `ClientCommand::Malformed` as
//!   soon as the limit is passed, and the rest of it is dropped unbuffered
//!
//! Only socket I/O errors end the stream.

use std::io;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::server::PULL_COMMAND;

/// Longest accepted command line, excluding the terminator
pub const MAX_COMMAND_LENGTH: usize = 256;

/// A decoded client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Request the pull payload on this connection
    Pull,
    /// Any other well-formed line, trimmed
    Unknown(String),
    /// Not UTF-8, or over the length limit
    Malformed,
}

/// Bounded line decoder for client commands
#[derive(Debug)]
pub struct CommandCodec {
    max_length: usize,
    /// Bytes of the buffer already scanned for a terminator
    next_index: usize,
    /// Dropping the tail of an over-long line
    discarding: bool,
}

impl CommandCodec {
    /// Decoder with the default `MAX_COMMAND_LENGTH`
    pub fn new() -> Self {
        Self::with_max_length(MAX_COMMAND_LENGTH)
    }

    /// Decoder accepting lines up to `max_length` bytes
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }

    /// Longest accepted line
    #[inline]
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for CommandCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for CommandCodec {
    type Item = ClientCommand;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> io::Result<Option<ClientCommand>> {
        loop {
            if self.discarding {
                match buf.iter().position(|b| *b == b'\n') {
                    Some(end) => {
                        buf.advance(end + 1);
                        self.discarding = false;
                        continue;
                    }
                    None => {
                        buf.clear();
                        return Ok(None);
                    }
                }
            }

            let scan_to = buf.len().min(self.max_length.saturating_add(1));
            let terminator = buf[self.next_index..scan_to]
                .iter()
                .position(|b| *b == b'\n');

            return match terminator {
                Some(offset) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let line = buf.split_to(end + 1);
                    Ok(Some(parse_line(&line[..end])))
                }
                None if buf.len() > self.max_length => {
                    self.next_index = 0;
                    self.discarding = true;
                    Ok(Some(ClientCommand::Malformed))
                }
                None => {
                    self.next_index = scan_to;
                    Ok(None)
                }
            };
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> io::Result<Option<ClientCommand>> {
        if let Some(command) = self.decode(buf)? {
            return Ok(Some(command));
        }

        self.next_index = 0;
        if buf.is_empty() {
            return Ok(None);
        }

        // Final line without a terminator
        let line = buf.split_to(buf.len());
        Ok(Some(parse_line(&line)))
    }
}

fn parse_line(line: &[u8]) -> ClientCommand {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    match std::str::from_utf8(line) {
        Ok(text) if text.trim().eq_ignore_ascii_case(PULL_COMMAND) => ClientCommand::Pull,
        Ok(text) => ClientCommand::Unknown(text.trim().to_string()),
        Err(_) => ClientCommand::Malformed,
    }
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod tests;
