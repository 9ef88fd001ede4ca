// SPDX-License-Identifier: MIT

//! Reassembles one request from a sequence of partial socket reads.
//!
//! The default boundary rule is "a read shorter than the chunk buffer ends the message".
//! It is an approximation, not a length-aware framer, and it has two known failure modes:
//! - a short read in the middle of a message (the peer's writes got split) ends it early,
//!   truncating the body;
//! - a message whose last read exactly fills the chunk buffer is not recognized as finished,
//!   so the reader waits for the read timeout (or the peer closing) before handling it.
//!
//! Both are kept as-is for compatibility with existing clients. `ContentLengthBoundary` is an
//! opt-in replacement that honours `Content-Length` when the client sends one.

use crate::frame::find_separator;
use clap::ValueEnum;
use log::{debug, trace};
use std::borrow::Cow;
use std::io::{self, ErrorKind, Read};

/// Size of the receive buffer used when nothing else is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Decides, after each read, whether the buffered bytes form a complete message.
pub trait MessageBoundary: Send + Sync {
    fn is_complete(&self, last_read: usize, buffered: &[u8]) -> bool;
}

/// Legacy rule: a read that did not fill the chunk buffer ends the message.
#[derive(Debug, Clone, Copy)]
pub struct ShortReadBoundary {
    pub chunk_size: usize,
}

impl MessageBoundary for ShortReadBoundary {
    fn is_complete(&self, last_read: usize, _buffered: &[u8]) -> bool {
        last_read < self.chunk_size
    }
}

/// Waits for `Content-Length` body bytes once the header block is buffered.
/// Without a separator or a usable `Content-Length` it behaves like `ShortReadBoundary`.
#[derive(Debug, Clone, Copy)]
pub struct ContentLengthBoundary {
    pub chunk_size: usize,
}

impl ContentLengthBoundary {
    fn declared_length(header_bytes: &[u8]) -> Option<usize> {
        String::from_utf8_lossy(header_bytes)
            .split("\r\n")
            .skip(1)
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse().ok())
    }
}

impl MessageBoundary for ContentLengthBoundary {
    fn is_complete(&self, last_read: usize, buffered: &[u8]) -> bool {
        if let Some(separator) = find_separator(buffered)
            && let Some(expected) = Self::declared_length(&buffered[..separator])
        {
            let body_len = buffered.len() - (separator + 4);
            trace!("Content-Length framing: {body_len}/{expected} body bytes buffered");
            return body_len >= expected;
        }
        last_read < self.chunk_size
    }
}

/// Which boundary rule the server frames requests with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Framing {
    #[default]
    ShortRead,
    ContentLength,
}

impl Framing {
    pub fn boundary(self, chunk_size: usize) -> Box<dyn MessageBoundary> {
        match self {
            Framing::ShortRead => Box::new(ShortReadBoundary { chunk_size }),
            Framing::ContentLength => Box::new(ContentLengthBoundary { chunk_size }),
        }
    }
}

/// The bytes received on one connection. Immutable once accumulation is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    data: Vec<u8>,
}

impl RawRequest {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The whole request decoded as text, invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

pub struct ByteAccumulator {
    chunk_size: usize,
    boundary: Box<dyn MessageBoundary>,
}

impl ByteAccumulator {
    pub fn new(chunk_size: usize, boundary: Box<dyn MessageBoundary>) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            boundary,
        }
    }

    pub fn with_framing(chunk_size: usize, framing: Framing) -> Self {
        Self::new(chunk_size, framing.boundary(chunk_size))
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Read until the boundary rule fires, the peer closes, or the read times out.
    /// A timeout is not an error: whatever arrived so far is the message.
    pub fn read_message<R: Read>(&self, stream: &mut R) -> io::Result<RawRequest> {
        let mut chunk = vec![0u8; self.chunk_size];
        let mut data = Vec::new();

        loop {
            let bytes_read = match stream.read(&mut chunk) {
                Ok(0) => {
                    trace!("Peer closed after {} bytes", data.len());
                    break;
                }
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    debug!(
                        "Read timed out with {} bytes buffered, treating as complete",
                        data.len()
                    );
                    break;
                }
                Err(e) => return Err(e),
            };

            debug!("Received Length: {bytes_read} bytes");
            data.extend_from_slice(&chunk[..bytes_read]);

            if self.boundary.is_complete(bytes_read, &data) {
                break;
            }
        }

        Ok(RawRequest::new(data))
    }
}
