// SPDX-License-Identifier: MIT

//! Hook invoked once a request's header block has been located.
//!
//! The server installs [`LogObserver`], which replays the parsed request line and headers
//! through `log`. Tests swap in their own implementation to inspect what was parsed.

use crate::frame::HeaderBlock;
use log::{Level, debug, log_enabled, trace, warn};

pub trait RequestObserver: Send + Sync {
    fn on_framed(&self, block: &HeaderBlock, body: &[u8]);
}

/// Dumps every framed request at `debug`, body text at `trace`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RequestObserver for LogObserver {
    fn on_framed(&self, block: &HeaderBlock, body: &[u8]) {
        for error in &block.errors {
            warn!("Skipping malformed {error}");
        }
        if !log_enabled!(Level::Debug) {
            return;
        }

        debug!("Request: {}", block.request_line);
        for (name, value) in &block.headers {
            debug!("{name}: {value}");
        }
        debug!("Body: {} bytes at offset {}", body.len(), block.body_offset);
        trace!("Body text:\n{}", String::from_utf8_lossy(body));
    }
}

/// Does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {
    fn on_framed(&self, _block: &HeaderBlock, _body: &[u8]) {}
}
