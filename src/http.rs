// SPDX-License-Identifier: MIT

//! Handles one connection from first byte to last: accumulate, frame, route, respond.

use crate::accumulator::{ByteAccumulator, RawRequest};
use crate::config::Config;
use crate::error::AppError;
use crate::fileserver::FileServer;
use crate::frame::HeaderFrame;
use crate::observer::{LogObserver, RequestObserver};
use crate::response::Response;
use crate::router::{Route, classify};
use crate::storage::{DiskStore, FileStore};
use crate::upload::UploadHandler;
use log::{debug, error, info, warn};
use std::io::{Read, Write};
use std::sync::Arc;

/// Everything needed to answer a request, built once at startup.
pub struct Handler {
    accumulator: ByteAccumulator,
    uploads: UploadHandler,
    files: FileServer,
    observer: Box<dyn RequestObserver>,
}

impl Handler {
    pub fn new(config: &Config) -> Self {
        Self::with_parts(config, Arc::new(DiskStore), Box::new(LogObserver))
    }

    pub fn with_parts(
        config: &Config,
        store: Arc<dyn FileStore>,
        observer: Box<dyn RequestObserver>,
    ) -> Self {
        Self {
            accumulator: ByteAccumulator::with_framing(config.chunk_size, config.framing),
            uploads: UploadHandler::new(config, Arc::clone(&store)),
            files: FileServer::new(config, store),
            observer,
        }
    }

    /// Build the response for an already accumulated request. Never fails: every error
    /// becomes a framed error response.
    pub fn respond(&self, raw: &RawRequest) -> Response {
        if let Some(frame) = HeaderFrame::locate(raw.as_bytes()) {
            self.observer.on_framed(&frame.header_block(), frame.body());
        }

        let text = raw.text();
        let result = match classify(&text) {
            Route::Upload => {
                info!("Received a POST request");
                self.uploads.handle(raw)
            }
            Route::Serve => {
                info!("Received a GET request");
                self.files.handle(&text)
            }
            Route::Invalid => Err(AppError::MalformedRequest),
        };

        result.unwrap_or_else(|e| {
            if e.is_request_error() {
                warn!("Request failed: {e}");
            } else {
                error!("Request failed: {e}");
            }
            Response::from_error(&e)
        })
    }

    /// Read one request from `stream` and write the response back. Closing the stream is left
    /// to the caller. Returns the number of response bytes written.
    pub fn handle_connection<S: Read + Write>(
        &self,
        stream: &mut S,
        log_prefix: &str,
    ) -> Result<usize, AppError> {
        let raw = self.accumulator.read_message(stream)?;
        debug!("{log_prefix} Request complete: {} bytes", raw.len());

        let response = self.respond(&raw);
        Ok(response.send(stream, log_prefix)?)
    }
}
