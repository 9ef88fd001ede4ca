// SPDX-License-Identifier: MIT

//! Raw-body image uploads.
//!
//! A POST carries the file bytes directly after the header block (no multipart envelope).
//! The target name comes from the `filename=` parameter of a `Content-Disposition` header,
//! falling back to `unnamed.jpg`. Existing files with the same name are overwritten.
//!
//! Unless `confine_paths` is enabled the name is used as given, so a client can write outside
//! the upload directory with a name such as `../x`. Enabling it keeps only the last path
//! component.

use crate::accumulator::RawRequest;
use crate::config::Config;
use crate::error::AppError;
use crate::frame::HeaderFrame;
use crate::response::{Response, Status};
use crate::storage::FileStore;
use log::{debug, info, warn};
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;

/// Name used when the request does not carry one.
pub const DEFAULT_FILENAME: &str = "unnamed.jpg";

/// Pull the `filename=` value out of the first `Content-Disposition` header that has one.
///
/// ```
/// use imgdrop::upload::filename_from_headers;
///
/// let headers = "POST / HTTP/1.1\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cat.jpg\"";
/// assert_eq!(filename_from_headers(headers).as_deref(), Some("cat.jpg"));
/// assert_eq!(filename_from_headers("POST / HTTP/1.1\r\nHost: x"), None);
/// ```
pub fn filename_from_headers(header_text: &str) -> Option<String> {
    header_text
        .split("\r\n")
        .filter(|line| line.trim().starts_with("Content-Disposition"))
        .find_map(|line| {
            line.split(';')
                .find(|segment| segment.trim().starts_with("filename="))
                .and_then(|segment| segment.split_once('='))
                .map(|(_, value)| value.trim().trim_matches('"').to_string())
        })
}

/// Reduce a client supplied name to a bare file name.
fn bare_name(name: &str) -> &str {
    match name.rsplit(['/', '\\']).next() {
        Some(last) if !last.is_empty() && last != "." && last != ".." => last,
        _ => DEFAULT_FILENAME,
    }
}

/// Where an upload goes and which bytes of the request it consists of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub filename: String,
    pub body: Range<usize>,
}

impl UploadTarget {
    pub fn from_frame(frame: &HeaderFrame<'_>, total_len: usize, confine: bool) -> Self {
        let requested =
            filename_from_headers(&frame.header_text()).unwrap_or_else(|| DEFAULT_FILENAME.into());
        let filename = if confine {
            let bare = bare_name(&requested);
            if bare != requested {
                warn!("Upload filename {requested:?} reduced to {bare:?}");
            }
            bare.to_string()
        } else {
            requested
        };

        Self {
            filename,
            body: frame.body_offset()..total_len,
        }
    }
}

pub struct UploadHandler {
    store: Arc<dyn FileStore>,
    upload_root: PathBuf,
    public_base: String,
    confine_paths: bool,
}

impl UploadHandler {
    pub fn new(config: &Config, store: Arc<dyn FileStore>) -> Self {
        Self {
            store,
            upload_root: config.upload_root(),
            public_base: format!("http://{}/{}", config.public_host, config.upload_dir),
            confine_paths: config.confine_paths,
        }
    }

    /// Public URL a stored file can be fetched from.
    pub fn file_url(&self, filename: &str) -> String {
        format!("{}/{}", self.public_base, filename)
    }

    /// Persist the request body and describe where it can be fetched.
    pub fn handle(&self, raw: &RawRequest) -> Result<Response, AppError> {
        let frame = HeaderFrame::locate(raw.as_bytes()).ok_or(AppError::InvalidUpload)?;
        if !frame.has_body() {
            debug!("Upload has no bytes after the header block");
            return Err(AppError::InvalidUpload);
        }

        let target = UploadTarget::from_frame(&frame, raw.len(), self.confine_paths);
        let path = self.upload_root.join(&target.filename);
        let bytes = &raw.as_bytes()[target.body.clone()];

        self.store
            .write_all_bytes(&path, bytes)
            .map_err(AppError::persistence)?;

        info!(
            "Saved upload {} ({} bytes) to {}",
            target.filename,
            bytes.len(),
            path.display()
        );

        let url = self.file_url(&target.filename);
        Ok(Response::text(
            Status::Ok,
            format!("File uploaded successfully! Access it at {url}"),
        ))
    }
}
