// SPDX-License-Identifier: MIT

//! Filesystem access used by the upload and download paths.

use log::{debug, trace};
use std::fs;
use std::io;
use std::path::Path;

/// The three filesystem operations request handling needs.
pub trait FileStore: Send + Sync {
    /// Create or truncate `path` and write `bytes` to it.
    fn write_all_bytes(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
    fn read_all_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;
    /// True only for an existing regular file.
    fn is_file(&self, path: &Path) -> bool;
}

/// `std::fs` backed store.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskStore;

impl FileStore for DiskStore {
    fn write_all_bytes(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        trace!("Writing {} bytes to {}", bytes.len(), path.display());
        fs::write(path, bytes)
    }

    fn read_all_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        trace!("Reading {}", path.display());
        fs::read(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Make sure the upload directory exists before the server accepts anything.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.is_dir() {
        debug!("Creating upload directory {}", path.display());
        fs::create_dir_all(path)?;
    }
    Ok(())
}
