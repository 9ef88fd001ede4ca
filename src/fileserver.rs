// SPDX-License-Identifier: MIT

//! GET handling: read a file from disk and send it back whole.

use crate::config::Config;
use crate::error::AppError;
use crate::response::Response;
use crate::storage::FileStore;
use log::{debug, info};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// The second space-delimited token of the request line.
pub fn request_target(request_text: &str) -> Option<&str> {
    let request_line = request_text.split("\r\n").next()?;
    request_line.split(' ').nth(1)
}

/// Resolve `..` lexically, refusing to climb above the starting point.
fn normalize_path(path: &Path) -> Option<PathBuf> {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(name) => components.push(name),
            Component::ParentDir => {
                components.pop()?;
            }
            _ => {}
        }
    }
    Some(components.iter().collect())
}

pub struct FileServer {
    store: Arc<dyn FileStore>,
    root: PathBuf,
    upload_root: PathBuf,
    confine_paths: bool,
}

impl FileServer {
    pub fn new(config: &Config, store: Arc<dyn FileStore>) -> Self {
        Self {
            store,
            root: config.root.clone(),
            upload_root: config.upload_root(),
            confine_paths: config.confine_paths,
        }
    }

    /// Map a request target to a path on disk.
    ///
    /// Exactly one leading `/` is stripped and the rest is joined onto the serving root as-is.
    /// With `confine_paths` the result must also land inside the upload directory.
    pub fn resolve(&self, target: &str) -> Option<PathBuf> {
        let relative = target.strip_prefix('/').unwrap_or(target);
        if !self.confine_paths {
            return Some(self.root.join(relative));
        }

        let full_path = self.root.join(normalize_path(Path::new(relative))?);
        if full_path.starts_with(&self.upload_root) {
            Some(full_path)
        } else {
            debug!("Refusing {target}: outside {}", self.upload_root.display());
            None
        }
    }

    pub fn handle(&self, request_text: &str) -> Result<Response, AppError> {
        let target = request_target(request_text).ok_or(AppError::MalformedRequest)?;
        let path = self.resolve(target).ok_or(AppError::NotFound)?;

        if !self.store.is_file(&path) {
            debug!("No file at {}", path.display());
            return Err(AppError::NotFound);
        }

        let bytes = self.store.read_all_bytes(&path)?;
        info!("Serving {} ({} bytes)", path.display(), bytes.len());
        Ok(Response::jpeg(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DiskStore;
    use tempfile::{TempDir, tempdir};

    fn server_in(dir: &TempDir, confine_paths: bool) -> FileServer {
        let config = Config {
            root: dir.path().to_path_buf(),
            confine_paths,
            ..Config::default()
        };
        std::fs::create_dir_all(config.upload_root()).unwrap();
        FileServer::new(&config, Arc::new(DiskStore))
    }

    #[test]
    fn test_request_target() {
        assert_eq!(
            request_target("GET /uploads/a.jpg HTTP/1.1\r\nHost: x\r\n\r\n"),
            Some("/uploads/a.jpg")
        );
        assert_eq!(request_target("GET /a\r\nHost: b c\r\n\r\n"), Some("/a"));
        assert_eq!(request_target("GET"), None);
    }

    #[test]
    fn test_resolve_strips_one_slash() {
        let dir = tempdir().unwrap();
        let server = server_in(&dir, false);
        assert_eq!(
            server.resolve("/uploads/a.jpg"),
            Some(dir.path().join("uploads/a.jpg"))
        );
        assert_eq!(server.resolve("/"), Some(dir.path().join("")));
        // Legacy behaviour: nothing stops a target from leaving the upload directory.
        assert_eq!(
            server.resolve("/../secret"),
            Some(dir.path().join("../secret"))
        );
    }

    #[test]
    fn test_confined_resolve() {
        let dir = tempdir().unwrap();
        let server = server_in(&dir, true);
        assert_eq!(
            server.resolve("/uploads/./a.jpg"),
            Some(dir.path().join("uploads").join("a.jpg"))
        );
        assert_eq!(server.resolve("/uploads/../secret.txt"), None);
        assert_eq!(server.resolve("/../../etc/passwd"), None);
        assert_eq!(server.resolve("/Cargo.toml"), None);
    }

    #[test]
    fn test_serves_existing_file() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("uploads")).unwrap();
        std::fs::write(dir.path().join("uploads/x.jpg"), [1u8, 2, 3]).unwrap();
        let server = server_in(&dir, false);

        let response = server
            .handle("GET /uploads/x.jpg HTTP/1.1\r\n\r\n")
            .unwrap();
        assert_eq!(response, Response::jpeg(vec![1, 2, 3]));
    }

    #[test]
    fn test_missing_file_and_directory_are_not_found() {
        let dir = tempdir().unwrap();
        let server = server_in(&dir, false);
        for request in [
            "GET /uploads/nope.jpg HTTP/1.1\r\n\r\n",
            "GET /uploads HTTP/1.1\r\n\r\n",
            "GET / HTTP/1.1\r\n\r\n",
        ] {
            assert!(matches!(server.handle(request), Err(AppError::NotFound)));
        }
    }

    #[test]
    fn test_missing_target_is_malformed() {
        let dir = tempdir().unwrap();
        let server = server_in(&dir, false);
        assert!(matches!(
            server.handle("GET\r\n\r\n"),
            Err(AppError::MalformedRequest)
        ));
    }
}
