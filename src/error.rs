// SPDX-License-Identifier: MIT

use crate::response::Status;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    AddrParse(std::net::AddrParseError),
    DirectoryNotFound(String),
    InvalidConfiguration(String), // Contains configuration error details
    // Request-level errors, each surfaced to the client as a framed response
    MalformedRequest,     // Unknown method or missing request target
    InvalidUpload,        // No header/body separator, or nothing after it
    NotFound,             // GET target is not a regular file
    Persistence(String),  // Contains the underlying write failure description
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "IO error: {err}"),
            AppError::AddrParse(err) => write!(f, "Address parse error: {err}"),
            AppError::DirectoryNotFound(path) => write!(f, "Directory not found: {path}"),
            AppError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {msg}"),
            AppError::MalformedRequest => write!(f, "Malformed request"),
            AppError::InvalidUpload => write!(f, "Upload request has no body"),
            AppError::NotFound => write!(f, "Not Found"),
            AppError::Persistence(msg) => write!(f, "Failed to persist upload: {msg}"),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<std::net::AddrParseError> for AppError {
    fn from(err: std::net::AddrParseError) -> Self {
        AppError::AddrParse(err)
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Creates a Persistence error from whatever the filesystem reported
    pub fn persistence<E: fmt::Display>(err: E) -> Self {
        AppError::Persistence(err.to_string())
    }

    /// Status that a client sees when this error ends request handling
    pub fn status(&self) -> Status {
        match self {
            AppError::MalformedRequest | AppError::InvalidUpload => Status::BadRequest,
            AppError::NotFound => Status::NotFound,
            _ => Status::InternalServerError,
        }
    }

    /// Fixed body text sent back for this error
    pub fn response_text(&self) -> String {
        match self {
            AppError::MalformedRequest => "Invalid Request.".to_string(),
            AppError::InvalidUpload => "Invalid file upload request.".to_string(),
            AppError::NotFound => "File not found. QAQ".to_string(),
            AppError::Persistence(msg) => format!("Failed to save file: {msg}"),
            other => format!("Internal error: {other}"),
        }
    }

    /// Checks if the error belongs to a single request rather than the server
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            AppError::MalformedRequest
                | AppError::InvalidUpload
                | AppError::NotFound
                | AppError::Persistence(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text() {
        let errors = [
            AppError::MalformedRequest,
            AppError::InvalidUpload,
            AppError::NotFound,
            AppError::persistence("disk full"),
        ];

        let expected = [
            "Invalid Request.",
            "Invalid file upload request.",
            "File not found. QAQ",
            "Failed to save file: disk full",
        ];

        for (error, expected_msg) in errors.iter().zip(expected.iter()) {
            assert_eq!(error.response_text(), *expected_msg);
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::MalformedRequest.status(), Status::BadRequest);
        assert_eq!(AppError::InvalidUpload.status(), Status::BadRequest);
        assert_eq!(AppError::NotFound.status(), Status::NotFound);
        assert_eq!(
            AppError::persistence("x").status(),
            Status::InternalServerError
        );
        let io = AppError::from(std::io::Error::other("boom"));
        assert_eq!(io.status(), Status::InternalServerError);
    }

    #[test]
    fn test_is_request_error() {
        let request_errors = vec![
            AppError::MalformedRequest,
            AppError::InvalidUpload,
            AppError::NotFound,
            AppError::persistence("test"),
        ];

        let server_errors = vec![
            AppError::DirectoryNotFound("/nope".to_string()),
            AppError::InvalidConfiguration("test".to_string()),
        ];

        for error in request_errors {
            assert!(
                error.is_request_error(),
                "Expected {error} to be a request error"
            );
        }

        for error in server_errors {
            assert!(
                !error.is_request_error(),
                "Expected {error} to not be a request error"
            );
        }
    }

    #[test]
    fn test_error_trait_implementation() {
        let error = AppError::NotFound;
        let _: &dyn std::error::Error = &error;
    }
}
