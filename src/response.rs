// SPDX-License-Identifier: MIT

//! Response framing.
//!
//! Two wire shapes exist and are kept apart on purpose:
//! - `Text`: status line, `Content-Length` computed from the UTF-8 byte length, blank line, body.
//! - `Binary`: status line, `Content-Type`, blank line, raw bytes. No `Content-Length`; the
//!   client reads until the connection closes.

use crate::error::AppError;
use log::{debug, info};
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    InternalServerError,
}

impl Status {
    pub fn line(self) -> &'static str {
        match self {
            Status::Ok => "HTTP/1.1 200 OK",
            Status::BadRequest => "HTTP/1.1 400 Bad Request",
            Status::NotFound => "HTTP/1.1 404 Not Found",
            Status::InternalServerError => "HTTP/1.1 500 Internal Server Error",
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::InternalServerError => 500,
        }
    }
}

/// An outgoing message, built fresh for every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Text {
        status: Status,
        content: String,
    },
    Binary {
        status: Status,
        content_type: &'static str,
        body: Vec<u8>,
    },
}

impl Response {
    pub fn text<S: Into<String>>(status: Status, content: S) -> Self {
        Response::Text {
            status,
            content: content.into(),
        }
    }

    /// The file download shape. Content type is fixed regardless of what the file holds.
    pub fn jpeg(body: Vec<u8>) -> Self {
        Response::Binary {
            status: Status::Ok,
            content_type: "image/jpeg",
            body,
        }
    }

    pub fn from_error(error: &AppError) -> Self {
        Response::text(error.status(), error.response_text())
    }

    pub fn status(&self) -> Status {
        match self {
            Response::Text { status, .. } | Response::Binary { status, .. } => *status,
        }
    }

    /// Serialize the full message, head and body, into one buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Response::Text { status, content } => format!(
                "{}\r\nContent-Length: {}\r\n\r\n{}",
                status.line(),
                content.len(),
                content
            )
            .into_bytes(),
            Response::Binary {
                status,
                content_type,
                body,
            } => {
                let head = format!("{}\r\nContent-Type: {}\r\n\r\n", status.line(), content_type);
                let mut bytes = Vec::with_capacity(head.len() + body.len());
                bytes.extend_from_slice(head.as_bytes());
                bytes.extend_from_slice(body);
                bytes
            }
        }
    }

    /// Write the message to the client and flush. Returns the number of bytes written.
    pub fn send<W: Write>(&self, stream: &mut W, log_prefix: &str) -> io::Result<usize> {
        let status = self.status();
        info!("{log_prefix} {} {:?}", status.code(), status);

        let bytes = self.to_bytes();
        stream.write_all(&bytes)?;
        stream.flush()?;
        debug!("{log_prefix} Sent {} bytes", bytes.len());
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_framing_uses_byte_length() {
        let resp = Response::text(Status::Ok, "héllo");
        let wire = resp.to_bytes();
        assert_eq!(
            wire,
            "HTTP/1.1 200 OK\r\nContent-Length: 6\r\n\r\nhéllo".as_bytes()
        );
    }

    #[test]
    fn test_binary_framing_has_no_length() {
        let resp = Response::jpeg(vec![0xFF, 0xD8, 0x00, 0xFF]);
        let wire = resp.to_bytes();
        let head = b"HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\n\r\n";
        assert_eq!(&wire[..head.len()], head);
        assert_eq!(&wire[head.len()..], &[0xFF, 0xD8, 0x00, 0xFF]);
        assert!(!String::from_utf8_lossy(&wire).contains("Content-Length"));
    }

    #[test]
    fn test_error_responses() {
        let wire = Response::from_error(&AppError::MalformedRequest).to_bytes();
        assert_eq!(
            wire,
            b"HTTP/1.1 400 Bad Request\r\nContent-Length: 16\r\n\r\nInvalid Request."
        );

        let wire = Response::from_error(&AppError::NotFound).to_bytes();
        assert_eq!(
            wire,
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 19\r\n\r\nFile not found. QAQ"
        );

        let resp = Response::from_error(&AppError::persistence("read-only"));
        assert_eq!(resp.status(), Status::InternalServerError);
        let text = String::from_utf8(resp.to_bytes()).unwrap();
        assert!(text.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(text.ends_with("\r\n\r\nFailed to save file: read-only"));
    }

    #[test]
    fn test_send_writes_everything() {
        let mut sink = Vec::new();
        let resp = Response::text(Status::BadRequest, "Invalid file upload request.");
        let written = resp.send(&mut sink, "[test]").unwrap();
        assert_eq!(written, sink.len());
        assert_eq!(sink, resp.to_bytes());
    }
}
