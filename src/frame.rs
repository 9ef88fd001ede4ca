// SPDX-License-Identifier: MIT

//! Locates the header/body boundary inside an accumulated request and parses the header text.

use std::borrow::Cow;
use std::fmt;

/// `\r\n\r\n`, the end of the header block.
pub const SEPARATOR: [u8; 4] = [0x0D, 0x0A, 0x0D, 0x0A];

/// Index of the first separator in `bytes`, if any.
pub fn find_separator(bytes: &[u8]) -> Option<usize> {
    bytes.windows(SEPARATOR.len()).position(|window| window == SEPARATOR)
}

/// A view over a request whose header/body separator has been found.
#[derive(Debug, Clone, Copy)]
pub struct HeaderFrame<'a> {
    raw: &'a [u8],
    separator: usize,
}

impl<'a> HeaderFrame<'a> {
    /// Returns `None` when the bytes contain no separator.
    pub fn locate(raw: &'a [u8]) -> Option<Self> {
        find_separator(raw).map(|separator| Self { raw, separator })
    }

    pub fn header_bytes(&self) -> &'a [u8] {
        &self.raw[..self.separator]
    }

    pub fn header_text(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.header_bytes())
    }

    /// One past the separator.
    pub fn body_offset(&self) -> usize {
        self.separator + SEPARATOR.len()
    }

    pub fn body(&self) -> &'a [u8] {
        &self.raw[self.body_offset()..]
    }

    pub fn has_body(&self) -> bool {
        self.body_offset() < self.raw.len()
    }

    pub fn header_block(&self) -> HeaderBlock {
        HeaderBlock::parse(&self.header_text(), self.body_offset())
    }
}

/// Method, target and version as they appear in the first line. Missing parts are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split(' ');
        let mut next = || parts.next().unwrap_or_default().to_string();
        Self {
            method: next(),
            target: next(),
            version: next(),
        }
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.target, self.version)
    }
}

/// A header line that had no `": "` in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLineError {
    pub line_number: usize,
    pub line: String,
}

impl fmt::Display for HeaderLineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "header line {} has no \": \" separator: {:?}",
            self.line_number, self.line
        )
    }
}

/// Parsed header text. Names keep their case and headers keep arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    pub request_line: RequestLine,
    pub headers: Vec<(String, String)>,
    pub errors: Vec<HeaderLineError>,
    pub body_offset: usize,
}

impl HeaderBlock {
    pub fn parse(header_text: &str, body_offset: usize) -> Self {
        let mut lines = header_text.split("\r\n");
        let request_line = RequestLine::parse(lines.next().unwrap_or_default());

        let mut headers = Vec::new();
        let mut errors = Vec::new();
        for (index, line) in lines.enumerate() {
            if line.trim().is_empty() {
                break;
            }
            match line.split_once(": ") {
                Some((name, value)) => headers.push((name.to_string(), value.to_string())),
                None => errors.push(HeaderLineError {
                    line_number: index + 1,
                    line: line.to_string(),
                }),
            }
        }

        Self {
            request_line,
            headers,
            errors,
            body_offset,
        }
    }

    /// First value whose name matches exactly.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_positions() {
        let cases: [(&[u8], Option<usize>); 6] = [
            (b"\r\n\r\n", Some(0)),
            (b"GET / HTTP/1.1\r\n\r\n", Some(14)),
            (b"a\r\n\r\nb\r\n\r\nc", Some(1)),
            (b"\r\n\r", None),
            (b"no separator here\r\n", None),
            (b"", None),
        ];
        for (bytes, expected) in cases {
            assert_eq!(find_separator(bytes), expected, "{bytes:?}");
        }
    }

    #[test]
    fn test_frame_body_offset_and_header_text() {
        let raw = b"POST /upload HTTP/1.1\r\nHost: x\r\n\r\n\xFF\xD8\x00\x01";
        let frame = HeaderFrame::locate(raw).unwrap();
        let i = 30;
        assert_eq!(frame.body_offset(), i + 4);
        assert_eq!(frame.header_text(), "POST /upload HTTP/1.1\r\nHost: x");
        assert_eq!(frame.body(), b"\xFF\xD8\x00\x01");
        assert!(frame.has_body());
    }

    #[test]
    fn test_frame_body_may_contain_separator() {
        let raw = b"H\r\n\r\nbody\r\n\r\nmore";
        let frame = HeaderFrame::locate(raw).unwrap();
        assert_eq!(frame.header_text(), "H");
        assert_eq!(frame.body(), b"body\r\n\r\nmore");
    }

    #[test]
    fn test_frame_without_trailing_bytes() {
        let raw = b"POST / HTTP/1.1\r\n\r\n";
        let frame = HeaderFrame::locate(raw).unwrap();
        assert!(!frame.has_body());
        assert!(frame.body().is_empty());
    }

    #[test]
    fn test_missing_separator_never_panics() {
        let inputs: [&[u8]; 4] = [b"", b"\r", b"\r\n\r", b"GET / HTTP/1.1\r\nHost: x\r\n"];
        for raw in inputs {
            assert!(HeaderFrame::locate(raw).is_none());
        }
    }

    #[test]
    fn test_header_block_parse() {
        let text = "POST /upload HTTP/1.1\r\nHost: localhost:8080\r\nContent-Disposition: form-data; filename=\"a.jpg\"\r\nX-Odd: a: b";
        let block = HeaderBlock::parse(text, 99);
        assert_eq!(
            block.request_line,
            RequestLine {
                method: "POST".into(),
                target: "/upload".into(),
                version: "HTTP/1.1".into(),
            }
        );
        assert_eq!(block.headers.len(), 3);
        assert_eq!(block.headers[0].0, "Host");
        assert_eq!(block.get("X-Odd"), Some("a: b"));
        assert_eq!(block.get("host"), None);
        assert_eq!(block.body_offset, 99);
        assert!(block.errors.is_empty());
    }

    #[test]
    fn test_bad_header_line_is_collected_not_fatal() {
        let text = "GET / HTTP/1.1\r\nHost: x\r\nnot-a-header\r\nAccept: */*";
        let block = HeaderBlock::parse(text, 0);
        assert_eq!(block.headers.len(), 2);
        assert_eq!(
            block.errors,
            vec![HeaderLineError {
                line_number: 2,
                line: "not-a-header".into(),
            }]
        );
    }

    #[test]
    fn test_short_request_line() {
        let block = HeaderBlock::parse("BREW", 0);
        assert_eq!(block.request_line.method, "BREW");
        assert_eq!(block.request_line.target, "");
        assert_eq!(block.request_line.version, "");
    }
}
