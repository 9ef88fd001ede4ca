// SPDX-License-Identifier: MIT

//! Picks the handler for a request from the first bytes of its text.
//!
//! Only two shapes are served: `POST` (raw upload) and `GET` (download). Matching is an exact,
//! case-sensitive prefix test on the decoded request: `post /x` ends in a 400, while `GETX /x`
//! is treated as a download.

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Upload,
    Serve,
    Invalid,
}

pub fn classify(request_text: &str) -> Route {
    let route = if request_text.starts_with("POST") {
        Route::Upload
    } else if request_text.starts_with("GET") {
        Route::Serve
    } else {
        Route::Invalid
    };
    debug!("Routing request as {route:?}");
    route
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("POST / HTTP/1.1\r\n\r\nabc"), Route::Upload);
        assert_eq!(classify("GET /uploads/a.jpg HTTP/1.1\r\n\r\n"), Route::Serve);
        assert_eq!(classify("PUT / HTTP/1.1\r\n\r\n"), Route::Invalid);
        assert_eq!(classify(""), Route::Invalid);
    }

    #[test]
    fn test_classify_is_case_sensitive_prefix() {
        assert_eq!(classify("get / HTTP/1.1"), Route::Invalid);
        assert_eq!(classify("Post / HTTP/1.1"), Route::Invalid);
        // Prefix only: anything after the method letters is not inspected.
        assert_eq!(classify("GETX / HTTP/1.1"), Route::Serve);
        assert_eq!(classify("POSTAL"), Route::Upload);
    }
}
