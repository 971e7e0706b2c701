use crate::log::row::{LogRecord, ParseError};
use regex::Regex;

/// Largest accepted `$request_time`, seconds. Anything above is a corrupt
/// field, and summing such values could overflow to infinity.
pub const MAX_REQUEST_TIME: f64 = 1e9;

/// Parser for nginx `ui_short` access-log lines.
///
/// Expected format (only the request field and the last column matter):
/// $remote_addr $remote_user $http_x_real_ip [$time_local] "$request"
/// $status $body_bytes_sent "$http_referer" "$http_user_agent"
/// "$http_x_forwarded_for" "$http_X_REQUEST_ID" "$http_X_RB_USER" $request_time
///
/// Example:
/// 1.196.116.32 -  - [29/Jun/2017:03:50:22 +0300] "GET /api/v2/banner/25019354 HTTP/1.1" 200 927 "-" "Lynx/2.8.8dev.9" "-" "1498697422-2190034393-4708-9752759" "dc7161be3" 0.390
///
/// Only `GET` requests over HTTP/1.1 are recognized; any other method is a
/// parse failure.
#[derive(Debug, Clone)]
pub struct LineParser {
    request_re: Regex,
}

impl LineParser {
    pub fn new() -> anyhow::Result<Self> {
        // The request is the first quoted field; url runs from "GET " to the
        // first following " HTTP/1.1" inside it.
        let request_re = Regex::new(r#"^[^"]*"GET ([^"]*?) HTTP/1\.1""#)?;
        Ok(Self { request_re })
    }

    /// Extract `(url, request_time)` from one raw line. Total: every input
    /// yields either a record or a `ParseError`.
    pub fn parse<'a>(&self, line: &'a str) -> Result<LogRecord<'a>, ParseError> {
        let url = self
            .request_re
            .captures(line)
            .and_then(|caps| caps.get(1))
            .ok_or(ParseError::MissingRequest)?
            .as_str();
        if url.is_empty() {
            return Err(ParseError::EmptyUrl);
        }

        let last = line
            .split_whitespace()
            .next_back()
            .ok_or(ParseError::MissingRequestTime)?;
        let request_time: f64 = last
            .parse()
            .map_err(|_| ParseError::BadRequestTime(last.to_string()))?;
        if !(0.0..=MAX_REQUEST_TIME).contains(&request_time) {
            return Err(ParseError::BadRequestTime(last.to_string()));
        }

        Ok(LogRecord { url, request_time })
    }
}
