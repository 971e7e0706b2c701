use thiserror::Error;

/// A single successfully parsed access-log request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord<'a> {
    pub url: &'a str,
    /// Server-side processing time, seconds.
    pub request_time: f64,
}

/// Why a line was not usable. Absorbed by the aggregator, never surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no `GET <url> HTTP/1.1` request field")]
    MissingRequest,
    #[error("empty url in request field")]
    EmptyUrl,
    #[error("line has no trailing request time")]
    MissingRequestTime,
    #[error("bad request time {0:?}")]
    BadRequestTime(String),
}
