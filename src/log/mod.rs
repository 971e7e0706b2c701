//! Access-log input: locating rotated files and parsing request lines.

pub mod parse;
pub mod row;
pub mod source;

pub use parse::LineParser;
pub use row::{LogRecord, ParseError};
pub use source::{LogFile, find_latest_log, open_log};
