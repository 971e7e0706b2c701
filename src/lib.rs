//! nginx access-log analyzer: per-URL request-time statistics rendered as an
//! HTML report of the slowest endpoints.

pub mod config;
pub mod log;
pub mod logging;
pub mod model;
pub mod render;

pub type Result<T> = anyhow::Result<T>;
