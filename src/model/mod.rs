//! Aggregation model: fold parsed access-log lines into per-URL statistics.

pub mod rank;

pub use rank::{RankError, ReportRow, build_table};

use crate::log::LineParser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::debug;

/// Lines seen before the error-rate check is allowed to trip.
pub const ERROR_CHECK_WARMUP_LINES: u64 = 100;

/// Finished statistics for one URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlStats {
    pub count: u64,
    /// Share of all parsed requests, in [0, 1].
    pub count_perc: f64,
    pub time_sum: f64,
    /// Share of total request time, in [0, 1].
    pub time_perc: f64,
    pub time_avg: f64,
    pub time_max: f64,
    /// Approximate median: this is the running mean, not a true median.
    pub time_med: f64,
}

pub type AggregateTable = BTreeMap<String, UrlStats>;

/// Result of one full pass over a log.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub table: AggregateTable,
    pub total_lines: u64,
    pub parsed_lines: u64,
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(
        "too many parse errors: {failed_lines} of {total_lines} lines unparsed \
         (limit {threshold_percent}%), perhaps the log format has changed"
    )]
    TooManyParseErrors {
        total_lines: u64,
        failed_lines: u64,
        threshold_percent: u8,
    },
    #[error("read log line {line}")]
    Read {
        line: u64,
        #[source]
        source: io::Error,
    },
}

/// Per-URL state while the pass is running. Shares are only known at the end.
#[derive(Debug, Clone, Default)]
struct RunningStats {
    count: u64,
    time_sum: f64,
    time_avg: f64,
    time_max: f64,
}

impl RunningStats {
    fn record(&mut self, request_time: f64) {
        self.count += 1;
        self.time_sum += request_time;
        self.time_avg += (request_time - self.time_avg) / self.count as f64;
        self.time_max = self.time_max.max(request_time);
    }
}

/// Single-pass streaming aggregator with an error-rate circuit breaker.
#[derive(Debug)]
pub struct Aggregator {
    parser: LineParser,
    errors_percent: u8,
    urls: BTreeMap<String, RunningStats>,
    total_lines: u64,
    parsed_lines: u64,
}

impl Aggregator {
    pub fn new(parser: LineParser, errors_percent: u8) -> Self {
        Self {
            parser,
            errors_percent,
            urls: BTreeMap::new(),
            total_lines: 0,
            parsed_lines: 0,
        }
    }

    /// Feed one raw line. Fails only when the unparsed share exceeds the
    /// configured threshold after the warm-up; the aggregator must then be
    /// discarded.
    pub fn push(&mut self, line: &str) -> Result<(), AggregateError> {
        self.total_lines += 1;

        match self.parser.parse(line) {
            Ok(rec) => {
                self.parsed_lines += 1;
                match self.urls.get_mut(rec.url) {
                    Some(stats) => stats.record(rec.request_time),
                    None => {
                        let mut stats = RunningStats::default();
                        stats.record(rec.request_time);
                        self.urls.insert(rec.url.to_string(), stats);
                    }
                }
                Ok(())
            }
            Err(e) => {
                debug!("line {}: {}", self.total_lines, e);
                self.check_error_rate()
            }
        }
    }

    fn check_error_rate(&self) -> Result<(), AggregateError> {
        if self.total_lines <= ERROR_CHECK_WARMUP_LINES {
            return Ok(());
        }
        let failed_lines = self.total_lines - self.parsed_lines;
        // failed / total * 100 > threshold, kept in integers.
        if failed_lines * 100 > u64::from(self.errors_percent) * self.total_lines {
            return Err(AggregateError::TooManyParseErrors {
                total_lines: self.total_lines,
                failed_lines,
                threshold_percent: self.errors_percent,
            });
        }
        Ok(())
    }

    /// Close the pass and compute corpus-relative shares.
    pub fn finish(self) -> Aggregate {
        let count_total: u64 = self.urls.values().map(|s| s.count).sum();
        let time_sum_total: f64 = self.urls.values().map(|s| s.time_sum).sum();

        let table = self
            .urls
            .into_iter()
            .map(|(url, s)| {
                let count_perc = s.count as f64 / count_total as f64;
                let time_perc = if time_sum_total > 0.0 {
                    s.time_sum / time_sum_total
                } else {
                    0.0
                };
                let stats = UrlStats {
                    count: s.count,
                    count_perc,
                    time_sum: s.time_sum,
                    time_perc,
                    time_avg: s.time_avg,
                    time_max: s.time_max,
                    time_med: s.time_avg,
                };
                (url, stats)
            })
            .collect();

        Aggregate {
            table,
            total_lines: self.total_lines,
            parsed_lines: self.parsed_lines,
        }
    }
}

/// Aggregate an in-memory line sequence.
pub fn aggregate<I, S>(
    parser: LineParser,
    lines: I,
    errors_percent: u8,
) -> Result<Aggregate, AggregateError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut agg = Aggregator::new(parser, errors_percent);
    for line in lines {
        agg.push(line.as_ref())?;
    }
    Ok(agg.finish())
}

/// Aggregate lines read from `reader`. Bytes that are not valid UTF-8 are
/// replaced rather than rejected, so they only affect the line they are on.
pub fn aggregate_reader<R: BufRead>(
    parser: LineParser,
    mut reader: R,
    errors_percent: u8,
) -> Result<Aggregate, AggregateError> {
    let mut agg = Aggregator::new(parser, errors_percent);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| AggregateError::Read {
                line: agg.total_lines + 1,
                source,
            })?;
        if n == 0 {
            break;
        }
        agg.push(&String::from_utf8_lossy(&buf))?;
    }
    Ok(agg.finish())
}
