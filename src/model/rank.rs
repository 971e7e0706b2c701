use crate::model::AggregateTable;
use serde::Serialize;
use std::cmp::Ordering;
use thiserror::Error;

/// One rendered line of the report: a URL and its statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub url: String,
    pub count: u64,
    pub count_perc: f64,
    pub time_sum: f64,
    pub time_perc: f64,
    pub time_avg: f64,
    pub time_max: f64,
    pub time_med: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    #[error("report size must be positive")]
    InvalidLimit,
}

/// Rank URLs by total request time, slowest first, keeping at most `limit`.
///
/// Equal `time_sum` values are ordered by URL ascending.
pub fn build_table(table: &AggregateTable, limit: usize) -> Result<Vec<ReportRow>, RankError> {
    if limit == 0 {
        return Err(RankError::InvalidLimit);
    }

    let mut ranked: Vec<(&String, _)> = table.iter().collect();
    ranked.sort_by(|(url_a, a), (url_b, b)| {
        b.time_sum
            .partial_cmp(&a.time_sum)
            .unwrap_or(Ordering::Equal)
            .then_with(|| url_a.cmp(url_b))
    });

    Ok(ranked
        .into_iter()
        .take(limit)
        .map(|(url, s)| ReportRow {
            url: url.clone(),
            count: s.count,
            count_perc: s.count_perc,
            time_sum: s.time_sum,
            time_perc: s.time_perc,
            time_avg: s.time_avg,
            time_max: s.time_max,
            time_med: s.time_med,
        })
        .collect())
}
