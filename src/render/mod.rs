//! Report output: HTML rendering, report file naming and the timestamp marker.

pub mod html;
pub mod ts;

pub use html::{DEFAULT_TEMPLATE, render_report};
pub use ts::write_ts;

use anyhow::Context;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// `report-YYYY.MM.DD.html` for the log of `date`.
pub fn report_path(report_dir: &Path, date: NaiveDate) -> PathBuf {
    report_dir.join(format!("report-{}.html", date.format("%Y.%m.%d")))
}

/// Write through a temporary sibling and rename, so the final name only
/// ever holds a complete report.
pub fn write_report(path: &Path, html: &str) -> anyhow::Result<()> {
    let tmp = path.with_extension("html.tmp");
    fs::write(&tmp, html).with_context(|| format!("write report {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} to {}", tmp.display(), path.display()))?;
    Ok(())
}
