//! Locating and opening rotated nginx access logs.
//!
//! Rotated files are named `nginx-access-ui.log-YYYYMMDD`, optionally with a
//! `.gz` suffix. Only the newest one is analyzed per run.

use anyhow::Context;
use chrono::NaiveDate;
use flate2::read::MultiGzDecoder;
use regex::Regex;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    pub date: NaiveDate,
    pub compressed: bool,
}

/// Find the rotated log with the most recent date in `log_dir`.
///
/// Names whose date part is not a real calendar date are ignored. When a
/// plain and a `.gz` file share a date, the plain one wins.
pub fn find_latest_log(log_dir: &Path) -> anyhow::Result<Option<LogFile>> {
    let re = Regex::new(r"^nginx-access-ui\.log-(\d{8})(\.gz)?$")?;

    let entries = fs::read_dir(log_dir)
        .with_context(|| format!("read log dir {}", log_dir.display()))?;

    let mut latest: Option<LogFile> = None;
    for entry in entries {
        let entry = entry.with_context(|| format!("read log dir {}", log_dir.display()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(caps) = re.captures(name) else {
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(&caps[1], "%Y%m%d") else {
            debug!("skipping {}: not a valid date", name);
            continue;
        };
        let candidate = LogFile {
            path: entry.path(),
            date,
            compressed: caps.get(2).is_some(),
        };

        let newer = match &latest {
            None => true,
            Some(cur) => (candidate.date, !candidate.compressed) > (cur.date, !cur.compressed),
        };
        if newer {
            latest = Some(candidate);
        }
    }

    Ok(latest)
}

/// Open a log for line-by-line reading, transparently decompressing `.gz`.
pub fn open_log(log: &LogFile) -> anyhow::Result<Box<dyn BufRead>> {
    let file =
        File::open(&log.path).with_context(|| format!("open log file {}", log.path.display()))?;
    if log.compressed {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn picks_most_recent_date() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "nginx-access-ui.log-20170630.gz");
        touch(dir.path(), "nginx-access-ui.log-20170701");
        touch(dir.path(), "nginx-access-ui.log-20170629");
        touch(dir.path(), "nginx-access-ui.log-20180101.bz2");
        touch(dir.path(), "nginx-access-ui.log-20171399");
        touch(dir.path(), "apache-access.log-20190101");

        let latest = find_latest_log(dir.path()).unwrap().unwrap();
        assert_eq!(
            latest,
            LogFile {
                path: dir.path().join("nginx-access-ui.log-20170701"),
                date: NaiveDate::from_ymd_opt(2017, 7, 1).unwrap(),
                compressed: false,
            }
        );
    }

    #[test]
    fn plain_wins_over_gz_on_same_date() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "nginx-access-ui.log-20170630.gz");
        touch(dir.path(), "nginx-access-ui.log-20170630");

        let latest = find_latest_log(dir.path()).unwrap().unwrap();
        assert!(!latest.compressed);
    }

    #[test]
    fn empty_dir_has_no_log() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_latest_log(dir.path()).unwrap(), None);
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_latest_log(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn reads_gzip_and_plain_alike() {
        let dir = tempfile::tempdir().unwrap();
        let body = "line one\nline two\n";

        let plain = dir.path().join("nginx-access-ui.log-20170630");
        fs::write(&plain, body).unwrap();

        let gz = dir.path().join("nginx-access-ui.log-20170701.gz");
        let mut enc = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        enc.write_all(body.as_bytes()).unwrap();
        enc.finish().unwrap();

        for (path, compressed) in [(plain, false), (gz, true)] {
            let log = LogFile {
                path,
                date: NaiveDate::from_ymd_opt(2017, 6, 30).unwrap(),
                compressed,
            };
            let lines: Vec<String> = open_log(&log).unwrap().lines().map(|l| l.unwrap()).collect();
            assert_eq!(lines, vec!["line one", "line two"]);
        }
    }
}
