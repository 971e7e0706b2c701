use anyhow::Context;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

pub const TS_FILE_NAME: &str = "log_analyzer.ts";

/// Record completion time (Unix seconds) for external monitoring.
pub fn write_ts(ts_dir: &Path) -> anyhow::Result<PathBuf> {
    let path = ts_dir.join(TS_FILE_NAME);
    let now = Utc::now().timestamp();
    fs::write(&path, now.to_string()).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ts_matches_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_ts(dir.path()).unwrap();

        let ts: u64 = fs::read_to_string(&path).unwrap().trim().parse().unwrap();
        let mtime = fs::metadata(&path)
            .unwrap()
            .modified()
            .unwrap()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        assert!(ts.abs_diff(mtime) < 120);

        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        assert!(now >= ts);
    }
}
