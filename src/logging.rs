use anyhow::{Context, anyhow};
use chrono::Local;
use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

const TIME_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// `[2017.06.30 03:50:22] I message`: local time, one-letter level.
#[derive(Debug, Clone, Copy)]
pub struct LineFormat;

fn level_letter(level: &Level) -> char {
    match *level {
        Level::ERROR => 'E',
        Level::WARN => 'W',
        Level::INFO => 'I',
        Level::DEBUG => 'D',
        Level::TRACE => 'T',
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "[{}] {} ",
            Local::now().format(TIME_FORMAT),
            level_letter(event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default level.
///
/// With `log_file` set, events are appended there (no ANSI colors);
/// otherwise they go to stderr.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .event_format(LineFormat)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder
            .event_format(LineFormat)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    installed.map_err(|e| anyhow!("install log subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::fs;
    use tracing::info;

    #[test]
    fn unopenable_log_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("analyzer.log");
        let err = init_logging(false, Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("open log file"));
    }

    // The only test in this crate that installs the global subscriber.
    #[test]
    fn file_log_uses_dated_one_letter_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analyzer.log");
        init_logging(false, Some(&path)).unwrap();

        info!("Wrote report-2017.06.30.html");

        let text = fs::read_to_string(&path).unwrap();
        let re = Regex::new(
            r"^\[\d{4}\.\d{2}\.\d{2} \d{2}:\d{2}:\d{2}\] I Wrote report-2017\.06\.30\.html$",
        )
        .unwrap();
        assert!(text.lines().any(|l| re.is_match(l)), "{text:?}");
    }

    #[test]
    fn level_letters() {
        let letters: String = [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE]
            .iter()
            .map(level_letter)
            .collect();
        assert_eq!(letters, "EWIDT");
    }
}
