use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use nginx_log_analyzer::config::Config;
use nginx_log_analyzer::{Result, log, logging, model, render};

#[derive(Parser)]
#[command(name = "nginx-log-analyzer")]
#[command(about = "Report the slowest URLs of the latest nginx access log", long_about = None)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

/// What a run ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    NoLogs,
    UpToDate(PathBuf),
    Written(PathBuf),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let cfg = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", anyhow::Error::new(e));
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(cli.verbose, cfg.log_filepath.as_deref()) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match run(&cfg) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: &Config) -> Result<Outcome> {
    for dir in cfg.dirs() {
        fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
    }

    // 1) Pick the newest rotated log.
    let Some(log_file) = log::find_latest_log(&cfg.log_dir)? else {
        info!("No log files found in {}", cfg.log_dir.display());
        return Ok(Outcome::NoLogs);
    };
    info!("Latest log file: {}", log_file.path.display());

    let out = render::report_path(&cfg.report_dir, log_file.date);
    if out.exists() {
        info!("Report {} already exists, nothing to do", out.display());
        return Ok(Outcome::UpToDate(out));
    }

    let template = match &cfg.report_template {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("read report template {}", path.display()))?,
        None => render::DEFAULT_TEMPLATE.to_string(),
    };

    // 2) Aggregate.
    let reader = log::open_log(&log_file)?;
    let agg = model::aggregate_reader(log::LineParser::new()?, reader, cfg.errors_percent)
        .with_context(|| format!("analyze {}", log_file.path.display()))?;
    info!(
        "Parsed {} of {} lines, {} distinct urls",
        agg.parsed_lines,
        agg.total_lines,
        agg.table.len()
    );

    // 3) Rank.
    let rows = model::build_table(&agg.table, cfg.report_size)?;

    // 4) Render HTML.
    let html = render::render_report(&rows, &template)?;
    render::write_report(&out, &html)?;
    info!("Wrote {}", out.display());

    let ts = render::write_ts(&cfg.ts_dir)?;
    info!("Updated {}", ts.display());

    Ok(Outcome::Written(out))
}
