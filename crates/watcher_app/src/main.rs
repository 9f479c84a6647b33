//! `listing-watcher`: one pass over the configured listing page.
//!
//! Meant to be started by cron or a systemd timer. Every invocation prints a
//! JSON run report on stdout and exits non-zero when the run did not finish
//! cleanly.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use watcher_core::{RunOutcome, RunReport};
use watcher_engine::{Pipeline, WatcherConfig};
use watcher_logging::{watcher_info, watcher_warn, LogDestination};

#[derive(Parser)]
#[command(name = "listing-watcher")]
#[command(about = "Notify channels once per new item on a listing page")]
#[command(version)]
struct Cli {
    /// RON configuration file
    #[arg(long, default_value = "watcher.ron")]
    config: PathBuf,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogTarget::Terminal)]
    log: LogTarget,

    /// Log file used by `--log file` and `--log both`
    #[arg(long, default_value = "watcher.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Serialize)]
struct PrintedReport<'a> {
    finished_at: String,
    #[serde(flatten)]
    report: &'a RunReport,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // A missing .env is normal in production; the variables come from the unit file.
    let dotenv = dotenvy::dotenv();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    watcher_logging::initialize(cli.log.into(), level, &cli.log_file);
    if let Ok(path) = dotenv {
        watcher_info!("loaded environment from {:?}", path);
    }

    let config = WatcherConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let resolved = config
        .resolve(|var| std::env::var(var).ok())
        .context("resolving configuration")?;
    let pipeline = Pipeline::from_config(resolved).context("building pipeline")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watcher_warn!("interrupt received; stopping after the current stage");
            on_signal.cancel();
        }
    });

    let report = pipeline.run(&cancel).await;
    let printed = PrintedReport {
        finished_at: chrono::Utc::now().to_rfc3339(),
        report: &report,
    };
    println!("{}", serde_json::to_string_pretty(&printed)?);

    Ok(ExitCode::from(exit_code(&report.outcome)))
}

/// 0 when there was nothing to do or at least one channel got the item.
fn exit_code(outcome: &RunOutcome) -> u8 {
    match outcome {
        RunOutcome::NoNewItem | RunOutcome::Delivered | RunOutcome::PartiallyDelivered => 0,
        RunOutcome::NotDelivered => 1,
        RunOutcome::ItemDropped { .. } => 2,
        RunOutcome::Aborted { .. } | RunOutcome::Pending => 3,
        RunOutcome::Cancelled { .. } => 130,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watcher_core::Stage;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["listing-watcher"]);
        assert_eq!(cli.config, PathBuf::from("watcher.ron"));
        assert_eq!(cli.log, LogTarget::Terminal);
        assert!(!cli.verbose);
    }

    #[test]
    fn cli_accepts_log_targets() {
        let cli = Cli::parse_from(["listing-watcher", "--log", "both", "-v", "--config", "x.ron"]);
        assert_eq!(cli.log, LogTarget::Both);
        assert_eq!(cli.config, PathBuf::from("x.ron"));
        assert!(cli.verbose);
    }

    #[test]
    fn partial_delivery_still_exits_cleanly() {
        assert_eq!(exit_code(&RunOutcome::PartiallyDelivered), 0);
        assert_eq!(exit_code(&RunOutcome::NotDelivered), 1);
        assert_eq!(
            exit_code(&RunOutcome::Cancelled {
                stage: Stage::Dispatching
            }),
            130
        );
    }

    #[test]
    fn printed_report_is_flat_json() {
        let report = RunReport {
            outcome: RunOutcome::NoNewItem,
            ..RunReport::default()
        };
        let printed = PrintedReport {
            finished_at: "2026-01-01T00:00:00+00:00".to_string(),
            report: &report,
        };
        let value = serde_json::to_value(&printed).unwrap();
        assert_eq!(value["outcome"]["kind"], "no_new_item");
        assert_eq!(value["finished_at"], "2026-01-01T00:00:00+00:00");
        assert_eq!(value["state_committed"], false);
    }
}
