//! The `watch` and `reschedule` commands.

use anyhow::Result;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use slw_browser::HttpSessionFactory;
use slw_config::{WatchConfig, resolve_config_path, validate_config};
use slw_core::OutputFormat;
use slw_notify::{CommandNotifier, ConsoleNotifier, Notifier, NotifySet};
use slw_watch::{
    DetectAction, MatchAction, Orchestrator, RescheduleAction, RunOutcome, WatchReport,
    WatchTuning,
};

/// Watch-only mode: seeing an acceptable slot is the success, nothing is
/// booked. Returns the process exit code.
pub(crate) async fn handle_watch(config: Option<PathBuf>, format: OutputFormat) -> Result<i32> {
    let config = load_config(config)?;
    let action = Box::new(DetectAction::new(build_notifiers(&config)));
    run_watch(config, action, format).await
}

/// Full mode: book the first acceptable slot. `--dry-run` overrides the
/// config so the commit is simulated.
pub(crate) async fn handle_reschedule(
    config: Option<PathBuf>,
    dry_run: bool,
    format: OutputFormat,
) -> Result<i32> {
    let mut config = load_config(config)?;
    if dry_run {
        config.commit.dry_run = true;
    }
    let action = Box::new(RescheduleAction::new(build_notifiers(&config)));
    run_watch(config, action, format).await
}

fn load_config(override_path: Option<PathBuf>) -> Result<WatchConfig> {
    let path = resolve_config_path(override_path.as_deref())?;
    let config = WatchConfig::load(&path)?;
    validate_config(&config)?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn build_notifiers(config: &WatchConfig) -> NotifySet {
    let mut sinks: Vec<Box<dyn Notifier>> = vec![Box::new(ConsoleNotifier)];
    if let Some(command) = &config.notify.command {
        sinks.push(Box::new(CommandNotifier::new(
            command.clone(),
            config.notify.command_timeout(),
        )));
    }
    NotifySet::new(sinks)
}

async fn run_watch(
    config: WatchConfig,
    action: Box<dyn MatchAction>,
    format: OutputFormat,
) -> Result<i32> {
    let stop = CancellationToken::new();
    let signal_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nStopping after the current step...");
            signal_stop.cancel();
        }
    });

    let factory = Box::new(HttpSessionFactory::new(&config));
    let orchestrator = Orchestrator::new(factory, action, WatchTuning::from_config(&config), stop);
    let report = orchestrator.run().await;

    print_report(&report, format)?;
    Ok(exit_code_for(&report.outcome))
}

fn print_report(report: &WatchReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => match &report.outcome {
            RunOutcome::Fulfilled { slot } => {
                println!("Done: {slot} after {} session(s)", report.sessions_attempted);
            }
            RunOutcome::Stopped => {
                println!(
                    "Stopped without a slot after {} session(s)",
                    report.sessions_attempted
                );
            }
        },
    }
    Ok(())
}

fn exit_code_for(outcome: &RunOutcome) -> i32 {
    match outcome {
        RunOutcome::Fulfilled { .. } => 0,
        // Conventional code for an interrupted run
        RunOutcome::Stopped => 130,
    }
}

#[cfg(test)]
#[path = "run_cmd_tests.rs"]
mod tests;
