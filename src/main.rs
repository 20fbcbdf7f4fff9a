mod cli;
mod error;

use crate::cli::Cli;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use retitle_config::Config;
use retitle_describe::GeminiDescriber;
use retitle_library::{Context, FileOutcome, ProcessEvent, Stage, Tally, process};
use retitle_storage::BackendHandle;
use retitle_storage::backend::LocalBackend;
use std::path::PathBuf;
use std::pin::pin;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    match run(cli).await {
        Ok(tally) => {
            println!("{tally}");
            if tally.stranded > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS }
        },
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).try_init();
}

async fn run(cli: Cli) -> Result<Tally> {
    let settings = cli.config.clone().or_else(Config::default_path).unwrap_or_else(|| PathBuf::from("config.txt"));
    let mut config = Config::load(&settings).or_raise(|| ErrorKind::Config)?;
    apply_overrides(&mut config, &cli);
    config.validate().or_raise(|| ErrorKind::Config)?;
    let directory = config.directory.canonicalize().or_raise(|| ErrorKind::Config)?;

    if !cli.no_save {
        // Failing to remember settings should not stop the run.
        if let Err(e) = config.save(&settings) {
            tracing::warn!(path = %settings.display(), error = ?e, "Could not save settings");
        }
    }

    let name = directory.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "local".to_string());
    let backend: BackendHandle = Arc::new(LocalBackend::new(name, &directory).or_raise(|| ErrorKind::Setup)?);
    let describer = GeminiDescriber::new(config.api_key.as_str(), config.model.as_str())
        .or_raise(|| ErrorKind::Setup)?
        .with_endpoint(&config.endpoint)
        .with_timeout(Duration::from_secs(config.timeout_secs));
    let ctx = Context::new(Arc::new(describer))
        .with_batch_size(config.batch_size)
        .with_retry(config.max_attempts, Duration::from_secs(config.retry_delay_secs))
        .with_batch_pause(config.pause.then(|| Duration::from_secs(config.pause_secs)));

    tracing::info!(directory = %directory.display(), model = %config.model, "Processing");
    let mut events = pin!(process(&backend, &ctx));
    while let Some(event) = events.next().await {
        if let ProcessEvent::Complete(tally) = report(event.or_raise(|| ErrorKind::Run)?) {
            return Ok(tally);
        }
    }
    exn::bail!(ErrorKind::Run)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(directory) = &cli.directory {
        config.directory = directory.clone();
    }
    if let Some(api_key) = &cli.api_key {
        config.api_key = api_key.trim().to_string();
    }
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = usize::from(batch_size);
    }
    if cli.no_pause {
        config.pause = false;
    }
}

/// Logs a progress event and hands it back.
fn report(event: ProcessEvent) -> ProcessEvent {
    match &event {
        ProcessEvent::Started => {},
        ProcessEvent::DiscoveryComplete(total) => tracing::info!("Found {total} eligible images"),
        ProcessEvent::BatchStarted { index, count, files } => {
            tracing::info!("Batch {index}/{count} ({files} images)");
        },
        ProcessEvent::Paused(pause) => tracing::info!("Pausing {}s before the next batch", pause.as_secs()),
        ProcessEvent::RecoveryStarted(total) => tracing::info!("Retrying {total} images individually"),
        ProcessEvent::File(outcome) => match outcome {
            FileOutcome::Renamed { original, renamed, stage, conflicts } => {
                let via = match stage {
                    Stage::Batch => "batch",
                    Stage::Recovery => "retry",
                };
                match conflicts {
                    0 => tracing::info!("{original} -> {renamed} ({via})"),
                    _ => tracing::info!("{original} -> {renamed} ({via}, name conflict resolved)"),
                }
            },
            FileOutcome::Deferred { name, reason } => tracing::warn!("{name}: {reason:?}, will retry individually"),
            FileOutcome::Restored { name, phase } => tracing::warn!("{name}: retry failed while {phase}, left unchanged"),
            FileOutcome::Stranded { original, temp } => {
                tracing::error!("{original} is stranded as {temp}; rename it back by hand");
            },
        },
        ProcessEvent::Complete(_) => tracing::info!("Done"),
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        let cli = Cli::try_parse_from(["retitle", "/tmp", "--api-key", " abc ", "--batch-size", "3", "--no-pause"]).unwrap();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.directory, PathBuf::from("/tmp"));
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.batch_size, 3);
        assert!(!config.pause);
        assert_eq!(config.model, retitle_describe::DEFAULT_MODEL);
    }

    #[test]
    fn test_no_overrides() {
        let mut config = Config { api_key: "saved".to_string(), ..Config::default() };
        let cli = Cli::try_parse_from(["retitle"]).unwrap();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.api_key, "saved");
        assert!(config.pause);
    }
}
