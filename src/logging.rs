use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber, appending to `log_path`.
/// `--verbose` raises the default level and mirrors entries to stderr.
pub fn init(log_path: &Path, verbose: bool) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    let default_directive = if verbose { "slate_health=debug" } else { "slate_health=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing::subscriber::set_global_default(build_subscriber(log_file, filter, verbose))
        .context("Failed to install log subscriber")
}

fn build_subscriber(log_file: File, filter: EnvFilter, verbose: bool) -> impl Subscriber + Send + Sync {
    let file_layer = fmt::layer()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(false);
    let stderr_layer = verbose.then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
}
