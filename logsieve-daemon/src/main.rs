mod logging;
mod metrics_server;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::BufReader;

use logsieve_daemon::cli::DaemonCli;
use logsieve_daemon::runner::{self, StreamStats};
use logsieve_daemon::{report, settings};
use logsieve_filter::{ConfigRefresher, DenialCounters, FilterConfig, FilterEngine};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();
    let config = settings::resolve_config(&cli).await?;

    logging::init_tracing(&config.general)?;

    let filter_config = FilterConfig::from_core(&config.filter)?;
    filter_config.validate()?;
    let loader = filter_config.rule_loader();

    if cli.validate {
        let load_report = loader.load_with_report().await;
        print!("{}", report::render(&load_report));
        if load_report.has_errors() {
            anyhow::bail!("rule sources contain errors");
        }
        return Ok(());
    }

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)?;
    }

    tracing::info!(
        sources = filter_config.sources.len(),
        level_mode = %filter_config.level_mode,
        refresh_interval_secs = filter_config.refresh_interval_secs,
        "logsieve-daemon starting"
    );

    let engine = Arc::new(FilterEngine::new(Arc::new(DenialCounters::new())));
    engine.publish(loader.load().await);

    let refresher = ConfigRefresher::new(
        Arc::clone(&engine),
        loader,
        filter_config.refresh_interval(),
        filter_config.empty_reload_policy,
    )
    .start();

    let outcome = tokio::select! {
        result = filter_input(cli.input.as_deref(), engine.as_ref()) => Some(result),
        signal = wait_for_shutdown_signal() => {
            tracing::info!(signal, "shutdown signal received");
            None
        }
    };

    refresher.stop().await;

    let denied = engine.denial_snapshot();
    tracing::info!(
        denied = ?denied,
        total = engine.counters().total(),
        "logsieve-daemon shut down"
    );

    if let Some(result) = outcome {
        result?;
    }
    Ok(())
}

/// Filter the configured input (file or stdin) into stdout.
async fn filter_input(input: Option<&Path>, engine: &FilterEngine) -> Result<StreamStats> {
    let stdout = tokio::io::stdout();
    match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| anyhow::anyhow!("failed to open input {}: {}", path.display(), e))?;
            runner::run_stream(engine, BufReader::new(file), stdout).await
        }
        None => runner::run_stream(engine, BufReader::new(tokio::io::stdin()), stdout).await,
    }
}

/// Wait for a shutdown signal.
///
/// If signal handlers cannot be installed, the daemon runs until end of input.
async fn wait_for_shutdown_signal() -> &'static str {
    match shutdown_signal().await {
        Ok(signal) => signal,
        Err(e) => {
            tracing::warn!(error = %e, "signal handlers unavailable, running until end of input");
            std::future::pending().await
        }
    }
}

/// Returns the name of the signal that triggered the shutdown.
#[cfg(unix)]
async fn shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to install Ctrl+C handler: {}", e))?;
    Ok("ctrl_c")
}
