use std::process::ExitCode;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use github_notifier::config::Config;
use github_notifier::github::GithubClient;
use github_notifier::notify::DesktopNotifier;
use github_notifier::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "github_notifier=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Configuration error");
            return ExitCode::FAILURE;
        }
    };

    let github = match GithubClient::from_token(config.token.clone(), config.repo.clone()) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build GitHub client");
            return ExitCode::FAILURE;
        }
    };

    // Tunnel process output, surfaced through our own log stream.
    let (log_tx, mut log_rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        while let Some(line) = log_rx.recv().await {
            tracing::info!(target: "github_notifier::tunnel_log", "{line}");
        }
    });

    let mut orchestrator = Orchestrator::new(config, github, Arc::new(DesktopNotifier::new()), log_tx);

    if let Err(e) = orchestrator.activate().await {
        tracing::error!(error = %e, "Startup failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("Running; press Ctrl-C to stop");
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }

    orchestrator.deactivate().await;
    ExitCode::SUCCESS
}
