mod bootstrap;
mod health;
mod routes;
#[cfg(test)]
mod test_support;

use std::time::Duration;

use anyhow::Result;
use pollbot_core::config::{AppConfig, LoadOptions};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

fn init_logging(config: &AppConfig) {
    use pollbot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging comes up before bootstrap so its events are captured.
    let options = match std::env::var_os("POLLBOT_CONFIG") {
        Some(path) => LoadOptions::from_path(path),
        None => LoadOptions::default(),
    };
    let config = AppConfig::load(options)?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    let server = &app.config.server;

    let address = format!("{}:{}", server.bind_address, server.port);
    let listener = TcpListener::bind(&address).await?;
    let health_state =
        health::HealthState::new(app.slack_api.clone(), app.config.slack.api_base_url.clone());
    let router = health::router(health_state)
        .merge(routes::router(routes::RuntimeState::new(app.slack_api.clone())));

    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        address = %address,
        "pollbot-server listening"
    );

    let drain = Duration::from_secs(server.graceful_shutdown_secs);
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let mut serving = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut serving => {
            result??;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => signal?,
    }

    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        drain_secs = drain.as_secs(),
        "pollbot-server stopping"
    );
    let _ = stop_tx.send(());

    match tokio::time::timeout(drain, serving).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(serve_error))) => {
            error!(
                event_name = "system.server.error",
                correlation_id = "shutdown",
                error = %serve_error,
                "server terminated with an error while draining"
            );
        }
        Ok(Err(join_error)) => return Err(join_error.into()),
        Err(_) => {
            warn!(
                event_name = "system.server.drain_timeout",
                correlation_id = "shutdown",
                drain_secs = drain.as_secs(),
                "in-flight requests did not finish before the drain deadline"
            );
        }
    }

    Ok(())
}
