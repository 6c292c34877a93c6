mod api;
mod bootstrap;
mod error;
mod gate;
mod health;
mod pages;
mod session;
mod state;
#[cfg(test)]
mod test_support;

use std::future::IntoFuture;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use sentinel_core::config::{AppConfig, LoadOptions};
use tokio::sync::watch;

use crate::state::AppState;

fn init_logging(config: &AppConfig) {
    use sentinel_core::config::LogFormat::*;
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

/// API and page routes over the shared application state.
pub(crate) fn app(state: AppState) -> Router {
    Router::new().merge(api::router()).merge(pages::router()).with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let router = crate::app(app.state.clone())
        .merge(health::router(app.db_pool.clone(), app.config.llm.provider));

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "sentinel-server listening"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let (signalled_tx, mut signalled_rx) = watch::channel(false);
    let shutdown = async move {
        wait_for_shutdown().await;
        let _ = signalled_tx.send(true);
    };
    let server = axum::serve(listener, router).with_graceful_shutdown(shutdown).into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        _ = signalled_rx.changed() => {
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result?,
                Err(_) => tracing::warn!(
                    event_name = "system.server.shutdown_timeout",
                    correlation_id = "shutdown",
                    grace_secs = grace.as_secs(),
                    "in-flight requests did not drain before the grace period elapsed"
                ),
            }
        }
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "sentinel-server stopping"
    );
    app.db_pool.close().await;

    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(
                event_name = "system.server.signal_failed",
                correlation_id = "shutdown",
                error = %error,
                "could not install ctrl-c handler"
            );
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!(
                    event_name = "system.server.signal_failed",
                    correlation_id = "shutdown",
                    error = %error,
                    "could not install SIGTERM handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!(
        event_name = "system.server.shutdown_requested",
        correlation_id = "shutdown",
        "shutdown signal received, draining in-flight requests"
    );
}
