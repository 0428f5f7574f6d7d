//! Process lifecycle: logging setup, serving and graceful shutdown.

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use crate::api::{create_router, AppState};
use crate::config::Settings;
use crate::service::website_analyzer::WebsiteAnalyzer;

/// Initialize logging with tracing_subscriber.
///
/// `log` records are bridged through `tracing-log`, so the `log::` macros used
/// across the crate land in the same subscriber. `RUST_LOG` overrides the defaults.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper=warn,reqwest=warn"));

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_target(false)
        .with_ansi(true)
        .try_init();
}

/// Build the analyzer from settings and serve until Ctrl+C / SIGTERM.
pub async fn run(settings: Settings) -> Result<()> {
    let analyzer = WebsiteAnalyzer::from_settings(&settings)?;
    let app = create_router(AppState::new(analyzer));

    let addr = settings.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Website analyzer listening on http://{}", addr);
    log::info!("API docs at http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutdown signal received, draining connections");
}
