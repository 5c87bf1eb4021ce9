use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::api::{self, state::AppState};
use crate::config::Config;
use crate::engine::ytdlp::YtDlpEngine;
use crate::manager::DownloadManager;
use crate::observability::Metrics;
use crate::store::DownloadStore;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(config: Config) -> Result<(), AnyError> {
    let store = DownloadStore::open(&config.server.store_path)?;
    let engine = Arc::new(YtDlpEngine::new(config.engine.binary.clone()));
    let metrics = Arc::new(Metrics::new());
    let manager = DownloadManager::new(
        store,
        engine,
        Arc::clone(&metrics),
        config.manager_settings(),
    );

    // Pick up anything interrupted by the previous run before accepting
    // new requests.
    let resubmitted = manager.resume_all().await?;
    if resubmitted > 0 {
        info!(resubmitted, "Resubmitted interrupted downloads");
    }

    let address = config.server.bind_addr;
    let state = AppState::new(config, manager.clone(), metrics);
    let app = api::router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "mediadock server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    manager.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
