//! HTTP surface: routing, handlers and the process entry point.

mod handlers;
mod response;
mod routes;

use std::sync::Arc;

use anyhow::Context as _;

use crate::{
    assets::{font::FontRegistry, source::ImageFetcher},
    config::ServiceConfig,
    pipeline::CaptionPipeline,
    storage::artifacts::ArtifactStore,
};

pub use routes::{AppState, build_router};

/// Build the service from `config` and serve until SIGINT/SIGTERM.
pub async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let app = build_router(state, &config.public_dir);

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            tracing::error!(port = config.port, "port already in use");
            anyhow::bail!("port {} already in use", config.port);
        }
        Err(e) => return Err(e).with_context(|| format!("bind {addr}")),
    };

    tracing::info!(%addr, domain = %config.domain, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve http")?;
    tracing::info!("server stopped");
    Ok(())
}

impl AppState {
    /// Load the caption font and open storage as described by `config`.
    pub fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        let fonts = Arc::new(FontRegistry::load(&config.font_path));
        let store = ArtifactStore::open(&config.image_dir, config.domain.clone())
            .context("open image storage")?;
        let fetcher = ImageFetcher::new(config.image_dir.clone())?
            .with_local_files(config.allow_local_files);
        if config.allow_local_files {
            tracing::warn!("local file image sources are enabled");
        }
        Ok(Self::new(CaptionPipeline::new(fetcher, fonts, store)))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}
