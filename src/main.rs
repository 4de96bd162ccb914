//! Match scoring service entrypoint wiring the scoring cache, the match backend, REST and SSE layers.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use match_scoring_back::{
    config::AppConfig,
    dao::{
        kv_store::{KeyValueStore, file::FileStore, memory::MemoryStore},
        match_api::{MatchApi, OfflineMatchApi},
    },
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let port = config.port;
    let store = build_store(&config).await?;
    let api = build_match_api(&config)?;

    let app_state = AppState::new(config, api, store);
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the scoring cache backend: a directory when configured, memory otherwise.
async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    match &config.storage_dir {
        Some(dir) => {
            let store = FileStore::open(dir.clone())
                .await
                .with_context(|| format!("opening scoring cache at {}", dir.display()))?;
            info!(dir = %dir.display(), "using file-backed scoring cache");
            Ok(Arc::new(store))
        }
        None => {
            info!("no storage_dir configured; scoring cache lives in memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Pick the match backend: HTTP when a base URL is configured, offline otherwise.
fn build_match_api(config: &AppConfig) -> anyhow::Result<Arc<dyn MatchApi>> {
    match config.match_api_base_url.as_deref() {
        #[cfg(feature = "http-api")]
        Some(base_url) => {
            let api = match_scoring_back::dao::match_api::http::HttpMatchApi::new(
                base_url,
                config.match_api_timeout,
            )
            .context("building match backend client")?;
            info!(base_url, "match backend configured");
            Ok(Arc::new(api))
        }
        #[cfg(not(feature = "http-api"))]
        Some(base_url) => {
            tracing::warn!(base_url, "built without http-api support; running offline");
            Ok(Arc::new(OfflineMatchApi))
        }
        None => {
            info!("no match backend configured; running offline");
            Ok(Arc::new(OfflineMatchApi))
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
