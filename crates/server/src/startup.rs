use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, BackendKind, StoreConfig};
use tower_http::cors::CorsLayer;
use tracing::info;

use service::{sample, CardStore, JsonFileBackend, KvSlotBackend, SearchScope, SnapshotBackend};

use crate::errors::StartupError;
use crate::routes::{self, ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address: {e}")))
}

/// Open the configured backend and wrap it in a record store.
///
/// The flat-file deployment searches `title`/`code`; the key/value slot
/// deployment also searches `holder`.
pub async fn build_store(cfg: &StoreConfig) -> Result<Arc<CardStore>, StartupError> {
    let (backend, scope): (Arc<dyn SnapshotBackend>, SearchScope) = match cfg.backend {
        BackendKind::JsonFile => {
            let backend = JsonFileBackend::new(&cfg.data_file).await?;
            (Arc::new(backend), SearchScope::TitleAndCode)
        }
        BackendKind::KvSlot => (Arc::new(KvSlotBackend::new()), SearchScope::TitleCodeAndHolder),
    };
    info!(backend = backend.kind(), ?scope, "record store ready");
    Ok(Arc::new(CardStore::new(backend, scope)))
}

/// Build the app from config without binding a socket.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let store = build_store(&cfg.store).await?;
    if cfg.store.seed_sample_data {
        let created = sample::seed_if_empty(&store, cfg.store.sample_count).await?;
        info!(created, "sample data check done");
    }
    Ok(routes::build_router(ServerState::new(store), build_cors(), cfg.store.static_dir.as_deref()))
}

/// Public entry: build the app and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    if cfg.store.backend == BackendKind::JsonFile {
        common::env::ensure_env(cfg.store.static_dir.as_deref(), &cfg.store.data_file).await?;
    }

    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, "gift card catalog listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
