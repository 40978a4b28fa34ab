use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::{metrics, types::Health};
use service::CardStore;

pub mod giftcards;
pub mod snapshot;

#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<CardStore>,
}

impl ServerState {
    pub fn new(store: Arc<CardStore>) -> Self {
        Self { store }
    }
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics_text() -> (StatusCode, String) {
    match metrics::gather_text() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Build the full application router: gift card API, snapshot admin, health and metrics.
/// `static_dir`, when given, is served for every path no route claims.
pub fn build_router(state: ServerState, cors: CorsLayer, static_dir: Option<&str>) -> Router {
    let api = Router::new()
        .route("/api/giftcards", get(giftcards::list).post(giftcards::create))
        .route(
            "/api/giftcards/:id",
            get(giftcards::get).put(giftcards::update).delete(giftcards::delete),
        )
        .route("/api/giftcards/search/:term", get(giftcards::search))
        .route("/api/groups", get(giftcards::groups))
        .route(
            "/api/snapshot",
            get(snapshot::export).put(snapshot::import).delete(snapshot::clear),
        );

    let router = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .merge(api)
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(cors).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
            .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
    )
}
