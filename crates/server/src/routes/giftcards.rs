use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use common::metrics::record_op;
use models::{CardFields, CardPatch, CardRecord, DeleteReceipt};
use service::sample::group_by_title;
use tracing::info;

use crate::errors::JsonApiError;
use crate::routes::ServerState;

/// Ids that do not parse as integers name no record.
fn parse_id(raw: &str) -> Result<u64, JsonApiError> {
    raw.trim().parse::<u64>().map_err(|_| JsonApiError::not_found())
}

fn outcome<T>(res: &Result<T, JsonApiError>) -> &'static str {
    match res {
        Ok(_) => "ok",
        Err(e) if e.status == StatusCode::NOT_FOUND => "not_found",
        Err(_) => "error",
    }
}

/// GET /api/giftcards
pub async fn list(State(state): State<ServerState>) -> Json<Vec<CardRecord>> {
    let cards = state.store.list().await;
    record_op("list", "ok");
    Json(cards)
}

/// GET /api/giftcards/:id
pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<CardRecord>, JsonApiError> {
    let res = match parse_id(&id) {
        Ok(id) => state.store.get(id).await.map(Json).ok_or_else(JsonApiError::not_found),
        Err(e) => Err(e),
    };
    record_op("get", outcome(&res));
    res
}

/// POST /api/giftcards
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<CardFields>, JsonRejection>,
) -> Result<(StatusCode, Json<CardRecord>), JsonApiError> {
    let res = match payload {
        Ok(Json(fields)) => state
            .store
            .create(fields)
            .await
            .map(|card| (StatusCode::CREATED, Json(card)))
            .map_err(|e| JsonApiError::from_service(e, "Failed to save gift card")),
        Err(rejection) => Err(rejection.into()),
    };
    record_op("create", outcome(&res));
    res
}

/// PUT /api/giftcards/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<CardPatch>, JsonRejection>,
) -> Result<Json<CardRecord>, JsonApiError> {
    let res = match (parse_id(&id), payload) {
        (Err(e), _) => Err(e),
        (Ok(_), Err(rejection)) => Err(rejection.into()),
        (Ok(id), Ok(Json(patch))) => state
            .store
            .update(id, patch)
            .await
            .map(Json)
            .map_err(|e| JsonApiError::from_service(e, "Failed to update gift card")),
    };
    record_op("update", outcome(&res));
    res
}

/// DELETE /api/giftcards/:id
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteReceipt>, JsonApiError> {
    let res = match parse_id(&id) {
        Ok(id) => state
            .store
            .delete(id)
            .await
            .map(|card| Json(DeleteReceipt::new(card)))
            .map_err(|e| JsonApiError::from_service(e, "Failed to delete gift card")),
        Err(e) => Err(e),
    };
    record_op("delete", outcome(&res));
    res
}

/// GET /api/giftcards/search/:term
pub async fn search(
    State(state): State<ServerState>,
    Path(term): Path<String>,
) -> Json<Vec<CardRecord>> {
    let hits = state.store.search(&term).await;
    info!(term = %term, hits = hits.len(), "gift card search");
    record_op("search", "ok");
    Json(hits)
}

/// GET /api/groups
pub async fn groups(State(state): State<ServerState>) -> Json<BTreeMap<String, Vec<CardRecord>>> {
    let cards = state.store.list().await;
    record_op("groups", "ok");
    Json(group_by_title(&cards))
}
