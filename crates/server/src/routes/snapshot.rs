use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use common::{metrics::record_op, types::Message};
use models::Snapshot;
use serde_json::Value;

use crate::errors::JsonApiError;
use crate::routes::ServerState;

/// GET /api/snapshot: the raw stored document.
pub async fn export(State(state): State<ServerState>) -> Json<Snapshot> {
    let snapshot = state.store.export().await;
    record_op("export", "ok");
    Json(snapshot)
}

/// PUT /api/snapshot: replace everything with the uploaded document.
pub async fn import(
    State(state): State<ServerState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Message>, JsonApiError> {
    let candidate = match payload {
        Ok(Json(candidate)) => candidate,
        Err(rejection) => {
            record_op("import", "error");
            return Err(rejection.into());
        }
    };
    match state.store.import_snapshot(candidate).await {
        Ok(()) => {
            record_op("import", "ok");
            Ok(Json(Message::new("Data imported successfully")))
        }
        Err(e) => {
            record_op("import", "error");
            Err(JsonApiError::from_service(e, "Failed to import data"))
        }
    }
}

/// DELETE /api/snapshot: drop every card and reset ids.
pub async fn clear(State(state): State<ServerState>) -> Result<Json<Message>, JsonApiError> {
    match state.store.clear_all().await {
        Ok(()) => {
            record_op("clear", "ok");
            Ok(Json(Message::new("All gift cards deleted successfully")))
        }
        Err(e) => {
            record_op("clear", "error");
            Err(JsonApiError::from_service(e, "Failed to clear data"))
        }
    }
}
