use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::ServiceError;
use thiserror::Error;
use tracing::error;

/// JSON error response: `{ "error": <title>, "detail": <detail> }`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: String,
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: Option<String>) -> Self {
        Self { status, title: title.into(), detail }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Gift card not found", None)
    }

    /// Map a store failure; `failure` is the title used for storage errors.
    pub fn from_service(e: ServiceError, failure: &str) -> Self {
        match e {
            ServiceError::NotFound(_) => Self::not_found(),
            ServiceError::InvalidImport(msg) => Self::new(StatusCode::BAD_REQUEST, "Invalid import", Some(msg)),
            ServiceError::Storage(msg) => {
                error!(error = %msg, "{failure}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure, Some(msg))
            }
            e @ ServiceError::IdsExhausted(_) => {
                error!(error = %e, "{failure}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure, Some(e.to_string()))
            }
        }
    }
}

/// Body that failed to parse keeps axum's status (400/415/422) but gets the JSON error shape.
impl From<JsonRejection> for JsonApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), "Invalid request body", Some(rejection.body_text()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = match self.detail {
            Some(detail) => serde_json::json!({"error": self.title, "detail": detail}),
            None => serde_json::json!({"error": self.title}),
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("store initialization failed: {0}")]
    Store(#[from] ServiceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_service_errors_to_status() {
        assert_eq!(JsonApiError::from_service(ServiceError::NotFound(3), "x").status, StatusCode::NOT_FOUND);
        assert_eq!(
            JsonApiError::from_service(ServiceError::InvalidImport("bad".into()), "x").status,
            StatusCode::BAD_REQUEST
        );
        let e = JsonApiError::from_service(ServiceError::Storage("disk full".into()), "Failed to save gift card");
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.title, "Failed to save gift card");
        assert_eq!(e.detail.as_deref(), Some("disk full"));

        let e = JsonApiError::from_service(ServiceError::IdsExhausted(u64::MAX), "Failed to save gift card");
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.title, "Failed to save gift card");
    }
}
