use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("gift card {0} not found")]
    NotFound(u64),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("invalid import: {0}")]
    InvalidImport(String),
    #[error("id space exhausted: next id {0} cannot advance")]
    IdsExhausted(u64),
}

impl ServiceError {
    pub fn storage(e: impl std::fmt::Display) -> Self { Self::Storage(e.to_string()) }

    pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound(_)) }
}
