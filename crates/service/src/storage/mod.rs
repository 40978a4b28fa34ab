//! Persistence backends for the record store
//!
//! A backend treats the whole snapshot as one opaque unit: `load` hands back
//! the current document, `save` replaces it. Neither side does partial writes.

use async_trait::async_trait;
use models::Snapshot;

use crate::errors::ServiceError;

pub mod json_file;
pub mod kv_slot;

/// Load/replace pair the record store reads from and writes to.
/// Implementations can be file-backed, in-process slots, or remote KV.
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Current snapshot. Missing or unreadable data yields `Snapshot::default()`
    /// after logging; this never fails outward.
    async fn load(&self) -> Snapshot;

    /// Replace the stored snapshot with `snapshot`.
    async fn save(&self, snapshot: &Snapshot) -> Result<(), ServiceError>;

    /// Short label for logs.
    fn kind(&self) -> &'static str;
}
