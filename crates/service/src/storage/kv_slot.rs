use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use models::Snapshot;
use tokio::sync::RwLock;
use tracing::{error, warn};

use crate::errors::ServiceError;
use crate::storage::SnapshotBackend;

/// Key used by the browser build of the catalog.
pub const DEFAULT_SLOT_KEY: &str = "giftCardsDB";

/// Key/value slot backend, modelled on a browser's local storage: a string
/// area where the whole snapshot is serialized under one fixed key.
///
/// An optional byte quota makes oversized writes fail the way a full local
/// storage does.
#[derive(Clone)]
pub struct KvSlotBackend {
    slots: Arc<RwLock<HashMap<String, String>>>,
    key: String,
    quota: Arc<RwLock<Option<usize>>>,
}

impl KvSlotBackend {
    pub fn new() -> Self {
        Self::with_key(DEFAULT_SLOT_KEY)
    }

    /// Open the slot under `key`, seeding it with an empty snapshot when vacant.
    pub fn with_key(key: impl Into<String>) -> Self {
        let key = key.into();
        let mut slots = HashMap::new();
        slots.insert(key.clone(), empty_document());
        Self { slots: Arc::new(RwLock::new(slots)), key, quota: Arc::new(RwLock::new(None)) }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Limit the serialized size a `save` may write; `None` lifts the limit.
    pub async fn set_quota(&self, bytes: Option<usize>) {
        *self.quota.write().await = bytes;
    }

    /// Raw string stored under the slot key.
    pub async fn get_raw(&self) -> Option<String> {
        self.slots.read().await.get(&self.key).cloned()
    }

    /// Overwrite the slot with an arbitrary string, bypassing validation.
    pub async fn put_raw(&self, raw: impl Into<String>) {
        self.slots.write().await.insert(self.key.clone(), raw.into());
    }
}

impl Default for KvSlotBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_document() -> String {
    serde_json::to_string(&Snapshot::default()).unwrap_or_else(|_| r#"{"giftCards":[],"nextId":1}"#.to_string())
}

#[async_trait]
impl SnapshotBackend for KvSlotBackend {
    async fn load(&self) -> Snapshot {
        let Some(raw) = self.get_raw().await else {
            warn!(key = %self.key, "slot is empty; using empty snapshot");
            return Snapshot::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            error!(key = %self.key, error = %e, "error reading slot; using empty snapshot");
            Snapshot::default()
        })
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), ServiceError> {
        let raw = serde_json::to_string(snapshot).map_err(ServiceError::storage)?;
        if let Some(limit) = *self.quota.read().await {
            if raw.len() > limit {
                error!(key = %self.key, size = raw.len(), limit, "error saving to slot: quota exceeded");
                return Err(ServiceError::Storage(format!("quota of {limit} bytes exceeded")));
            }
        }
        self.put_raw(raw).await;
        Ok(())
    }

    fn kind(&self) -> &'static str { "kv-slot" }
}
