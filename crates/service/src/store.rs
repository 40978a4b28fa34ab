use std::sync::Arc;

use chrono::Utc;
use models::{CardFields, CardPatch, CardRecord, Snapshot};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::errors::ServiceError;
use crate::storage::SnapshotBackend;

/// Which fields `search` looks at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchScope {
    /// `title` and `code` (server deployment).
    #[default]
    TitleAndCode,
    /// `title`, `code` and, when present, `holder` (local slot deployment).
    TitleCodeAndHolder,
}

/// Record store: CRUD and search over one snapshot.
///
/// Every operation reloads the full snapshot from the backend, works on that
/// copy and, for writes, saves the full snapshot back. The cycle runs under
/// one async mutex so operations issued through the same `CardStore` never
/// interleave; two stores sharing one backend can still lose updates.
pub struct CardStore {
    backend: Arc<dyn SnapshotBackend>,
    scope: SearchScope,
    lock: Mutex<()>,
}

impl CardStore {
    pub fn new(backend: Arc<dyn SnapshotBackend>, scope: SearchScope) -> Self {
        Self { backend, scope, lock: Mutex::new(()) }
    }

    /// All records in snapshot order.
    pub async fn list(&self) -> Vec<CardRecord> {
        let _guard = self.lock.lock().await;
        self.backend.load().await.gift_cards
    }

    /// Record with the given id, if any.
    pub async fn get(&self, id: u64) -> Option<CardRecord> {
        let _guard = self.lock.lock().await;
        self.backend.load().await.find(id).cloned()
    }

    /// Assign the next id, stamp `created_at`, append and persist.
    ///
    /// On a failed save nothing is retained: the next operation reloads the
    /// backend, so the id is not consumed. An imported `nextId` of `u64::MAX`
    /// leaves no id to hand out and fails with `IdsExhausted`.
    pub async fn create(&self, fields: CardFields) -> Result<CardRecord, ServiceError> {
        let _guard = self.lock.lock().await;
        let mut snapshot = self.backend.load().await;
        let id = snapshot.next_id;
        let next_id = id.checked_add(1).ok_or(ServiceError::IdsExhausted(id))?;
        let record = CardRecord::new(id, fields, Utc::now());
        snapshot.gift_cards.push(record.clone());
        snapshot.next_id = next_id;
        self.backend.save(&snapshot).await?;
        info!(id = record.id, title = %record.title, "gift card created");
        Ok(record)
    }

    /// Merge `patch` into an existing record and stamp `updated_at`.
    pub async fn update(&self, id: u64, patch: CardPatch) -> Result<CardRecord, ServiceError> {
        let _guard = self.lock.lock().await;
        let mut snapshot = self.backend.load().await;
        let idx = snapshot.position(id).ok_or(ServiceError::NotFound(id))?;
        snapshot.gift_cards[idx].apply(patch, Utc::now());
        let updated = snapshot.gift_cards[idx].clone();
        self.backend.save(&snapshot).await?;
        info!(id, "gift card updated");
        Ok(updated)
    }

    /// Remove a record and return it. Its id is never reissued.
    pub async fn delete(&self, id: u64) -> Result<CardRecord, ServiceError> {
        let _guard = self.lock.lock().await;
        let mut snapshot = self.backend.load().await;
        let idx = snapshot.position(id).ok_or(ServiceError::NotFound(id))?;
        let removed = snapshot.gift_cards.remove(idx);
        self.backend.save(&snapshot).await?;
        info!(id, title = %removed.title, "gift card deleted");
        Ok(removed)
    }

    /// Case-insensitive substring search. An empty term matches every record;
    /// callers wanting "list all" on empty input should call `list` instead.
    pub async fn search(&self, term: &str) -> Vec<CardRecord> {
        let needle = term.to_lowercase();
        let include_holder = self.scope == SearchScope::TitleCodeAndHolder;
        let _guard = self.lock.lock().await;
        self.backend
            .load()
            .await
            .gift_cards
            .into_iter()
            .filter(|c| c.matches(&needle, include_holder))
            .collect()
    }

    /// Reset to no records and `next_id = 1`. Irreversible.
    pub async fn clear_all(&self) -> Result<(), ServiceError> {
        let _guard = self.lock.lock().await;
        self.backend.save(&Snapshot::default()).await?;
        warn!("all gift cards cleared");
        Ok(())
    }

    /// Raw current snapshot, suitable for feeding back into `import_snapshot`.
    pub async fn export(&self) -> Snapshot {
        let _guard = self.lock.lock().await;
        self.backend.load().await
    }

    /// Replace the stored snapshot with `candidate`.
    ///
    /// Only the shape is checked (`giftCards` must be an array of records).
    /// Ids and `nextId` are stored as given, without renumbering.
    pub async fn import_snapshot(&self, candidate: Value) -> Result<(), ServiceError> {
        match candidate.get("giftCards") {
            Some(Value::Array(_)) => {}
            Some(_) => return Err(ServiceError::InvalidImport("giftCards must be an array".into())),
            None => return Err(ServiceError::InvalidImport("missing giftCards".into())),
        }
        let snapshot: Snapshot =
            serde_json::from_value(candidate).map_err(|e| ServiceError::InvalidImport(e.to_string()))?;

        let _guard = self.lock.lock().await;
        self.backend.save(&snapshot).await?;
        info!(records = snapshot.gift_cards.len(), next_id = snapshot.next_id, "snapshot imported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{json_file::JsonFileBackend, kv_slot::KvSlotBackend};
    use serde_json::json;

    fn fields(title: &str, value: f64, code: &str) -> CardFields {
        CardFields {
            title: title.into(),
            value,
            card_number: "4000123412".into(),
            holder: Some("John Doe".into()),
            expires: Some("12/25".into()),
            cvv: "321".into(),
            code: code.into(),
        }
    }

    fn slot_store() -> (CardStore, KvSlotBackend) {
        let backend = KvSlotBackend::new();
        let store = CardStore::new(Arc::new(backend.clone()), SearchScope::TitleCodeAndHolder);
        (store, backend)
    }

    async fn file_store() -> Result<(CardStore, std::path::PathBuf), anyhow::Error> {
        let path = std::env::temp_dir().join(format!("card_store_{}.json", uuid::Uuid::new_v4()));
        let backend = JsonFileBackend::new(&path).await?;
        Ok((CardStore::new(Arc::new(backend), SearchScope::TitleAndCode), path))
    }

    #[tokio::test]
    async fn create_then_get_round_trips_fields() -> Result<(), anyhow::Error> {
        let (store, path) = file_store().await?;
        let created = store.create(fields("Steam", 50.0, "GIFT-CARD-CODE-1111")).await?;
        assert_eq!(created.id, 1);

        let found = store.get(created.id).await.expect("created card present");
        assert_eq!(found.title, "Steam");
        assert_eq!(found.value, 50.0);
        assert_eq!(found.code, "GIFT-CARD-CODE-1111");
        assert_eq!(found.created_at, created.created_at);
        assert!(found.updated_at.is_none());
        assert!(store.get(99).await.is_none());

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn update_merges_and_stamps() -> Result<(), anyhow::Error> {
        let (store, _) = slot_store();
        let created = store.create(fields("Hulu", 25.0, "C-1")).await?;
        let updated = store.update(created.id, CardPatch { value: Some(75.0), ..Default::default() }).await?;

        assert_eq!(updated.value, 75.0);
        assert!(updated.updated_at.is_some());
        assert_eq!(
            CardRecord { value: created.value, updated_at: None, ..updated.clone() },
            created
        );
        assert_eq!(store.get(created.id).await, Some(updated));

        let missing = store.update(42, CardPatch { title: Some("x".into()), ..Default::default() }).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(42))));
        assert_eq!(store.list().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn delete_twice_and_ids_never_reused() -> Result<(), anyhow::Error> {
        let (store, _) = slot_store();
        let a = store.create(fields("Netflix", 30.0, "A")).await?;
        let b = store.create(fields("Spotify", 40.0, "B")).await?;

        let removed = store.delete(b.id).await?;
        assert_eq!(removed, b);
        assert!(store.delete(b.id).await.unwrap_err().is_not_found());
        assert!(store.list().await.iter().all(|c| c.id != b.id));

        let c = store.create(fields("Steam", 20.0, "C")).await?;
        assert_eq!(c.id, 3);
        let ids: Vec<u64> = store.list().await.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
        Ok(())
    }

    #[tokio::test]
    async fn ids_strictly_increase_across_mixed_operations() -> Result<(), anyhow::Error> {
        let (store, _) = slot_store();
        let mut issued = Vec::new();
        for round in 0..5 {
            let card = store.create(fields("Hulu", 10.0 * round as f64, "X")).await?;
            issued.push(card.id);
            if round % 2 == 0 {
                store.delete(card.id).await?;
            } else {
                store.update(card.id, CardPatch { code: Some("Y".into()), ..Default::default() }).await?;
            }
        }
        assert!(issued.windows(2).all(|w| w[0] < w[1]));
        assert!(store.export().await.next_id > *issued.last().unwrap());
        Ok(())
    }

    #[tokio::test]
    async fn search_is_case_insensitive() -> Result<(), anyhow::Error> {
        let (store, path) = file_store().await?;
        let netflix = store.create(fields("Netflix", 30.0, "GIFT-CARD-CODE-0001")).await?;
        store.create(fields("Spotify", 30.0, "GIFT-CARD-CODE-0002")).await?;

        assert_eq!(store.search("net").await, vec![netflix.clone()]);
        assert_eq!(store.search("NET").await, vec![netflix]);
        assert_eq!(store.search("code-000").await.len(), 2);
        assert!(store.search("zzz").await.is_empty());
        // holder is not searched in the file deployment
        assert!(store.search("john").await.is_empty());

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn slot_search_includes_holder() -> Result<(), anyhow::Error> {
        let (store, _) = slot_store();
        store.create(fields("Netflix", 30.0, "A")).await?;
        store.create(CardFields { holder: None, ..fields("Steam", 30.0, "B") }).await?;
        let hits = store.search("JOHN").await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Netflix");
        Ok(())
    }

    #[tokio::test]
    async fn clear_all_resets_counter() -> Result<(), anyhow::Error> {
        let (store, _) = slot_store();
        store.create(fields("Netflix", 30.0, "A")).await?;
        store.create(fields("Hulu", 30.0, "B")).await?;
        store.clear_all().await?;
        assert!(store.list().await.is_empty());
        assert_eq!(store.create(fields("Steam", 5.0, "C")).await?.id, 1);
        Ok(())
    }

    #[tokio::test]
    async fn import_of_own_export_is_idempotent() -> Result<(), anyhow::Error> {
        let (store, _) = slot_store();
        store.create(fields("Netflix", 30.0, "A")).await?;
        let b = store.create(fields("Hulu", 30.0, "B")).await?;
        store.delete(b.id).await?;

        let before = store.export().await;
        store.import_snapshot(serde_json::to_value(&before)?).await?;
        assert_eq!(store.export().await, before);
        assert_eq!(store.list().await, before.gift_cards);
        assert_eq!(store.export().await.next_id, 3);
        Ok(())
    }

    #[tokio::test]
    async fn import_rejects_bad_shape_without_touching_state() -> Result<(), anyhow::Error> {
        let (store, _) = slot_store();
        store.create(fields("Netflix", 30.0, "A")).await?;
        let before = store.export().await;

        for bad in [json!({}), json!({"giftCards": {}}), json!([1, 2]), json!({"giftCards": [{"id": "x"}]})] {
            let res = store.import_snapshot(bad).await;
            assert!(matches!(res, Err(ServiceError::InvalidImport(_))));
        }
        assert_eq!(store.export().await, before);
        Ok(())
    }

    #[tokio::test]
    async fn import_is_trusted_verbatim() -> Result<(), anyhow::Error> {
        let (store, _) = slot_store();
        let doc = json!({
            "giftCards": [
                {"id": 5, "title": "Hulu", "value": 10, "createdAt": "2024-01-01T00:00:00Z"}
            ],
            "nextId": 5
        });
        store.import_snapshot(doc).await?;
        // no renumbering: the next create collides with the imported id
        let created = store.create(fields("Steam", 5.0, "S")).await?;
        assert_eq!(created.id, 5);
        assert_eq!(store.list().await.iter().filter(|c| c.id == 5).count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn failed_create_is_not_durable() -> Result<(), anyhow::Error> {
        let (store, backend) = slot_store();
        store.create(fields("Netflix", 30.0, "A")).await?;

        backend.set_quota(Some(16)).await;
        let res = store.create(fields("Hulu", 30.0, "B")).await;
        assert!(matches!(res, Err(ServiceError::Storage(_))));
        assert_eq!(store.list().await.len(), 1);

        backend.set_quota(None).await;
        assert_eq!(store.create(fields("Steam", 30.0, "C")).await?.id, 2);
        Ok(())
    }

    #[tokio::test]
    async fn create_fails_cleanly_when_ids_run_out() -> Result<(), anyhow::Error> {
        let (store, _) = slot_store();
        store.import_snapshot(json!({"giftCards": [], "nextId": u64::MAX})).await?;

        let res = store.create(fields("Steam", 5.0, "S")).await;
        assert!(matches!(res, Err(ServiceError::IdsExhausted(id)) if id == u64::MAX));
        let after = store.export().await;
        assert!(after.gift_cards.is_empty());
        assert_eq!(after.next_id, u64::MAX);

        // one id short of the ceiling still works and never wraps
        store.import_snapshot(json!({"giftCards": [], "nextId": u64::MAX - 1})).await?;
        assert_eq!(store.create(fields("Hulu", 5.0, "H")).await?.id, u64::MAX - 1);
        assert_eq!(store.export().await.next_id, u64::MAX);
        assert!(store.create(fields("Hulu", 5.0, "H")).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_backend_lists_empty() -> Result<(), anyhow::Error> {
        let (store, backend) = slot_store();
        backend.put_raw("{{{").await;
        assert!(store.list().await.is_empty());
        assert_eq!(store.create(fields("Steam", 30.0, "C")).await?.id, 1);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() -> Result<(), anyhow::Error> {
        let (store, path) = file_store().await?;
        let store = Arc::new(store);
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create(fields("Steam", i as f64, "C")).await
            }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await??.id);
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=16).collect::<Vec<u64>>());
        assert_eq!(store.list().await.len(), 16);
        assert_eq!(store.export().await.next_id, 17);

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }
}
