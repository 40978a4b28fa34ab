use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use models::Snapshot;
use tokio::fs;
use tracing::{debug, error, warn};

use crate::errors::ServiceError;
use crate::storage::SnapshotBackend;

/// Flat-file backend: the snapshot is one pretty-printed JSON document on disk.
///
/// Writes go to a sibling `.tmp` file that is then renamed over the target,
/// so readers see either the old or the new document. A document that does not
/// parse is renamed to `<file>.corrupt-<timestamp>` before the empty snapshot
/// is served, so the next write cannot destroy it.
#[derive(Clone, Debug)]
pub struct JsonFileBackend {
    file_path: PathBuf,
}

impl JsonFileBackend {
    /// Initialize the backend from a path. Creates the file with an empty snapshot if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Self, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
            }
        }

        let backend = Self { file_path };
        if fs::metadata(&backend.file_path).await.is_err() {
            backend.save(&Snapshot::default()).await?;
        }
        Ok(backend)
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.file_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(suffix);
        self.file_path.with_file_name(name)
    }

    fn tmp_path(&self) -> PathBuf {
        self.sibling_path(".tmp")
    }

    fn corrupt_path(&self) -> PathBuf {
        self.sibling_path(&format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.3fZ")))
    }
}

#[async_trait]
impl SnapshotBackend for JsonFileBackend {
    async fn load(&self) -> Snapshot {
        let bytes = match fs::read(&self.file_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %self.file_path.display(), error = %e, "cannot read data file; using empty snapshot");
                return Snapshot::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let kept = self.corrupt_path();
                match fs::rename(&self.file_path, &kept).await {
                    Ok(()) => error!(
                        path = %self.file_path.display(),
                        kept = %kept.display(),
                        error = %e,
                        "data file is not a valid snapshot; moved aside, using empty snapshot"
                    ),
                    Err(re) => error!(
                        path = %self.file_path.display(),
                        error = %e,
                        rename_error = %re,
                        "data file is not a valid snapshot and could not be moved aside; using empty snapshot"
                    ),
                }
                Snapshot::default()
            }
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), ServiceError> {
        let data = serde_json::to_vec_pretty(snapshot).map_err(ServiceError::storage)?;
        let tmp = self.tmp_path();
        let written = match fs::write(&tmp, &data).await {
            Ok(()) => fs::rename(&tmp, &self.file_path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            error!(path = %self.file_path.display(), error = %e, "failed to write data file");
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::storage(e));
        }
        debug!(path = %self.file_path.display(), records = snapshot.gift_cards.len(), "snapshot written");
        Ok(())
    }

    fn kind(&self) -> &'static str { "json-file" }
}
