use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::fs;
use tracing::{debug, warn};

use crate::models::DayCacheEntry;

use super::{CacheError, DayCache};

/// File-backed day cache: one JSON document per (unit, date) under
/// `<root>/unit-<id>/<date>.json`.
///
/// Writes go to a `.tmp` sibling first and are moved into place with a
/// rename, so a crash mid-write never corrupts an existing entry.
pub struct FileDayCache {
    root: PathBuf,
}

impl FileDayCache {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn entry_path(&self, unit_id: i64, date: NaiveDate) -> PathBuf {
        self.root
            .join(format!("unit-{}", unit_id))
            .join(format!("{}.json", date))
    }
}

#[async_trait]
impl DayCache for FileDayCache {
    async fn put(
        &self,
        unit_id: i64,
        date: NaiveDate,
        entry: &DayCacheEntry,
    ) -> Result<(), CacheError> {
        let path = self.entry_path(unit_id, date);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let payload = serde_json::to_vec_pretty(entry)?;

        // Temp file lives in the same directory so the rename stays on one
        // filesystem and is atomic.
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &payload).await?;
        fs::rename(&tmp_path, &path).await?;

        debug!("Cached day view at {}", path.display());
        Ok(())
    }

    async fn get(&self, unit_id: i64, date: NaiveDate) -> Result<Option<DayCacheEntry>, CacheError> {
        let path = self.entry_path(unit_id, date);

        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<DayCacheEntry>(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                // A corrupt entry is a miss; drop the file so the key does
                // not keep failing on every read.
                warn!("Discarding malformed cache entry {}: {}", path.display(), e);
                if let Err(remove_err) = fs::remove_file(&path).await {
                    warn!(
                        "Could not remove malformed cache entry {}: {}",
                        path.display(),
                        remove_err
                    );
                }
                Ok(None)
            }
        }
    }

    async fn delete(&self, unit_id: i64, date: NaiveDate) -> Result<(), CacheError> {
        let path = self.entry_path(unit_id, date);

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
