pub mod file;
pub mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use shared_config::AppConfig;

use crate::models::DayCacheEntry;

pub use file::FileDayCache;
pub use supabase::SupabaseDayCache;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(String),
}

/// Keyed persistence for computed day views.
///
/// Keys are (clinic unit, calendar date); values are replaced wholesale.
/// `put` must be atomic with respect to readers: a reader sees either the
/// old complete entry or the new one, never a torn write. A stored entry
/// that no longer parses is treated as absent and cleaned up.
#[async_trait]
pub trait DayCache: Send + Sync {
    async fn put(
        &self,
        unit_id: i64,
        date: NaiveDate,
        entry: &DayCacheEntry,
    ) -> Result<(), CacheError>;

    /// Point lookup; `None` is a normal cache miss.
    async fn get(&self, unit_id: i64, date: NaiveDate) -> Result<Option<DayCacheEntry>, CacheError>;

    /// Removes the entry; deleting an absent key is a no-op.
    async fn delete(&self, unit_id: i64, date: NaiveDate) -> Result<(), CacheError>;
}

/// Picks the backend configured by `CACHE_BACKEND`.
pub fn day_cache_from_config(config: &AppConfig) -> Arc<dyn DayCache> {
    match config.cache_backend.as_str() {
        "supabase" => Arc::new(SupabaseDayCache::new(config)),
        _ => Arc::new(FileDayCache::new(&config.cache_dir)),
    }
}
