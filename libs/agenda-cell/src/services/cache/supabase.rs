use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::DayCacheEntry;

use super::{CacheError, DayCache};

const CACHE_TABLE: &str = "agenda_day_cache";

/// Supabase-backed day cache: one row per (unit, date) in
/// `agenda_day_cache` with the whole entry in a JSONB column.
///
/// Keeping the entry in a single row means the full replace is one upsert
/// statement, which gives the atomicity the contract requires without a
/// client-side transaction.
pub struct SupabaseDayCache {
    client: SupabaseClient,
}

impl SupabaseDayCache {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
        }
    }

    fn key_path(unit_id: i64, date: NaiveDate) -> String {
        format!(
            "/rest/v1/{}?unit_id=eq.{}&target_date=eq.{}",
            CACHE_TABLE, unit_id, date
        )
    }
}

#[async_trait]
impl DayCache for SupabaseDayCache {
    async fn put(
        &self,
        unit_id: i64,
        date: NaiveDate,
        entry: &DayCacheEntry,
    ) -> Result<(), CacheError> {
        let row = json!({
            "unit_id": unit_id,
            "target_date": date.to_string(),
            "entry": serde_json::to_value(entry)?,
        });

        self.client
            .upsert(CACHE_TABLE, row)
            .await
            .map_err(|e| CacheError::Store(e.to_string()))?;

        debug!("Cached day view for unit {} on {}", unit_id, date);
        Ok(())
    }

    async fn get(&self, unit_id: i64, date: NaiveDate) -> Result<Option<DayCacheEntry>, CacheError> {
        let path = format!("{}&select=entry", Self::key_path(unit_id, date));

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| CacheError::Store(e.to_string()))?;

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        match serde_json::from_value::<DayCacheEntry>(row["entry"].clone()) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                // Same policy as the file backend: a row that no longer
                // parses is a miss, and the corrupt key gets cleaned up.
                warn!(
                    "Discarding malformed cache row for unit {} on {}: {}",
                    unit_id, date, e
                );
                if let Err(delete_err) = self.delete(unit_id, date).await {
                    warn!(
                        "Could not remove malformed cache row for unit {} on {}: {}",
                        unit_id, date, delete_err
                    );
                }
                Ok(None)
            }
        }
    }

    async fn delete(&self, unit_id: i64, date: NaiveDate) -> Result<(), CacheError> {
        let path = Self::key_path(unit_id, date);

        // PostgREST deletes are no-ops on absent keys, matching the
        // contract.
        let _: Vec<Value> = self
            .client
            .request(Method::DELETE, &path, None)
            .await
            .map_err(|e| CacheError::Store(e.to_string()))?;

        Ok(())
    }
}
