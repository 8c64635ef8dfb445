use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::models::{DayCacheEntry, EffectiveStatus, ProfessionalSchedule, Slot, StatusCountTable};
use crate::taxonomy::StatusTaxonomy;

use super::cache::DayCache;
use super::upstream::{Professional, ScheduleProvider};

/// Fixed reference zone for the last-updated stamp (clinic local time,
/// UTC-03:00).
const CLINIC_UTC_OFFSET_SECS: i32 = -3 * 3600;

#[derive(Error, Debug)]
pub enum RefreshError {
    /// The upstream listed no professionals at all. The refresh aborts
    /// without touching the cache: a transient outage must not overwrite
    /// good cached data with an empty entry.
    #[error("upstream returned no professionals for unit {0}")]
    NoProfessionals(i64),

    #[error("upstream request failed: {0}")]
    Upstream(String),
}

/// Result of one day refresh. The computed entry is always returned, even
/// when persisting it failed; the caller decides whether to retry or just
/// surface a warning.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub entry: DayCacheEntry,
    pub persisted: bool,
    pub persist_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DayRefreshStatus {
    pub date: NaiveDate,
    pub refreshed: bool,
    pub persisted: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RangeReport {
    pub days: Vec<DayRefreshStatus>,
}

/// Rebuilds the cached day view for a (unit, date): fetches professionals
/// and their slots, accumulates the status-count table, runs the metric
/// functions, and writes through the cache.
pub struct RefreshService {
    provider: Arc<dyn ScheduleProvider>,
    cache: Arc<dyn DayCache>,
    taxonomy: StatusTaxonomy,
}

impl RefreshService {
    pub fn new(provider: Arc<dyn ScheduleProvider>, cache: Arc<dyn DayCache>) -> Self {
        Self {
            provider,
            cache,
            taxonomy: StatusTaxonomy::default(),
        }
    }

    pub fn with_taxonomy(mut self, taxonomy: StatusTaxonomy) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    /// Recomputes one day and writes it through the cache.
    pub async fn refresh_day(
        &self,
        unit_id: i64,
        date: NaiveDate,
    ) -> Result<RefreshOutcome, RefreshError> {
        info!("Refreshing agenda for unit {} on {}", unit_id, date);

        let professionals = self
            .provider
            .fetch_professionals(unit_id)
            .await
            .map_err(|e| RefreshError::Upstream(e.to_string()))?;

        if professionals.is_empty() {
            return Err(RefreshError::NoProfessionals(unit_id));
        }

        let mut table = StatusCountTable::default();
        let mut agendas: BTreeMap<String, ProfessionalSchedule> = BTreeMap::new();

        for professional in &professionals {
            let slots = self.fetch_slots_degraded(professional, date, unit_id).await;
            if slots.is_empty() {
                continue;
            }

            for slot in &slots {
                table.increment(&professional.name, EffectiveStatus::from_slot(slot).key());
            }

            agendas.insert(
                professional.name.clone(),
                ProfessionalSchedule {
                    id: professional.id,
                    slots: sort_by_hour(slots),
                },
            );
        }

        let entry = self.build_entry(agendas, table);

        let (persisted, persist_error) = match self.cache.put(unit_id, date, &entry).await {
            Ok(()) => (true, None),
            Err(e) => {
                // The computed entry is still returned; persistence failing
                // must not fail the refresh itself.
                warn!(
                    "Cache write failed for unit {} on {}: {}",
                    unit_id, date, e
                );
                (false, Some(e.to_string()))
            }
        };

        Ok(RefreshOutcome {
            entry,
            persisted,
            persist_error,
        })
    }

    /// Inclusive date-range refresh; continues past per-day failures.
    pub async fn refresh_range(&self, unit_id: i64, start: NaiveDate, end: NaiveDate) -> RangeReport {
        let mut days = Vec::new();
        let mut current = start;

        while current <= end {
            match self.refresh_day(unit_id, current).await {
                Ok(outcome) => days.push(DayRefreshStatus {
                    date: current,
                    refreshed: true,
                    persisted: outcome.persisted,
                    error: outcome.persist_error,
                }),
                Err(e) => {
                    warn!("Refresh failed for unit {} on {}: {}", unit_id, current, e);
                    days.push(DayRefreshStatus {
                        date: current,
                        refreshed: false,
                        persisted: false,
                        error: Some(e.to_string()),
                    });
                }
            }

            current = match current.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        RangeReport { days }
    }

    /// Read-through lookup: cache hit serves directly; a miss, a read
    /// failure, or a malformed entry all fall through to a refresh.
    pub async fn load_day(&self, unit_id: i64, date: NaiveDate) -> Result<DayCacheEntry, RefreshError> {
        match self.cache.get(unit_id, date).await {
            Ok(Some(entry)) => {
                debug!("Cache hit for unit {} on {}", unit_id, date);
                return Ok(entry);
            }
            Ok(None) => {
                debug!("Cache miss for unit {} on {}", unit_id, date);
            }
            Err(e) => {
                warn!(
                    "Cache read failed for unit {} on {}, falling back to refresh: {}",
                    unit_id, date, e
                );
            }
        }

        let outcome = self.refresh_day(unit_id, date).await?;
        Ok(outcome.entry)
    }

    async fn fetch_slots_degraded(
        &self,
        professional: &Professional,
        date: NaiveDate,
        unit_id: i64,
    ) -> Vec<Slot> {
        match self
            .provider
            .fetch_slots(professional.id, date, unit_id)
            .await
        {
            Ok(slots) => slots,
            Err(e) => {
                // Partial degradation: one professional failing must not
                // abort the whole refresh.
                warn!(
                    "Slot fetch failed for professional {} ({}) on {}: {}",
                    professional.name, professional.id, date, e
                );
                Vec::new()
            }
        }
    }

    fn build_entry(
        &self,
        agendas: BTreeMap<String, ProfessionalSchedule>,
        table: StatusCountTable,
    ) -> DayCacheEntry {
        let offset =
            FixedOffset::east_opt(CLINIC_UTC_OFFSET_SECS).expect("clinic offset is in range");

        DayCacheEntry {
            summary: metrics::compute_summary(&table, &self.taxonomy),
            confirmation_ranking: metrics::rank_confirmation(&table, &self.taxonomy),
            occupancy_ranking: metrics::rank_occupation(&table, &self.taxonomy),
            conversion_ranking: metrics::rank_conversion(&table, &self.taxonomy),
            conversion: metrics::global_conversion_rate(&table, &self.taxonomy),
            status_counts: table,
            agendas,
            last_updated: Utc::now().with_timezone(&offset),
        }
    }
}

/// Ascending by numeric hour; the sort is stable, so equal hours keep the
/// upstream fetch order.
fn sort_by_hour(mut slots: Vec<Slot>) -> Vec<Slot> {
    slots.sort_by(|a, b| {
        a.numeric_hour
            .partial_cmp(&b.numeric_hour)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    slots
}
