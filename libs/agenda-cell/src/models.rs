use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One schedulable time unit on a professional's daily agenda.
///
/// Slots are rebuilt from the upstream API on every fetch and never mutated
/// after they have been counted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    pub hour: String,
    pub numeric_hour: f64,
    pub status: String,
    pub appointment_status: Option<String>,
    pub is_fit_in: bool,
    pub patient_id: Option<i64>,
    pub appointment_id: Option<i64>,
}

/// Tagged form of a slot's effective status.
///
/// Composite keys like `FitIn(Atendido)` used to be built by ad hoc string
/// concatenation; this type makes the composition total and keeps the
/// display-key rule in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveStatus {
    pub base: String,
    pub fit_in: bool,
    pub resolved: Option<String>,
}

impl EffectiveStatus {
    pub fn from_slot(slot: &Slot) -> Self {
        Self {
            base: slot.status.clone(),
            fit_in: slot.is_fit_in,
            resolved: slot.appointment_status.clone(),
        }
    }

    /// Display key used in the status-count table.
    ///
    /// A resolved outcome on a fit-in slot keeps the fit-in marker; a
    /// resolved outcome on a regular slot replaces the base status; an
    /// unresolved slot keeps its raw status.
    pub fn key(&self) -> String {
        match (&self.resolved, self.fit_in) {
            (Some(outcome), true) => format!("FitIn({})", outcome),
            (Some(outcome), false) => outcome.clone(),
            (None, _) => self.base.clone(),
        }
    }

    /// Unwraps a composite `FitIn(...)` key back to the inner status.
    pub fn resolved_of(key: &str) -> &str {
        key.strip_prefix("FitIn(")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(key)
    }
}

/// A professional's schedule for one date, slots sorted by `numeric_hour`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfessionalSchedule {
    pub id: i64,
    pub slots: Vec<Slot>,
}

/// Per-professional status counts for one professional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfessionalStatusCounts {
    pub professional: String,
    pub counts: BTreeMap<String, u32>,
}

impl ProfessionalStatusCounts {
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }
}

/// Professional -> effective-status -> count table.
///
/// Rows keep professional encounter order; ranking tie stability depends
/// on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusCountTable {
    pub rows: Vec<ProfessionalStatusCounts>,
}

impl StatusCountTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bumps the count for `(professional, status_key)`, creating the row
    /// on first encounter.
    pub fn increment(&mut self, professional: &str, status_key: String) {
        let idx = match self.rows.iter().position(|r| r.professional == professional) {
            Some(idx) => idx,
            None => {
                self.rows.push(ProfessionalStatusCounts {
                    professional: professional.to_string(),
                    counts: BTreeMap::new(),
                });
                self.rows.len() - 1
            }
        };

        *self.rows[idx].counts.entry(status_key).or_insert(0) += 1;
    }

    pub fn get(&self, professional: &str) -> Option<&ProfessionalStatusCounts> {
        self.rows.iter().find(|r| r.professional == professional)
    }
}

/// Headline metrics for the dashboard cards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryMetrics {
    pub total_scheduled: u32,
    pub total_confirmed: u32,
    pub confirmation_rate: String,
    pub total_occupied: u32,
    pub total_slots_available: u32,
    pub occupancy_rate: String,
}

impl Default for SummaryMetrics {
    fn default() -> Self {
        Self {
            total_scheduled: 0,
            total_confirmed: 0,
            confirmation_rate: "0.00%".to_string(),
            total_occupied: 0,
            total_slots_available: 0,
            occupancy_rate: "0.00%".to_string(),
        }
    }
}

/// One row of a per-professional ranking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingEntry {
    pub professional: String,
    pub numerator: u32,
    pub denominator: u32,
    pub rate: String,
}

/// Global attended-visit conversion for one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionSummary {
    pub conversion_rate: String,
    pub total_attended: u32,
    pub total_valid_bookings: u32,
}

impl Default for ConversionSummary {
    fn default() -> Self {
        Self {
            conversion_rate: "0.00%".to_string(),
            total_attended: 0,
            total_valid_bookings: 0,
        }
    }
}

/// The unit of cache persistence: the full computed view for one
/// (unit, date), replaced wholesale on every refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayCacheEntry {
    pub agendas: BTreeMap<String, ProfessionalSchedule>,
    pub status_counts: StatusCountTable,
    pub summary: SummaryMetrics,
    pub confirmation_ranking: Vec<RankingEntry>,
    pub occupancy_ranking: Vec<RankingEntry>,
    pub conversion_ranking: Vec<RankingEntry>,
    pub conversion: ConversionSummary,
    pub last_updated: DateTime<FixedOffset>,
}
