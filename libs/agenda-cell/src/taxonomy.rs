use serde::{Deserialize, Serialize};

use crate::models::EffectiveStatus;

/// Semantic role of an effective status key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBucket {
    Free,
    Blocked,
    Confirmed,
    Attended,
    NoShow,
    OtherOccupied,
}

/// Classification of raw status strings into the buckets every metric
/// uses. The vocabulary is data, not code: clinics reclassify statuses
/// between revisions (notably whether "Aguardando pós-consulta" counts as
/// attended), so the sets are configurable and the default codifies the
/// current rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusTaxonomy {
    pub free: String,
    pub blocked: String,
    /// Substring match: covers both the exact status and the composite
    /// fit-in form.
    pub confirmed_marker: String,
    pub attended: Vec<String>,
    pub no_show: Vec<String>,
}

impl Default for StatusTaxonomy {
    fn default() -> Self {
        Self {
            free: "Livre".to_string(),
            blocked: "Bloqueado".to_string(),
            confirmed_marker: "Marcado - confirmado".to_string(),
            attended: vec![
                "Atendido".to_string(),
                "Atendido pós-consulta".to_string(),
                "Aguardando pós-consulta".to_string(),
            ],
            no_show: vec![
                "Não compareceu".to_string(),
                "Não compareceu pós-consulta".to_string(),
            ],
        }
    }
}

impl StatusTaxonomy {
    /// Total classification: composite `FitIn(...)` keys are classified by
    /// their inner status, unknown statuses land in `OtherOccupied`.
    pub fn bucket(&self, status_key: &str) -> StatusBucket {
        let status = EffectiveStatus::resolved_of(status_key);

        if status == self.free {
            StatusBucket::Free
        } else if status == self.blocked {
            StatusBucket::Blocked
        } else if status.contains(&self.confirmed_marker) {
            StatusBucket::Confirmed
        } else if self.attended.iter().any(|s| s == status) {
            StatusBucket::Attended
        } else if self.no_show.iter().any(|s| s == status) {
            StatusBucket::NoShow
        } else {
            StatusBucket::OtherOccupied
        }
    }

    /// Anything not free or blocked counts as occupied.
    pub fn is_occupied(&self, status_key: &str) -> bool {
        !matches!(
            self.bucket(status_key),
            StatusBucket::Free | StatusBucket::Blocked
        )
    }

    pub fn is_confirmed(&self, status_key: &str) -> bool {
        self.bucket(status_key) == StatusBucket::Confirmed
    }

    pub fn is_attended(&self, status_key: &str) -> bool {
        self.bucket(status_key) == StatusBucket::Attended
    }
}
