pub mod handlers;
pub mod metrics;
pub mod models;
pub mod router;
pub mod services;
pub mod taxonomy;

pub use models::{
    ConversionSummary, DayCacheEntry, EffectiveStatus, ProfessionalSchedule, RankingEntry, Slot,
    StatusCountTable, SummaryMetrics,
};
pub use taxonomy::{StatusBucket, StatusTaxonomy};
