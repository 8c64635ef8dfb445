use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::services::cache::day_cache_from_config;
use crate::services::refresh::{RefreshError, RefreshService};
use crate::services::upstream::AmeiClient;

#[derive(Debug, Deserialize)]
pub struct RangeBody {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

fn refresh_service(config: &AppConfig) -> RefreshService {
    let provider = Arc::new(AmeiClient::new(config));
    let cache = day_cache_from_config(config);
    RefreshService::new(provider, cache)
}

fn map_refresh_error(e: RefreshError) -> AppError {
    AppError::Upstream(e.to_string())
}

/// Read-through day view: serves the cached entry, recomputing on a miss.
#[axum::debug_handler]
pub async fn get_day_agenda(
    State(state): State<Arc<AppConfig>>,
    Path((unit_id, date)): Path<(i64, NaiveDate)>,
) -> Result<Json<Value>, AppError> {
    let service = refresh_service(&state);

    let entry = service
        .load_day(unit_id, date)
        .await
        .map_err(map_refresh_error)?;

    Ok(Json(json!(entry)))
}

/// Metrics blocks only. Always fully populated; an empty day yields the
/// all-zero shape, never nulls.
#[axum::debug_handler]
pub async fn get_day_metrics(
    State(state): State<Arc<AppConfig>>,
    Path((unit_id, date)): Path<(i64, NaiveDate)>,
) -> Result<Json<Value>, AppError> {
    let service = refresh_service(&state);

    let entry = service
        .load_day(unit_id, date)
        .await
        .map_err(map_refresh_error)?;

    Ok(Json(json!({
        "summary": entry.summary,
        "confirmation_ranking": entry.confirmation_ranking,
        "occupancy_ranking": entry.occupancy_ranking,
        "conversion_ranking": entry.conversion_ranking,
        "conversion": entry.conversion,
        "last_updated": entry.last_updated,
    })))
}

/// Forced recompute for one day.
#[axum::debug_handler]
pub async fn refresh_day(
    State(state): State<Arc<AppConfig>>,
    Path((unit_id, date)): Path<(i64, NaiveDate)>,
) -> Result<Json<Value>, AppError> {
    let service = refresh_service(&state);

    let outcome = service
        .refresh_day(unit_id, date)
        .await
        .map_err(map_refresh_error)?;

    Ok(Json(json!({
        "unit_id": unit_id,
        "date": date,
        "refreshed": true,
        "persisted": outcome.persisted,
        "persist_error": outcome.persist_error,
    })))
}

/// Inclusive date-range recompute; per-day failures are reported, not
/// fatal.
#[axum::debug_handler]
pub async fn refresh_range(
    State(state): State<Arc<AppConfig>>,
    Path(unit_id): Path<i64>,
    Json(body): Json<RangeBody>,
) -> Result<Json<Value>, AppError> {
    if body.start > body.end {
        return Err(AppError::BadRequest(
            "start date must not be after end date".to_string(),
        ));
    }

    let service = refresh_service(&state);
    let report = service.refresh_range(unit_id, body.start, body.end).await;

    Ok(Json(json!(report)))
}

/// Forced invalidation; deleting an absent key succeeds.
#[axum::debug_handler]
pub async fn invalidate_day(
    State(state): State<Arc<AppConfig>>,
    Path((unit_id, date)): Path<(i64, NaiveDate)>,
) -> Result<StatusCode, AppError> {
    let cache = day_cache_from_config(&state);

    cache
        .delete(unit_id, date)
        .await
        .map_err(|e| AppError::Cache(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}
