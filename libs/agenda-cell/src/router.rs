use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn agenda_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/{unit_id}/{date}",
            get(handlers::get_day_agenda).delete(handlers::invalidate_day),
        )
        .route("/{unit_id}/{date}/metrics", get(handlers::get_day_metrics))
        .route("/{unit_id}/{date}/refresh", post(handlers::refresh_day))
        .route("/{unit_id}/refresh-range", post(handlers::refresh_range))
        .with_state(state)
}
