use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/businesses`.
pub fn availability_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/{business_id}/availability", get(handlers::get_availability))
        .with_state(state)
}

/// Mounted under `/providers`.
pub fn provider_schedule_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/{provider_id}/availability",
            get(handlers::get_provider_schedule).put(handlers::replace_provider_schedule),
        )
        .route(
            "/{provider_id}/availability/overrides",
            post(handlers::create_provider_override),
        )
        .with_state(state)
}
