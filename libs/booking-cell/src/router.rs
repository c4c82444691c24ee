use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/businesses`.
pub fn booking_creation_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/{business_id}/bookings", post(handlers::create_booking))
        .with_state(state)
}

/// Mounted under `/bookings`.
pub fn booking_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::list_my_bookings))
        .route(
            "/{booking_id}",
            get(handlers::get_booking).patch(handlers::update_booking),
        )
        .with_state(state)
}

/// Mounted under `/commands`.
pub fn command_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handlers::handle_command))
        .with_state(state)
}
