use std::sync::Arc;

use axum::{routing::get, Router};

use availability_cell::router::{availability_routes, provider_schedule_routes};
use booking_cell::router::{booking_creation_routes, booking_routes, command_routes};
use reminder_cell::router::reminder_routes;
use reminder_cell::ReminderScheduler;
use shared_utils::AppState;

pub fn create_router(state: Arc<AppState>, reminders: Arc<ReminderScheduler>) -> Router {
    let business_routes =
        availability_routes(state.clone()).merge(booking_creation_routes(state.clone()));

    Router::new()
        .route("/", get(|| async { "BookIt scheduling API is running!" }))
        .nest("/businesses", business_routes)
        .nest("/providers", provider_schedule_routes(state.clone()))
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/commands", command_routes(state))
        .nest("/reminders", reminder_routes(reminders))
}
