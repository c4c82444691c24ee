use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers;
use crate::services::scheduler::ReminderScheduler;

/// Mounted under `/reminders`.
pub fn reminder_routes(scheduler: Arc<ReminderScheduler>) -> Router {
    Router::new()
        .route("/sweep", post(handlers::run_sweep))
        .with_state(scheduler)
}
