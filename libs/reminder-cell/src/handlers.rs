use std::sync::Arc;

use axum::{extract::State, Json};

use shared_models::error::AppError;

use crate::models::SweepReport;
use crate::services::scheduler::ReminderScheduler;

/// Runs one sweep immediately, outside the timer.
#[axum::debug_handler]
pub async fn run_sweep(
    State(scheduler): State<Arc<ReminderScheduler>>,
) -> Result<Json<SweepReport>, AppError> {
    let report = scheduler.run_sweep(scheduler.now()).await?;
    Ok(Json(report))
}
