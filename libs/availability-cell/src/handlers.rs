use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::{DateOverride, WeeklyScheduleBlock};
use shared_utils::{AppJson, AppPath, AppQuery, AppState, CurrentUser};

use crate::models::{
    AvailabilityQuery, AvailabilityResponse, CreateOverrideRequest, ProviderSchedule,
    ReplaceScheduleRequest,
};
use crate::services::AvailabilityService;

#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub service_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub days: Option<u32>,
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    AppPath(business_id): AppPath<Uuid>,
    AppQuery(params): AppQuery<AvailabilityParams>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let service = AvailabilityService::new(&state);

    let query = AvailabilityQuery {
        business_id,
        service_id: params.service_id,
        provider_id: params.provider_id,
        from_date: params.date,
        days: params.days,
    };

    let (business, slots) = service.resolve_availability(query).await?;

    Ok(Json(AvailabilityResponse::new(
        business.id,
        params.service_id,
        business.timezone,
        slots,
    )))
}

#[axum::debug_handler]
pub async fn get_provider_schedule(
    State(state): State<Arc<AppState>>,
    AppPath(provider_id): AppPath<Uuid>,
) -> Result<Json<ProviderSchedule>, AppError> {
    let service = AvailabilityService::new(&state);
    let schedule = service.get_schedule(provider_id).await?;
    Ok(Json(schedule))
}

// ==============================================================================
// PROVIDER-ONLY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn replace_provider_schedule(
    State(state): State<Arc<AppState>>,
    AppPath(provider_id): AppPath<Uuid>,
    user: CurrentUser,
    AppJson(request): AppJson<ReplaceScheduleRequest>,
) -> Result<Json<Vec<WeeklyScheduleBlock>>, AppError> {
    let service = AvailabilityService::new(&state);
    let saved = service
        .replace_schedule(provider_id, user.id(), request.blocks)
        .await?;
    Ok(Json(saved))
}

#[axum::debug_handler]
pub async fn create_provider_override(
    State(state): State<Arc<AppState>>,
    AppPath(provider_id): AppPath<Uuid>,
    user: CurrentUser,
    AppJson(request): AppJson<CreateOverrideRequest>,
) -> Result<(StatusCode, Json<DateOverride>), AppError> {
    let service = AvailabilityService::new(&state);
    let saved = service
        .create_override(provider_id, user.id(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}
