use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::Booking;
use shared_utils::{AppJson, AppPath, AppQuery, AppState, CurrentUser};

use crate::models::{BookingListFilter, CreateBookingRequest, UpdateBookingRequest};
use crate::services::booking::BookingService;
use crate::services::commands::{CommandHandler, CommandOutcome, SchedulingCommand};

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    AppPath(business_id): AppPath<Uuid>,
    user: CurrentUser,
    AppJson(request): AppJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking_service = BookingService::new(&state);
    let booking = booking_service
        .create_booking(business_id, user.id(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[axum::debug_handler]
pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    AppQuery(filter): AppQuery<BookingListFilter>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let booking_service = BookingService::new(&state);
    let bookings = booking_service
        .list_customer_bookings(user.id(), filter)
        .await?;
    Ok(Json(bookings))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    AppPath(booking_id): AppPath<Uuid>,
    user: CurrentUser,
) -> Result<Json<Booking>, AppError> {
    let booking_service = BookingService::new(&state);
    let booking = booking_service.get_booking(booking_id, user.id()).await?;
    Ok(Json(booking))
}

#[axum::debug_handler]
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    AppPath(booking_id): AppPath<Uuid>,
    user: CurrentUser,
    AppJson(request): AppJson<UpdateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking_service = BookingService::new(&state);
    let booking = booking_service
        .transition_booking(booking_id, user.id(), request.action, request.reason)
        .await?;
    Ok(Json(booking))
}

#[axum::debug_handler]
pub async fn handle_command(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    AppJson(command): AppJson<SchedulingCommand>,
) -> Result<Json<CommandOutcome>, AppError> {
    let handler = CommandHandler::new(&state);
    let outcome = handler.handle(user.id(), command).await?;
    Ok(Json(outcome))
}
