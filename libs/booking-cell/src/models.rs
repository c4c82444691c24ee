use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::BookingStatus;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub service_id: Uuid,
    pub provider_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingAction {
    Confirm,
    Cancel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookingRequest {
    pub action: BookingAction,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingListFilter {
    pub status: Option<BookingStatus>,
    /// Only future Pending/Confirmed bookings.
    #[serde(default)]
    pub upcoming: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid booking request: {0}")]
    Validation(String),

    #[error("Booking time must be in the future")]
    InThePast,

    #[error("Business not found")]
    BusinessNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Service is not bookable")]
    ServiceInactive,

    #[error("Provider not found")]
    ProviderNotFound,

    #[error("Provider does not offer this service")]
    ProviderServiceMismatch,

    #[error("Requested time overlaps an existing booking")]
    SlotConflict,

    #[error("Booking not found")]
    NotFound,

    #[error("Unauthorized access to booking")]
    Unauthorized,

    #[error("Booking cannot be changed in current status: {0}")]
    InvalidState(BookingStatus),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SlotTaken(_) => BookingError::SlotConflict,
            StoreError::StaleStatus { actual, .. } => BookingError::InvalidState(actual),
            StoreError::NotFound(_) => BookingError::NotFound,
            other => BookingError::Store(other),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match err {
            BookingError::Validation(msg) => AppError::BadRequest(msg),
            BookingError::InThePast => AppError::Rule("in_the_past", message),
            BookingError::BusinessNotFound => AppError::NotFound("business_not_found", message),
            BookingError::ServiceNotFound => AppError::NotFound("service_not_found", message),
            BookingError::ServiceInactive => AppError::Rule("service_inactive", message),
            BookingError::ProviderNotFound => AppError::NotFound("provider_not_found", message),
            BookingError::ProviderServiceMismatch => {
                AppError::Rule("provider_service_mismatch", message)
            }
            BookingError::SlotConflict => AppError::Conflict("slot_conflict", message),
            // Outsiders cannot tell a foreign booking from a missing one.
            BookingError::NotFound | BookingError::Unauthorized => {
                AppError::NotFound("booking_not_found", "Booking not found".to_string())
            }
            BookingError::InvalidState(_) => AppError::Conflict("invalid_state", message),
            BookingError::Store(store_err) if store_err.is_transient() => {
                AppError::Unavailable(store_err.to_string())
            }
            BookingError::Store(store_err) => AppError::Internal(store_err.to_string()),
        }
    }
}
