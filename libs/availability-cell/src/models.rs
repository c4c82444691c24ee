use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::{DateOverride, WeeklyScheduleBlock};

// ==============================================================================
// QUERY MODELS
// ==============================================================================

#[derive(Debug, Clone)]
pub struct AvailabilityQuery {
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub provider_id: Option<Uuid>,
    /// First day of the range; defaults to today in the business timezone.
    pub from_date: Option<NaiveDate>,
    /// Number of days; defaults to the configured default.
    pub days: Option<u32>,
}

/// An open slot tagged with the provider that would serve it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailableSlot {
    pub provider_id: Uuid,
    pub provider_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Open slots per requested date, each list ascending by start time.
pub type SlotsByDate = BTreeMap<NaiveDate, Vec<AvailableSlot>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub slots: Vec<AvailableSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub timezone: Tz,
    pub days: Vec<DayAvailability>,
}

impl AvailabilityResponse {
    pub fn new(business_id: Uuid, service_id: Uuid, timezone: Tz, slots: SlotsByDate) -> Self {
        Self {
            business_id,
            service_id,
            timezone,
            days: slots
                .into_iter()
                .map(|(date, slots)| DayAvailability { date, slots })
                .collect(),
        }
    }
}

// ==============================================================================
// PROVIDER SCHEDULE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleBlockInput {
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceScheduleRequest {
    pub blocks: Vec<ScheduleBlockInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOverrideRequest {
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Closed for the whole day unless explicitly opened with custom hours.
    #[serde(default = "default_true")]
    pub is_blocked: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSchedule {
    pub provider_id: Uuid,
    pub weekly: Vec<WeeklyScheduleBlock>,
    pub overrides: Vec<DateOverride>,
}

fn default_true() -> bool {
    true
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Business not found")]
    BusinessNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("No active provider offers this service")]
    NoEligibleProvider,

    #[error("Provider not found")]
    ProviderNotFound,

    #[error("Only the provider's linked user may change this schedule")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("An override already exists for {0}")]
    DuplicateOverride(NaiveDate),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AvailabilityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateOverride { date, .. } => AvailabilityError::DuplicateOverride(date),
            other => AvailabilityError::Store(other),
        }
    }
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        let message = err.to_string();
        match err {
            AvailabilityError::BusinessNotFound => AppError::NotFound("business_not_found", message),
            AvailabilityError::ServiceNotFound => AppError::NotFound("service_not_found", message),
            AvailabilityError::NoEligibleProvider => AppError::Rule("no_eligible_provider", message),
            // Callers that may not edit a provider learn nothing about it.
            AvailabilityError::ProviderNotFound | AvailabilityError::Forbidden => {
                AppError::NotFound("provider_not_found", "Provider not found".to_string())
            }
            AvailabilityError::Validation(msg) => AppError::BadRequest(msg),
            AvailabilityError::DuplicateOverride(_) => AppError::Conflict("duplicate_override", message),
            AvailabilityError::Store(store_err) if store_err.is_transient() => {
                AppError::Unavailable(store_err.to_string())
            }
            AvailabilityError::Store(store_err) => AppError::Internal(store_err.to_string()),
        }
    }
}
