use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use shared_models::BookingStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Time range already taken for provider {0}")]
    SlotTaken(Uuid),

    #[error("Override already exists for provider {provider_id} on {date}")]
    DuplicateOverride { provider_id: Uuid, date: NaiveDate },

    #[error("Booking {id} is {actual}, expected {expected}")]
    StaleStatus {
        id: Uuid,
        expected: BookingStatus,
        actual: BookingStatus,
    },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Transient failures the caller may retry; everything else is a definite answer.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
