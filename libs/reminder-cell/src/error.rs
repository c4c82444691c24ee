use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReminderError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Dispatch failed for booking {booking_id} (attempt {attempts}): {source}")]
    Dispatch {
        booking_id: Uuid,
        attempts: u32,
        source: DispatchError,
    },
}

impl From<ReminderError> for AppError {
    fn from(err: ReminderError) -> Self {
        match err {
            ReminderError::Store(e) if e.is_transient() => AppError::Unavailable(e.to_string()),
            ReminderError::Store(e) => AppError::Internal(e.to_string()),
            dispatch @ ReminderError::Dispatch { .. } => AppError::Unavailable(dispatch.to_string()),
        }
    }
}

/// Failure reported by a reminder transport.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Dispatch timed out after {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },

    #[error("Recipient rejected: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),
}
