use tracing::{debug, warn};

use shared_models::BookingStatus;

use crate::models::{BookingAction, BookingError};

#[derive(Debug, Default, Clone, Copy)]
pub struct BookingLifecycleService;

impl BookingLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: BookingStatus,
        new_status: BookingStatus,
    ) -> Result<(), BookingError> {
        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(BookingError::InvalidState(current_status));
        }

        debug!("Status transition validated: {} -> {}", current_status, new_status);
        Ok(())
    }

    /// All statuses reachable from `current_status` in one step.
    pub fn get_valid_transitions(&self, current_status: BookingStatus) -> &'static [BookingStatus] {
        match current_status {
            BookingStatus::Pending => &[BookingStatus::Confirmed, BookingStatus::Cancelled],
            // Completion is recorded out of band; reverting to Pending is allowed by the table
            // but no action here performs it.
            BookingStatus::Confirmed => &[
                BookingStatus::Pending,
                BookingStatus::Cancelled,
                BookingStatus::Completed,
            ],
            BookingStatus::Cancelled | BookingStatus::Completed => &[],
        }
    }

    /// Target status of a user action.
    pub fn target_status(&self, action: BookingAction) -> BookingStatus {
        match action {
            BookingAction::Confirm => BookingStatus::Confirmed,
            BookingAction::Cancel => BookingStatus::Cancelled,
        }
    }
}
