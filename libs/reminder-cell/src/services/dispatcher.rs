use async_trait::async_trait;
use tracing::info;

use crate::error::DispatchError;
use crate::models::ReminderMessage;

/// Delivery seam for reminders. Transports (SMS, email, chat) live outside this crate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReminderDispatcher: Send + Sync {
    async fn dispatch(&self, message: &ReminderMessage) -> Result<(), DispatchError>;
}

/// Writes reminders to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDispatcher;

#[async_trait]
impl ReminderDispatcher for LoggingDispatcher {
    async fn dispatch(&self, message: &ReminderMessage) -> Result<(), DispatchError> {
        info!(
            booking_id = %message.booking_id,
            customer_id = %message.customer_id,
            "Reminder: {}",
            message.body
        );
        Ok(())
    }
}
