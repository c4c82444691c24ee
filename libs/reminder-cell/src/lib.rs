pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::{DispatchError, ReminderError};
pub use models::{ReminderMessage, SweepReport};
pub use services::{
    dispatcher::{LoggingDispatcher, ReminderDispatcher},
    scheduler::ReminderScheduler,
    templates::{render_reminder, ReminderContext},
};
