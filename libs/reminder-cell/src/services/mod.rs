pub mod dispatcher;
pub mod scheduler;
pub mod templates;

pub use dispatcher::{LoggingDispatcher, ReminderDispatcher};
pub use scheduler::ReminderScheduler;
