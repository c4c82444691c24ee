pub mod booking;
pub mod commands;
pub mod lifecycle;

pub use booking::BookingService;
pub use commands::CommandHandler;
pub use lifecycle::BookingLifecycleService;
