pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::{
    BookingAction, BookingError, BookingListFilter, CreateBookingRequest, UpdateBookingRequest,
};
pub use services::{
    booking::BookingService,
    commands::{CommandError, CommandHandler, CommandOutcome, SchedulingCommand},
    lifecycle::BookingLifecycleService,
};
