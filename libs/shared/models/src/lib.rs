pub mod auth;
pub mod booking;
pub mod clock_time;
pub mod error;
pub mod scheduling;

pub use auth::ActingUser;
pub use booking::{Booking, BookingStatus, CancelledBy, ConfirmationType};
pub use error::AppError;
pub use scheduling::{
    day_of_week, Business, DateOverride, Provider, ProviderOffering, Service,
    SubscriptionStatus, TimeInterval, WeeklyScheduleBlock,
};
