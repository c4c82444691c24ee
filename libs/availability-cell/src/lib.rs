pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::{
    AvailabilityError, AvailabilityQuery, AvailabilityResponse, AvailableSlot, DayAvailability,
    ProviderSchedule,
};
pub use services::{
    availability::AvailabilityService,
    conflict::{filter_conflicts, first_conflict},
    schedule::{resolve_windows, ResolvedDay, WindowSource},
    slots::{generate_slots, localize},
};
