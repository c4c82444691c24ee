pub mod availability;
pub mod conflict;
pub mod schedule;
pub mod slots;

pub use availability::AvailabilityService;
