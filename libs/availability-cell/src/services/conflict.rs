use shared_models::{Booking, TimeInterval};

/// The first committed booking overlapping `interval`, if any.
///
/// Bookings that no longer hold their time are ignored even when passed in.
pub fn first_conflict<'a>(interval: &TimeInterval, bookings: &'a [Booking]) -> Option<&'a Booking> {
    bookings
        .iter()
        .filter(|booking| booking.is_committed())
        .find(|booking| booking.interval().overlaps(interval))
}

/// Keeps the candidates that overlap no committed booking.
pub fn filter_conflicts(candidates: Vec<TimeInterval>, bookings: &[Booking]) -> Vec<TimeInterval> {
    candidates
        .into_iter()
        .filter(|slot| first_conflict(slot, bookings).is_none())
        .collect()
}
