use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use shared_models::TimeInterval;

/// Longest DST gap searched when a wall-clock time does not exist.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// Converts a wall-clock time on `date` in `tz` to an instant.
///
/// Ambiguous times (fall-back) resolve to the earlier instant. Times inside a spring-forward
/// gap move to the first valid local minute after the gap.
pub fn localize(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    let local = date.and_time(time);
    resolve_local(tz, local).or_else(|| {
        (1..=MAX_GAP_MINUTES)
            .map_while(|minutes| local.checked_add_signed(Duration::minutes(minutes)))
            .find_map(|shifted| resolve_local(tz, shifted))
    })
}

fn resolve_local(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Tiles the window `[start, end)` on `date` into back-to-back slots of `duration`.
///
/// Only slots that end at or before the window end are emitted. An empty or inverted
/// window, or a non-positive duration, yields nothing.
pub fn generate_slots(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    duration: Duration,
    tz: &Tz,
) -> Vec<TimeInterval> {
    if duration <= Duration::zero() || start >= end {
        return Vec::new();
    }

    let (Some(window_start), Some(window_end)) = (localize(tz, date, start), localize(tz, date, end))
    else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut current = window_start;

    while let Some(slot_end) = current.checked_add_signed(duration) {
        if slot_end > window_end {
            break;
        }
        slots.push(TimeInterval::new(current, slot_end));
        current = slot_end;
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
    }

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn utc(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
        date.and_time(hm(hour, minute)).and_utc()
    }

    #[test]
    fn three_hour_window_gives_six_half_hour_slots() {
        let slots = generate_slots(monday(), hm(9, 0), hm(12, 0), Duration::minutes(30), &Tz::UTC);

        assert_eq!(slots.len(), 6);
        assert_eq!(slots[0].start, utc(monday(), 9, 0));
        assert_eq!(slots[5].start, utc(monday(), 11, 30));
        assert_eq!(slots[5].end, utc(monday(), 12, 0));
    }

    #[test]
    fn remainder_shorter_than_duration_is_dropped() {
        let slots = generate_slots(monday(), hm(9, 0), hm(10, 15), Duration::minutes(60), &Tz::UTC);

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].end, utc(monday(), 10, 0));
    }

    #[test]
    fn degenerate_windows_yield_nothing() {
        let d = Duration::minutes(30);
        assert!(generate_slots(monday(), hm(9, 0), hm(9, 20), d, &Tz::UTC).is_empty());
        assert!(generate_slots(monday(), hm(12, 0), hm(9, 0), d, &Tz::UTC).is_empty());
        assert!(generate_slots(monday(), hm(9, 0), hm(9, 0), d, &Tz::UTC).is_empty());
        assert!(generate_slots(monday(), hm(9, 0), hm(17, 0), Duration::zero(), &Tz::UTC).is_empty());
    }

    #[test]
    fn local_hours_are_converted_with_the_business_offset() {
        // New York is UTC-4 after the March DST switch.
        let tz: Tz = "America/New_York".parse().unwrap();
        let slots = generate_slots(monday(), hm(9, 0), hm(10, 0), Duration::minutes(30), &tz);

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].start, utc(monday(), 13, 0));
    }

    #[test]
    fn ambiguous_local_time_takes_the_earlier_instant() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let fall_back = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();

        // 01:30 happens twice; the EDT (UTC-4) reading comes first.
        let instant = localize(&tz, fall_back, hm(1, 30)).unwrap();
        assert_eq!(instant, utc(fall_back, 5, 30));
    }

    #[test]
    fn time_inside_dst_gap_moves_to_end_of_gap() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let spring_forward = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();

        // 02:30 does not exist; 03:00 EDT is 07:00 UTC.
        let instant = localize(&tz, spring_forward, hm(2, 30)).unwrap();
        assert_eq!(instant, utc(spring_forward, 7, 0));
    }

    proptest! {
        #[test]
        fn tiling_yields_floor_of_length_over_duration(
            start_minute in 0u32..(20 * 60),
            length in 0i64..(4 * 60),
            duration in 1i64..180,
        ) {
            let start = hm(start_minute / 60, start_minute % 60);
            let end_minute = (start_minute as i64 + length).min(23 * 60 + 59);
            let end = hm((end_minute / 60) as u32, (end_minute % 60) as u32);
            let window = end_minute - start_minute as i64;

            let slots = generate_slots(monday(), start, end, Duration::minutes(duration), &Tz::UTC);

            let expected = if window > 0 { window / duration } else { 0 };
            prop_assert_eq!(slots.len() as i64, expected);
            for pair in slots.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
            for slot in &slots {
                prop_assert_eq!(slot.duration(), Duration::minutes(duration));
                prop_assert!(slot.end <= monday().and_time(end).and_utc());
            }
        }
    }
}
