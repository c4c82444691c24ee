use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use shared_models::{day_of_week, DateOverride, WeeklyScheduleBlock};

/// Which rule produced a day's working windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WindowSource {
    BlockedOverride,
    CustomHoursOverride,
    WeeklySchedule,
    NoSchedule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDay {
    pub windows: Vec<(NaiveTime, NaiveTime)>,
    pub source: WindowSource,
}

impl ResolvedDay {
    fn closed(source: WindowSource) -> Self {
        Self {
            windows: Vec::new(),
            source,
        }
    }
}

/// Effective working windows of one provider on `date`.
///
/// A blocking override closes the day. An open override with both bounds replaces the
/// weekly hours. Otherwise every available weekly block for that weekday applies, ordered
/// by start time. A blocking override wins when several overrides share the date.
pub fn resolve_windows(
    weekly: &[WeeklyScheduleBlock],
    overrides: &[DateOverride],
    date: NaiveDate,
) -> ResolvedDay {
    let todays: Vec<&DateOverride> = overrides.iter().filter(|o| o.date == date).collect();

    if todays.iter().any(|o| o.is_blocked) {
        return ResolvedDay::closed(WindowSource::BlockedOverride);
    }

    if let Some(hours) = todays.iter().find_map(|o| o.custom_hours()) {
        return ResolvedDay {
            windows: vec![hours],
            source: WindowSource::CustomHoursOverride,
        };
    }

    let weekday = day_of_week(date);
    let mut windows: Vec<(NaiveTime, NaiveTime)> = weekly
        .iter()
        .filter(|block| block.day_of_week == weekday && block.is_available)
        .map(|block| (block.start_time, block.end_time))
        .collect();
    windows.sort_by_key(|(start, _)| *start);

    if windows.is_empty() {
        ResolvedDay::closed(WindowSource::NoSchedule)
    } else {
        ResolvedDay {
            windows,
            source: WindowSource::WeeklySchedule,
        }
    }
}
