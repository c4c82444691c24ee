use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// TENANT CATALOG
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub timezone: Tz,
    pub auto_confirm_bookings: bool,
    pub reminder_lead_minutes: i64,
    pub subscription_status: SubscriptionStatus,
}

impl Business {
    /// Only trialing and paying tenants take part in background processing.
    pub fn is_active(&self) -> bool {
        matches!(
            self.subscription_status,
            SubscriptionStatus::Trial | SubscriptionStatus::Active
        )
    }

    pub fn reminder_lead(&self) -> Duration {
        Duration::minutes(self.reminder_lead_minutes)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Suspended,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub duration_minutes: i64,
    pub price: f64,
    pub is_active: bool,
}

impl Service {
    pub fn duration(&self) -> Duration {
        Duration::minutes(self.duration_minutes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub business_id: Uuid,
    pub display_name: String,
    /// The user account that manages this provider's calendar, if any.
    pub user_id: Option<Uuid>,
    pub is_active: bool,
}

impl Provider {
    pub fn is_managed_by(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProviderOffering {
    pub provider_id: Uuid,
    pub service_id: Uuid,
}

// ==============================================================================
// WORKING HOURS
// ==============================================================================

/// A recurring block of working hours. `day_of_week` is 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyScheduleBlock {
    pub provider_id: Uuid,
    pub day_of_week: u8,
    #[serde(with = "crate::clock_time")]
    pub start_time: NaiveTime,
    #[serde(with = "crate::clock_time")]
    pub end_time: NaiveTime,
    pub is_available: bool,
}

/// A date-specific exception to the weekly schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DateOverride {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "crate::clock_time::option", default)]
    pub start_time: Option<NaiveTime>,
    #[serde(with = "crate::clock_time::option", default)]
    pub end_time: Option<NaiveTime>,
    pub is_blocked: bool,
    pub reason: Option<String>,
}

impl DateOverride {
    /// Custom hours apply only when the override is open and carries both bounds.
    pub fn custom_hours(&self) -> Option<(NaiveTime, NaiveTime)> {
        if self.is_blocked {
            return None;
        }
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

/// Day-of-week index used by schedule records: 0 = Sunday .. 6 = Saturday.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

// ==============================================================================
// INTERVALS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Half-open overlap: intervals that merely touch do not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
