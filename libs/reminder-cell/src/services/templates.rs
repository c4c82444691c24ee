use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// What a reminder says about its booking.
#[derive(Debug, Clone)]
pub struct ReminderContext<'a> {
    pub business_name: &'a str,
    pub service_name: &'a str,
    pub provider_name: &'a str,
    pub start_time: DateTime<Utc>,
    pub timezone: Tz,
}

/// Renders the reminder text with the start time in the business timezone.
pub fn render_reminder(context: &ReminderContext<'_>) -> String {
    let local = context.start_time.with_timezone(&context.timezone);
    format!(
        "Reminder: you have {} with {} coming up.\n{}\n{}",
        context.service_name,
        context.provider_name,
        local.format("%a, %b %-d at %-I:%M %p %Z"),
        context.business_name
    )
}
