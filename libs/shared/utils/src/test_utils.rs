//! Seeded fixtures shared by the cells' test suites.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{InMemoryStore, ScheduleStore};
use shared_models::{
    Booking, BookingStatus, Business, ConfirmationType, DateOverride, Provider, Service,
    SubscriptionStatus, WeeklyScheduleBlock,
};

use crate::clock::FixedClock;
use crate::state::AppState;

/// Monday 2026-03-16, the reference day used across the suites.
pub fn reference_monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// One business, one 30-minute service and one provider working Mon–Fri 09:00–17:00.
/// The clock sits on the Friday before [`reference_monday`] at noon, business time.
pub struct SchedulingFixture {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
    pub config: AppConfig,
    pub business: Business,
    pub service: Service,
    pub provider: Provider,
    pub provider_user: Uuid,
    pub customer: Uuid,
}

impl SchedulingFixture {
    pub async fn new() -> Self {
        Self::with_business(|_| {}).await
    }

    pub async fn with_business(customize: impl FnOnce(&mut Business)) -> Self {
        let store = Arc::new(InMemoryStore::new());

        let mut business = Business {
            id: Uuid::new_v4(),
            name: "Fade Street Barbers".to_string(),
            timezone: Tz::UTC,
            auto_confirm_bookings: true,
            reminder_lead_minutes: 60,
            subscription_status: SubscriptionStatus::Active,
        };
        customize(&mut business);
        store.put_business(business.clone()).await;

        let service = Service {
            id: Uuid::new_v4(),
            business_id: business.id,
            name: "Classic Cut".to_string(),
            duration_minutes: 30,
            price: 35.0,
            is_active: true,
        };
        store.put_service(service.clone()).await;

        let friday_noon = reference_monday() - Duration::days(3);
        let clock = Arc::new(FixedClock::new(local_instant(&business.timezone, friday_noon, hm(12, 0))));

        let provider_user = Uuid::new_v4();
        let provider =
            register_provider(&store, business.id, service.id, "Marco", Some(provider_user)).await;

        Self {
            store,
            clock,
            config: AppConfig::default(),
            business,
            service,
            provider,
            provider_user,
            customer: Uuid::new_v4(),
        }
    }

    /// Registers an active provider offering the fixture service, working Mon–Fri 09–17.
    pub async fn add_provider(&self, name: &str, user_id: Option<Uuid>) -> Provider {
        register_provider(&self.store, self.business.id, self.service.id, name, user_id).await
    }

    pub async fn add_override(&self, provider_id: Uuid, date: NaiveDate, hours: Option<(NaiveTime, NaiveTime)>) {
        let date_override = DateOverride {
            id: Uuid::new_v4(),
            provider_id,
            date,
            start_time: hours.map(|(start, _)| start),
            end_time: hours.map(|(_, end)| end),
            is_blocked: hours.is_none(),
            reason: None,
        };
        self.store.insert_date_override(date_override).await.unwrap();
    }

    /// Wall-clock `date hh:mm` in the business timezone, as an instant.
    pub fn at(&self, date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
        local_instant(&self.business.timezone, date, hm(hour, minute))
    }

    /// Seeds a booking directly into the store for the fixture provider and customer.
    pub async fn seed_booking(&self, start: DateTime<Utc>, status: BookingStatus) -> Booking {
        let booking = Booking {
            id: Uuid::new_v4(),
            business_id: self.business.id,
            provider_id: self.provider.id,
            customer_id: self.customer,
            service_id: self.service.id,
            start_time: start,
            end_time: start + self.service.duration(),
            status,
            confirmation_type: ConfirmationType::Auto,
            notes: None,
            cancellation_reason: None,
            cancelled_by: None,
            reminder_sent_at: None,
            reminder_failures: 0,
            created_at: self.clock_now(),
            updated_at: self.clock_now(),
        };
        self.store.put_booking(booking.clone()).await;
        booking
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::new(AppState::new(
            self.config.clone(),
            self.store.clone(),
            self.clock.clone(),
        ))
    }

    fn clock_now(&self) -> DateTime<Utc> {
        use crate::clock::Clock;
        self.clock.now()
    }
}

fn local_instant(tz: &Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap()
}

async fn register_provider(
    store: &InMemoryStore,
    business_id: Uuid,
    service_id: Uuid,
    name: &str,
    user_id: Option<Uuid>,
) -> Provider {
    let provider = Provider {
        id: Uuid::new_v4(),
        business_id,
        display_name: name.to_string(),
        user_id,
        is_active: true,
    };
    store.put_provider(provider.clone()).await;
    store.put_offering(provider.id, service_id).await;

    let weekdays = (1..=5)
        .map(|day| WeeklyScheduleBlock {
            provider_id: provider.id,
            day_of_week: day,
            start_time: hm(9, 0),
            end_time: hm(17, 0),
            is_available: true,
        })
        .collect();
    store.replace_weekly_schedule(provider.id, weekdays).await.unwrap();

    provider
}
