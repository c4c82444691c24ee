use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::{
    Booking, BookingStatus, Business, DateOverride, Provider, ProviderOffering, Service,
    TimeInterval, WeeklyScheduleBlock,
};

use crate::error::{StoreError, StoreResult};
use crate::store::{BookingChange, BookingStore, CatalogStore, ScheduleStore};

#[derive(Default)]
struct State {
    businesses: HashMap<Uuid, Business>,
    services: HashMap<Uuid, Service>,
    providers: Vec<Provider>,
    offerings: HashSet<ProviderOffering>,
    schedules: HashMap<Uuid, Vec<WeeklyScheduleBlock>>,
    overrides: Vec<DateOverride>,
    bookings: HashMap<Uuid, Booking>,
}

/// Process-local store. A single lock guards all state, so every write is serialized and the
/// check-then-insert paths are atomic.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_business(&self, business: Business) {
        self.state.write().await.businesses.insert(business.id, business);
    }

    pub async fn put_service(&self, service: Service) {
        self.state.write().await.services.insert(service.id, service);
    }

    pub async fn put_provider(&self, provider: Provider) {
        let mut state = self.state.write().await;
        state.providers.retain(|p| p.id != provider.id);
        state.providers.push(provider);
    }

    pub async fn put_offering(&self, provider_id: Uuid, service_id: Uuid) {
        self.state.write().await.offerings.insert(ProviderOffering {
            provider_id,
            service_id,
        });
    }

    /// Seeds a booking as-is, bypassing the overlap check. Intended for fixtures and imports.
    pub async fn put_booking(&self, booking: Booking) {
        self.state.write().await.bookings.insert(booking.id, booking);
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_business(&self, business_id: Uuid) -> StoreResult<Option<Business>> {
        Ok(self.state.read().await.businesses.get(&business_id).cloned())
    }

    async fn list_active_businesses(&self) -> StoreResult<Vec<Business>> {
        let state = self.state.read().await;
        let mut businesses: Vec<Business> = state
            .businesses
            .values()
            .filter(|b| b.is_active())
            .cloned()
            .collect();
        businesses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(businesses)
    }

    async fn get_service(&self, service_id: Uuid) -> StoreResult<Option<Service>> {
        Ok(self.state.read().await.services.get(&service_id).cloned())
    }

    async fn get_provider(&self, provider_id: Uuid) -> StoreResult<Option<Provider>> {
        let state = self.state.read().await;
        Ok(state.providers.iter().find(|p| p.id == provider_id).cloned())
    }

    async fn provider_offers(&self, provider_id: Uuid, service_id: Uuid) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state.offerings.contains(&ProviderOffering {
            provider_id,
            service_id,
        }))
    }

    async fn providers_offering(
        &self,
        business_id: Uuid,
        service_id: Uuid,
    ) -> StoreResult<Vec<Provider>> {
        let state = self.state.read().await;
        Ok(state
            .providers
            .iter()
            .filter(|p| p.business_id == business_id && p.is_active)
            .filter(|p| {
                state.offerings.contains(&ProviderOffering {
                    provider_id: p.id,
                    service_id,
                })
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ScheduleStore for InMemoryStore {
    async fn weekly_schedule(&self, provider_id: Uuid) -> StoreResult<Vec<WeeklyScheduleBlock>> {
        let state = self.state.read().await;
        Ok(state.schedules.get(&provider_id).cloned().unwrap_or_default())
    }

    async fn replace_weekly_schedule(
        &self,
        provider_id: Uuid,
        mut blocks: Vec<WeeklyScheduleBlock>,
    ) -> StoreResult<Vec<WeeklyScheduleBlock>> {
        blocks.sort_by_key(|b| (b.day_of_week, b.start_time));
        let mut state = self.state.write().await;
        state.schedules.insert(provider_id, blocks.clone());
        debug!("Replaced weekly schedule for provider {} ({} blocks)", provider_id, blocks.len());
        Ok(blocks)
    }

    async fn date_overrides(
        &self,
        provider_id: Uuid,
        from: NaiveDate,
        until: NaiveDate,
    ) -> StoreResult<Vec<DateOverride>> {
        let state = self.state.read().await;
        let mut overrides: Vec<DateOverride> = state
            .overrides
            .iter()
            .filter(|o| o.provider_id == provider_id && o.date >= from && o.date < until)
            .cloned()
            .collect();
        overrides.sort_by_key(|o| o.date);
        Ok(overrides)
    }

    async fn insert_date_override(&self, date_override: DateOverride) -> StoreResult<DateOverride> {
        let mut state = self.state.write().await;
        let duplicate = state
            .overrides
            .iter()
            .any(|o| o.provider_id == date_override.provider_id && o.date == date_override.date);
        if duplicate {
            return Err(StoreError::DuplicateOverride {
                provider_id: date_override.provider_id,
                date: date_override.date,
            });
        }
        state.overrides.push(date_override.clone());
        Ok(date_override)
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn get_booking(&self, booking_id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(&booking_id).cloned())
    }

    async fn committed_bookings(
        &self,
        provider_id: Uuid,
        range: TimeInterval,
    ) -> StoreResult<Vec<Booking>> {
        let state = self.state.read().await;
        Ok(state
            .bookings
            .values()
            .filter(|b| b.provider_id == provider_id && b.is_committed())
            .filter(|b| b.interval().overlaps(&range))
            .cloned()
            .collect())
    }

    async fn insert_booking_if_free(&self, booking: Booking) -> StoreResult<Booking> {
        let mut state = self.state.write().await;

        let interval = booking.interval();
        let taken = state.bookings.values().any(|existing| {
            existing.provider_id == booking.provider_id
                && existing.is_committed()
                && existing.interval().overlaps(&interval)
        });
        if taken {
            return Err(StoreError::SlotTaken(booking.provider_id));
        }

        state.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn transition_booking(
        &self,
        booking_id: Uuid,
        expected: BookingStatus,
        change: BookingChange,
    ) -> StoreResult<Booking> {
        let mut state = self.state.write().await;
        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| StoreError::NotFound(format!("booking {}", booking_id)))?;

        if booking.status != expected {
            return Err(StoreError::StaleStatus {
                id: booking_id,
                expected,
                actual: booking.status,
            });
        }

        booking.status = change.status;
        if let Some(confirmation_type) = change.confirmation_type {
            booking.confirmation_type = confirmation_type;
        }
        if change.cancellation_reason.is_some() {
            booking.cancellation_reason = change.cancellation_reason;
        }
        if change.cancelled_by.is_some() {
            booking.cancelled_by = change.cancelled_by;
        }
        booking.updated_at = change.at;

        Ok(booking.clone())
    }

    async fn customer_bookings(&self, customer_id: Uuid) -> StoreResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.customer_id == customer_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.start_time);
        Ok(bookings)
    }

    async fn reminder_candidates(
        &self,
        business_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        max_failures: u32,
    ) -> StoreResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.business_id == business_id)
            .filter(|b| b.status == BookingStatus::Confirmed)
            .filter(|b| b.reminder_sent_at.is_none() && b.reminder_failures < max_failures)
            .filter(|b| b.start_time >= from && b.start_time <= to)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.start_time);
        Ok(bookings)
    }

    async fn claim_reminder(&self, booking_id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| StoreError::NotFound(format!("booking {}", booking_id)))?;

        if booking.status != BookingStatus::Confirmed || booking.reminder_sent_at.is_some() {
            return Ok(false);
        }

        booking.reminder_sent_at = Some(at);
        Ok(true)
    }

    async fn release_reminder(
        &self,
        booking_id: Uuid,
        claimed_at: DateTime<Utc>,
    ) -> StoreResult<u32> {
        let mut state = self.state.write().await;
        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| StoreError::NotFound(format!("booking {}", booking_id)))?;

        if booking.reminder_sent_at == Some(claimed_at) {
            booking.reminder_sent_at = None;
            booking.reminder_failures += 1;
        }

        Ok(booking.reminder_failures)
    }
}
