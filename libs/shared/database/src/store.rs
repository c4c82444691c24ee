//! Persistence contract consulted by the scheduling cells.
//!
//! Implementations must make [`BookingStore::insert_booking_if_free`] atomic with respect to
//! other inserts for the same provider, and [`BookingStore::claim_reminder`] a conditional
//! update. Everything else is plain reads and writes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use shared_models::{
    Booking, BookingStatus, Business, CancelledBy, ConfirmationType, DateOverride, Provider,
    Service, TimeInterval, WeeklyScheduleBlock,
};

use crate::error::StoreResult;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_business(&self, business_id: Uuid) -> StoreResult<Option<Business>>;

    async fn list_active_businesses(&self) -> StoreResult<Vec<Business>>;

    async fn get_service(&self, service_id: Uuid) -> StoreResult<Option<Service>>;

    async fn get_provider(&self, provider_id: Uuid) -> StoreResult<Option<Provider>>;

    async fn provider_offers(&self, provider_id: Uuid, service_id: Uuid) -> StoreResult<bool>;

    /// Active providers of `business_id` offering `service_id`, in registration order.
    async fn providers_offering(
        &self,
        business_id: Uuid,
        service_id: Uuid,
    ) -> StoreResult<Vec<Provider>>;
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn weekly_schedule(&self, provider_id: Uuid) -> StoreResult<Vec<WeeklyScheduleBlock>>;

    /// Replaces the provider's whole weekly schedule in one step.
    async fn replace_weekly_schedule(
        &self,
        provider_id: Uuid,
        blocks: Vec<WeeklyScheduleBlock>,
    ) -> StoreResult<Vec<WeeklyScheduleBlock>>;

    /// Overrides with `from <= date < until`.
    async fn date_overrides(
        &self,
        provider_id: Uuid,
        from: NaiveDate,
        until: NaiveDate,
    ) -> StoreResult<Vec<DateOverride>>;

    /// Fails with `DuplicateOverride` if the provider already has an override on that date.
    async fn insert_date_override(&self, date_override: DateOverride) -> StoreResult<DateOverride>;
}

/// Field changes applied by a status transition.
#[derive(Debug, Clone)]
pub struct BookingChange {
    pub status: BookingStatus,
    pub confirmation_type: Option<ConfirmationType>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<CancelledBy>,
    pub at: DateTime<Utc>,
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get_booking(&self, booking_id: Uuid) -> StoreResult<Option<Booking>>;

    /// Pending/Confirmed bookings of the provider overlapping `range`, in no particular order.
    async fn committed_bookings(
        &self,
        provider_id: Uuid,
        range: TimeInterval,
    ) -> StoreResult<Vec<Booking>>;

    /// Inserts the booking unless it overlaps a committed booking of the same provider.
    /// The overlap check and the insert happen as one step; fails with `SlotTaken`.
    async fn insert_booking_if_free(&self, booking: Booking) -> StoreResult<Booking>;

    /// Applies `change` only if the booking is still in `expected` status; fails with
    /// `StaleStatus` otherwise.
    async fn transition_booking(
        &self,
        booking_id: Uuid,
        expected: BookingStatus,
        change: BookingChange,
    ) -> StoreResult<Booking>;

    /// All bookings of a customer ordered by start time.
    async fn customer_bookings(&self, customer_id: Uuid) -> StoreResult<Vec<Booking>>;

    /// Confirmed bookings of the business starting within `[from, to]` that have no reminder
    /// recorded and fewer than `max_failures` failed attempts.
    async fn reminder_candidates(
        &self,
        business_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        max_failures: u32,
    ) -> StoreResult<Vec<Booking>>;

    /// Marks the reminder as sent at `at` only if the booking is Confirmed and unmarked.
    /// Returns whether this caller won the claim.
    async fn claim_reminder(&self, booking_id: Uuid, at: DateTime<Utc>) -> StoreResult<bool>;

    /// Undoes a claim taken at `claimed_at` after a failed dispatch and counts the failure.
    /// Returns the booking's failure count.
    async fn release_reminder(
        &self,
        booking_id: Uuid,
        claimed_at: DateTime<Utc>,
    ) -> StoreResult<u32>;
}

/// Everything the scheduling core needs from persistence.
pub trait Store: CatalogStore + ScheduleStore + BookingStore {}

impl<T> Store for T where T: CatalogStore + ScheduleStore + BookingStore {}
