use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use availability_cell::first_conflict;
use shared_database::{BookingChange, Store};
use shared_models::{
    Booking, BookingStatus, Business, CancelledBy, ConfirmationType, Provider, Service,
    TimeInterval,
};
use shared_utils::{AppState, Clock};

use crate::models::{BookingAction, BookingError, BookingListFilter, CreateBookingRequest};
use crate::services::lifecycle::BookingLifecycleService;

/// Gatekeeper for every booking state change.
pub struct BookingService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    lifecycle_service: BookingLifecycleService,
}

impl BookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock.clone(),
            lifecycle_service: BookingLifecycleService::new(),
        }
    }

    /// Create a booking for `customer_id`.
    ///
    /// Checks run in a fixed order and the first failure is returned; nothing is written
    /// unless every check passes.
    #[instrument(skip(self, request), fields(provider_id = %request.provider_id, start = %request.start_time))]
    pub async fn create_booking(
        &self,
        business_id: Uuid,
        customer_id: Uuid,
        request: CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        let now = self.clock.now();

        // Step 1: temporal rule
        if request.start_time <= now {
            warn!("Rejected booking starting at {} (now {})", request.start_time, now);
            return Err(BookingError::InThePast);
        }

        // Step 2: tenant and service
        let business = self
            .store
            .get_business(business_id)
            .await?
            .ok_or(BookingError::BusinessNotFound)?;
        let service = self.bookable_service(&business, request.service_id).await?;

        // Step 3: provider
        let provider = self.bookable_provider(&business, &service, request.provider_id).await?;

        // Step 4: conflicts
        let end_time = request
            .start_time
            .checked_add_signed(service.duration())
            .ok_or_else(|| {
                BookingError::Validation(format!(
                    "start_time {} is out of range",
                    request.start_time
                ))
            })?;
        let interval = TimeInterval::new(request.start_time, end_time);
        let committed = self.store.committed_bookings(provider.id, interval).await?;
        if let Some(existing) = first_conflict(&interval, &committed) {
            warn!(
                "Requested {}..{} overlaps booking {} of provider {}",
                interval.start, interval.end, existing.id, provider.id
            );
            return Err(BookingError::SlotConflict);
        }

        // Step 5: persist
        let (status, confirmation_type) = if business.auto_confirm_bookings {
            (BookingStatus::Confirmed, ConfirmationType::Auto)
        } else {
            (BookingStatus::Pending, ConfirmationType::Manual)
        };

        let booking = Booking {
            id: Uuid::new_v4(),
            business_id: business.id,
            provider_id: provider.id,
            customer_id,
            service_id: service.id,
            start_time: interval.start,
            end_time: interval.end,
            status,
            confirmation_type,
            notes: request.notes,
            cancellation_reason: None,
            cancelled_by: None,
            reminder_sent_at: None,
            reminder_failures: 0,
            created_at: now,
            updated_at: now,
        };

        let booking = self.store.insert_booking_if_free(booking).await.map_err(|e| {
            warn!("Insert rejected for provider {}: {}", provider.id, e);
            BookingError::from(e)
        })?;

        info!(
            "Booking {} created as {} for provider {}",
            booking.id, booking.status, provider.id
        );
        Ok(booking)
    }

    /// Apply a user action to a booking.
    pub async fn transition_booking(
        &self,
        booking_id: Uuid,
        acting_user: Uuid,
        action: BookingAction,
        reason: Option<String>,
    ) -> Result<Booking, BookingError> {
        match action {
            BookingAction::Confirm => self.confirm_booking(booking_id, acting_user).await,
            BookingAction::Cancel => self.cancel_booking(booking_id, acting_user, reason).await,
        }
    }

    /// Pending -> Confirmed; the confirmation becomes manual.
    #[instrument(skip(self))]
    pub async fn confirm_booking(
        &self,
        booking_id: Uuid,
        acting_user: Uuid,
    ) -> Result<Booking, BookingError> {
        let booking = self.get_booking(booking_id, acting_user).await?;
        let target = self.lifecycle_service.target_status(BookingAction::Confirm);
        self.lifecycle_service
            .validate_status_transition(booking.status, target)?;

        let change = BookingChange {
            status: target,
            confirmation_type: Some(ConfirmationType::Manual),
            cancellation_reason: None,
            cancelled_by: None,
            at: self.clock.now(),
        };

        let confirmed = self.commit_transition(&booking, change).await?;
        info!("Booking {} confirmed", booking_id);
        Ok(confirmed)
    }

    /// Pending/Confirmed -> Cancelled, recording who cancelled and why.
    #[instrument(skip(self, reason))]
    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        acting_user: Uuid,
        reason: Option<String>,
    ) -> Result<Booking, BookingError> {
        let booking = self.get_booking(booking_id, acting_user).await?;
        let target = self.lifecycle_service.target_status(BookingAction::Cancel);
        self.lifecycle_service
            .validate_status_transition(booking.status, target)?;

        let cancelled_by = if booking.customer_id == acting_user {
            CancelledBy::Customer
        } else {
            CancelledBy::Provider
        };

        let change = BookingChange {
            status: target,
            confirmation_type: None,
            cancellation_reason: reason,
            cancelled_by: Some(cancelled_by),
            at: self.clock.now(),
        };

        let cancelled = self.commit_transition(&booking, change).await?;
        info!("Booking {} cancelled by {:?}", booking_id, cancelled_by);
        Ok(cancelled)
    }

    /// A booking visible to `acting_user`: its customer or its provider's linked user.
    #[instrument(skip(self))]
    pub async fn get_booking(
        &self,
        booking_id: Uuid,
        acting_user: Uuid,
    ) -> Result<Booking, BookingError> {
        debug!("Fetching booking: {}", booking_id);

        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .ok_or(BookingError::NotFound)?;

        self.authorize(&booking, acting_user).await?;
        Ok(booking)
    }

    /// The customer's own bookings, ascending by start time.
    #[instrument(skip(self, filter))]
    pub async fn list_customer_bookings(
        &self,
        customer_id: Uuid,
        filter: BookingListFilter,
    ) -> Result<Vec<Booking>, BookingError> {
        let now = self.clock.now();
        let bookings: Vec<Booking> = self
            .store
            .customer_bookings(customer_id)
            .await?
            .into_iter()
            .filter(|b| filter.status.map_or(true, |status| b.status == status))
            .filter(|b| !filter.upcoming || (b.is_committed() && b.start_time > now))
            .collect();

        debug!("Found {} booking(s) for customer {}", bookings.len(), customer_id);
        Ok(bookings)
    }

    async fn authorize(&self, booking: &Booking, acting_user: Uuid) -> Result<(), BookingError> {
        if booking.customer_id == acting_user {
            return Ok(());
        }

        let provider = self.store.get_provider(booking.provider_id).await?;
        if provider.is_some_and(|p| p.is_managed_by(acting_user)) {
            return Ok(());
        }

        warn!("User {} denied access to booking {}", acting_user, booking.id);
        Err(BookingError::Unauthorized)
    }

    async fn commit_transition(
        &self,
        booking: &Booking,
        change: BookingChange,
    ) -> Result<Booking, BookingError> {
        self.store
            .transition_booking(booking.id, booking.status, change)
            .await
            .map_err(|e| {
                warn!("Transition of booking {} lost a race: {}", booking.id, e);
                BookingError::from(e)
            })
    }

    async fn bookable_service(
        &self,
        business: &Business,
        service_id: Uuid,
    ) -> Result<Service, BookingError> {
        let service = self
            .store
            .get_service(service_id)
            .await?
            .ok_or(BookingError::ServiceNotFound)?;

        if !service.is_active || service.business_id != business.id {
            return Err(BookingError::ServiceInactive);
        }
        Ok(service)
    }

    async fn bookable_provider(
        &self,
        business: &Business,
        service: &Service,
        provider_id: Uuid,
    ) -> Result<Provider, BookingError> {
        let provider = match self.store.get_provider(provider_id).await? {
            Some(provider) if provider.is_active && provider.business_id == business.id => provider,
            _ => return Err(BookingError::ProviderNotFound),
        };

        if !self.store.provider_offers(provider.id, service.id).await? {
            return Err(BookingError::ProviderServiceMismatch);
        }
        Ok(provider)
    }
}
