use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, RwLock};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use shared_config::AppConfig;
use shared_database::Store;
use shared_models::{Booking, Business};
use shared_utils::{AppState, Clock};

use crate::error::{DispatchError, ReminderError};
use crate::models::{ReminderMessage, SweepReport};
use crate::services::dispatcher::ReminderDispatcher;
use crate::services::templates::{render_reminder, ReminderContext};

/// Periodic sweep that sends one reminder per confirmed booking entering its lead window.
pub struct ReminderScheduler {
    store: Arc<dyn Store>,
    dispatcher: Arc<dyn ReminderDispatcher>,
    clock: Arc<dyn Clock>,
    config: Arc<AppConfig>,
    is_shutdown: RwLock<bool>,
    wake: Notify,
}

impl ReminderScheduler {
    pub fn new(state: &AppState, dispatcher: Arc<dyn ReminderDispatcher>) -> Self {
        Self {
            store: state.store.clone(),
            dispatcher,
            clock: state.clock.clone(),
            config: state.config.clone(),
            is_shutdown: RwLock::new(false),
            wake: Notify::new(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Runs sweeps on the configured interval until [`shutdown`](Self::shutdown) is called.
    pub async fn start(&self) {
        let period = self.config.reminder_interval().max(std::time::Duration::from_secs(1));
        info!("Starting reminder scheduler (every {:?})", period);

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.wake.notified() => {}
            }

            if *self.is_shutdown.read().await {
                break;
            }

            match self.run_sweep(self.clock.now()).await {
                Ok(report) if report == SweepReport::default() => {
                    debug!("Reminder sweep found nothing to send");
                }
                Ok(report) => info!(
                    "Reminder sweep: {} dispatched, {} failed, {} skipped",
                    report.dispatched, report.failed, report.skipped
                ),
                Err(e) => error!("Reminder sweep aborted: {}", e),
            }
        }

        info!("Reminder scheduler stopped");
    }

    pub async fn shutdown(&self) {
        info!("Initiating reminder scheduler shutdown");
        *self.is_shutdown.write().await = true;
        self.wake.notify_one();
    }

    /// One pass over every active business.
    ///
    /// Only failing to list businesses aborts the sweep; a failure for one business or one
    /// booking is logged and counted, and the sweep moves on.
    #[instrument(skip(self))]
    pub async fn run_sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, ReminderError> {
        let businesses = self.store.list_active_businesses().await?;
        let mut report = SweepReport::default();

        for business in businesses.iter().filter(|b| b.is_active()) {
            match self.sweep_business(business, now).await {
                Ok(business_report) => report.merge(business_report),
                Err(e) => error!("Reminder sweep failed for business {}: {}", business.id, e),
            }
        }

        Ok(report)
    }

    async fn sweep_business(
        &self,
        business: &Business,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, ReminderError> {
        let window_end = now + business.reminder_lead();
        let candidates = self
            .store
            .reminder_candidates(business.id, now, window_end, self.config.reminder_max_attempts)
            .await?;

        debug!(
            "{} reminder candidate(s) for business {} until {}",
            candidates.len(),
            business.id,
            window_end
        );

        let mut report = SweepReport::default();
        for booking in candidates {
            match self.remind(business, &booking, now).await {
                Ok(true) => report.dispatched += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!("Reminder failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Claims, renders and dispatches one reminder. `Ok(false)` when another sweep holds
    /// the claim.
    async fn remind(
        &self,
        business: &Business,
        booking: &Booking,
        now: DateTime<Utc>,
    ) -> Result<bool, ReminderError> {
        let claimed = self.store.claim_reminder(booking.id, now).await?;
        if !claimed {
            debug!("Booking {} already claimed", booking.id);
            return Ok(false);
        }

        let message = self.render(business, booking).await;

        match self.dispatch_with_timeout(&message).await {
            Ok(()) => {
                info!("Reminder sent for booking {}", booking.id);
                Ok(true)
            }
            Err(source) => {
                let attempts = self.store.release_reminder(booking.id, now).await?;
                Err(ReminderError::Dispatch {
                    booking_id: booking.id,
                    attempts,
                    source,
                })
            }
        }
    }

    async fn dispatch_with_timeout(&self, message: &ReminderMessage) -> Result<(), DispatchError> {
        let limit = self.config.reminder_dispatch_timeout();
        match timeout(limit, self.dispatcher.dispatch(message)).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout {
                timeout_seconds: limit.as_secs(),
            }),
        }
    }

    async fn render(&self, business: &Business, booking: &Booking) -> ReminderMessage {
        let service_name = match self.store.get_service(booking.service_id).await {
            Ok(Some(service)) => service.name,
            Ok(None) => {
                warn!("Service {} of booking {} is gone", booking.service_id, booking.id);
                "your appointment".to_string()
            }
            Err(e) => {
                warn!("Could not load service for booking {}: {}", booking.id, e);
                "your appointment".to_string()
            }
        };
        let provider_name = match self.store.get_provider(booking.provider_id).await {
            Ok(Some(provider)) => provider.display_name,
            Ok(None) => {
                warn!("Provider {} of booking {} is gone", booking.provider_id, booking.id);
                "your provider".to_string()
            }
            Err(e) => {
                warn!("Could not load provider for booking {}: {}", booking.id, e);
                "your provider".to_string()
            }
        };

        let body = render_reminder(&ReminderContext {
            business_name: &business.name,
            service_name: &service_name,
            provider_name: &provider_name,
            start_time: booking.start_time,
            timezone: business.timezone,
        });

        ReminderMessage {
            booking_id: booking.id,
            business_id: business.id,
            customer_id: booking.customer_id,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shared_database::BookingStore;
    use shared_models::{BookingStatus, SubscriptionStatus};
    use shared_utils::test_utils::{reference_monday, SchedulingFixture};

    use crate::services::dispatcher::{LoggingDispatcher, MockReminderDispatcher};

    fn scheduler(fixture: &SchedulingFixture, dispatcher: impl ReminderDispatcher + 'static) -> ReminderScheduler {
        ReminderScheduler::new(&fixture.state(), Arc::new(dispatcher))
    }

    /// Monday 10:00 booking with the clock at Monday 09:30 (inside the 60-minute lead).
    async fn due_booking(fixture: &SchedulingFixture) -> Booking {
        fixture.clock.set(fixture.at(reference_monday(), 9, 30));
        fixture
            .seed_booking(fixture.at(reference_monday(), 10, 0), BookingStatus::Confirmed)
            .await
    }

    #[tokio::test]
    async fn due_booking_is_reminded_once() {
        let fixture = SchedulingFixture::new().await;
        let booking = due_booking(&fixture).await;
        let booking_id = booking.id;

        let mut dispatcher = MockReminderDispatcher::new();
        dispatcher
            .expect_dispatch()
            .withf(move |message| message.booking_id == booking_id && message.body.contains("Classic Cut"))
            .times(1)
            .returning(|_| Ok(()));
        let scheduler = scheduler(&fixture, dispatcher);

        let now = fixture.at(reference_monday(), 9, 30);
        let first = scheduler.run_sweep(now).await.unwrap();
        let second = scheduler.run_sweep(now).await.unwrap();

        assert_eq!(first.dispatched, 1);
        assert_eq!(second, SweepReport::default());

        let stored = fixture.store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.reminder_sent_at, Some(now));
    }

    #[tokio::test]
    async fn missing_catalog_entries_fall_back_to_generic_names() {
        let fixture = SchedulingFixture::new().await;
        let mut booking = due_booking(&fixture).await;
        booking.id = uuid::Uuid::new_v4();
        booking.service_id = uuid::Uuid::new_v4();
        booking.provider_id = uuid::Uuid::new_v4();
        booking.start_time = fixture.at(reference_monday(), 10, 15);
        booking.end_time = fixture.at(reference_monday(), 10, 45);
        fixture.store.put_booking(booking.clone()).await;
        let orphan_id = booking.id;

        let mut dispatcher = MockReminderDispatcher::new();
        dispatcher
            .expect_dispatch()
            .withf(move |message| {
                message.booking_id == orphan_id
                    && message.body.contains("your appointment")
                    && message.body.contains("your provider")
            })
            .times(1)
            .returning(|_| Ok(()));
        dispatcher
            .expect_dispatch()
            .withf(move |message| message.booking_id != orphan_id)
            .times(1)
            .returning(|_| Ok(()));
        let scheduler = scheduler(&fixture, dispatcher);

        let report = scheduler
            .run_sweep(fixture.at(reference_monday(), 9, 30))
            .await
            .unwrap();
        assert_eq!(report.dispatched, 2);
    }

    #[tokio::test]
    async fn concurrent_sweeps_send_at_most_one_reminder() {
        let fixture = SchedulingFixture::new().await;
        due_booking(&fixture).await;

        let mut dispatcher = MockReminderDispatcher::new();
        dispatcher.expect_dispatch().times(1).returning(|_| Ok(()));
        let scheduler = scheduler(&fixture, dispatcher);

        let now = fixture.at(reference_monday(), 9, 30);
        let (a, b) = tokio::join!(scheduler.run_sweep(now), scheduler.run_sweep(now));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.dispatched + b.dispatched, 1);
    }

    #[tokio::test]
    async fn failed_dispatch_releases_claim_and_counts_failure() {
        let fixture = SchedulingFixture::new().await;
        let booking = due_booking(&fixture).await;

        let mut attempts = 0;
        let mut dispatcher = MockReminderDispatcher::new();
        dispatcher.expect_dispatch().times(2).returning(move |_| {
            attempts += 1;
            if attempts == 1 {
                Err(DispatchError::Transport("gateway down".to_string()))
            } else {
                Ok(())
            }
        });
        let scheduler = scheduler(&fixture, dispatcher);

        let now = fixture.at(reference_monday(), 9, 30);
        let report = scheduler.run_sweep(now).await.unwrap();
        assert_eq!(report.failed, 1);

        let stored = fixture.store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.reminder_sent_at, None);
        assert_eq!(stored.reminder_failures, 1);

        // The next sweep retries.
        let retry = scheduler.run_sweep(now + Duration::minutes(5)).await.unwrap();
        assert_eq!(retry.dispatched, 1);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_others() {
        let fixture = SchedulingFixture::new().await;
        let failing = due_booking(&fixture).await;
        let second = fixture
            .seed_booking(fixture.at(reference_monday(), 10, 15), BookingStatus::Confirmed)
            .await;

        let mut dispatcher = MockReminderDispatcher::new();
        dispatcher
            .expect_dispatch()
            .withf(move |message| message.booking_id == failing.id)
            .returning(|_| Err(DispatchError::Rejected("opted out".to_string())));
        dispatcher
            .expect_dispatch()
            .withf(move |message| message.booking_id == second.id)
            .returning(|_| Ok(()));
        let scheduler = scheduler(&fixture, dispatcher);

        let report = scheduler
            .run_sweep(fixture.at(reference_monday(), 9, 30))
            .await
            .unwrap();
        assert_eq!(report.dispatched, 1);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn exhausted_bookings_are_no_longer_candidates() {
        let fixture = SchedulingFixture::new().await;
        let booking = due_booking(&fixture).await;

        let mut dispatcher = MockReminderDispatcher::new();
        dispatcher
            .expect_dispatch()
            .times(fixture.config.reminder_max_attempts as usize)
            .returning(|_| Err(DispatchError::Transport("down".to_string())));
        let scheduler = scheduler(&fixture, dispatcher);

        let now = fixture.at(reference_monday(), 9, 30);
        for minute in 0..5 {
            scheduler
                .run_sweep(now + Duration::minutes(minute))
                .await
                .unwrap();
        }

        let stored = fixture.store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.reminder_failures, fixture.config.reminder_max_attempts);
    }

    #[tokio::test]
    async fn window_excludes_bookings_beyond_the_lead() {
        let fixture = SchedulingFixture::new().await;
        fixture.clock.set(fixture.at(reference_monday(), 9, 30));
        fixture
            .seed_booking(fixture.at(reference_monday(), 10, 31), BookingStatus::Confirmed)
            .await;
        fixture
            .seed_booking(fixture.at(reference_monday(), 9, 0), BookingStatus::Confirmed)
            .await;
        fixture
            .seed_booking(fixture.at(reference_monday(), 10, 0), BookingStatus::Pending)
            .await;

        let mut dispatcher = MockReminderDispatcher::new();
        dispatcher.expect_dispatch().never();
        let scheduler = scheduler(&fixture, dispatcher);

        let report = scheduler
            .run_sweep(fixture.at(reference_monday(), 9, 30))
            .await
            .unwrap();
        assert_eq!(report, SweepReport::default());
    }

    #[tokio::test]
    async fn suspended_business_is_skipped() {
        let fixture =
            SchedulingFixture::with_business(|b| b.subscription_status = SubscriptionStatus::Suspended)
                .await;
        due_booking(&fixture).await;

        let mut dispatcher = MockReminderDispatcher::new();
        dispatcher.expect_dispatch().never();
        let scheduler = scheduler(&fixture, dispatcher);

        let report = scheduler
            .run_sweep(fixture.at(reference_monday(), 9, 30))
            .await
            .unwrap();
        assert_eq!(report, SweepReport::default());
    }

    struct StalledDispatcher;

    #[async_trait::async_trait]
    impl ReminderDispatcher for StalledDispatcher {
        async fn dispatch(&self, _message: &ReminderMessage) -> Result<(), DispatchError> {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn stalled_dispatch_times_out_and_is_released() {
        let mut fixture = SchedulingFixture::new().await;
        fixture.config.reminder_dispatch_timeout_secs = 1;
        let booking = due_booking(&fixture).await;
        let scheduler = scheduler(&fixture, StalledDispatcher);

        let report = scheduler
            .run_sweep(fixture.at(reference_monday(), 9, 30))
            .await
            .unwrap();
        assert_eq!(report.failed, 1);

        let stored = fixture.store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.reminder_sent_at, None);
        assert_eq!(stored.reminder_failures, 1);
    }

    #[tokio::test]
    async fn start_returns_after_shutdown() {
        let fixture = SchedulingFixture::new().await;
        let scheduler = Arc::new(scheduler(&fixture, LoggingDispatcher));

        let running = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.start().await }
        });

        scheduler.shutdown().await;
        tokio::time::timeout(std::time::Duration::from_secs(5), running)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }
}
