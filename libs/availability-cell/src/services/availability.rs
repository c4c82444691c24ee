use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Days, Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use futures::future::try_join_all;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::Store;
use shared_models::clock_time;
use shared_models::{
    Booking, Business, DateOverride, Provider, Service, TimeInterval, WeeklyScheduleBlock,
};
use shared_utils::{AppState, Clock};

use crate::models::{
    AvailabilityError, AvailabilityQuery, AvailableSlot, CreateOverrideRequest, ProviderSchedule,
    ScheduleBlockInput, SlotsByDate,
};
use crate::services::conflict::filter_conflicts;
use crate::services::schedule::resolve_windows;
use crate::services::slots::{generate_slots, localize};

/// Answers "when can this service be booked" and maintains provider working hours.
pub struct AvailabilityService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    config: Arc<AppConfig>,
}

/// Everything fetched for one provider over the query range.
struct ProviderCalendar {
    provider: Provider,
    weekly: Vec<WeeklyScheduleBlock>,
    overrides: Vec<DateOverride>,
    bookings: Vec<Booking>,
}

impl AvailabilityService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock.clone(),
            config: state.config.clone(),
        }
    }

    /// Open slots per date for a service, across one or all eligible providers.
    #[instrument(skip(self, query), fields(business_id = %query.business_id, service_id = %query.service_id))]
    pub async fn resolve_availability(
        &self,
        query: AvailabilityQuery,
    ) -> Result<(Business, SlotsByDate), AvailabilityError> {
        let days = query.days.unwrap_or(self.config.default_availability_days);
        if days < 1 || days > self.config.max_availability_days {
            return Err(AvailabilityError::Validation(format!(
                "days must be between 1 and {}",
                self.config.max_availability_days
            )));
        }
        if let Some(from) = query.from_date {
            end_date(from, days)?;
        }

        let business = self
            .store
            .get_business(query.business_id)
            .await?
            .ok_or(AvailabilityError::BusinessNotFound)?;

        let service = self.bookable_service(&business, query.service_id).await?;
        let providers = self
            .eligible_providers(&business, &service, query.provider_id)
            .await?;

        let tz = business.timezone;
        let now = self.clock.now();
        let from = query
            .from_date
            .unwrap_or_else(|| now.with_timezone(&tz).date_naive());
        let until = end_date(from, days)?;
        let range = day_range(&tz, from, until).ok_or_else(|| {
            AvailabilityError::Validation(format!("date {} is out of range", from))
        })?;
        debug!(
            "Resolving {} day(s) from {} for {} provider(s)",
            days,
            from,
            providers.len()
        );

        let calendars = try_join_all(
            providers
                .into_iter()
                .map(|provider| self.load_calendar(provider, from, until, range)),
        )
        .await?;

        let dates: Vec<NaiveDate> = from.iter_days().take(days as usize).collect();
        let mut slots_by_date: SlotsByDate = BTreeMap::new();

        for date in dates {
            let mut day_slots = Vec::new();

            for calendar in &calendars {
                let resolved = resolve_windows(&calendar.weekly, &calendar.overrides, date);
                debug!(
                    provider_id = %calendar.provider.id,
                    %date,
                    source = ?resolved.source,
                    "Resolved {} window(s)",
                    resolved.windows.len()
                );

                let candidates: Vec<TimeInterval> = resolved
                    .windows
                    .iter()
                    .flat_map(|(start, end)| generate_slots(date, *start, *end, service.duration(), &tz))
                    .collect();

                day_slots.extend(
                    filter_conflicts(candidates, &calendar.bookings)
                        .into_iter()
                        .filter(|slot| slot.start > now)
                        .map(|slot| AvailableSlot {
                            provider_id: calendar.provider.id,
                            provider_name: calendar.provider.display_name.clone(),
                            start_time: slot.start,
                            end_time: slot.end,
                        }),
                );
            }

            // Stable sort: ties keep provider order.
            day_slots.sort_by_key(|slot| slot.start_time);
            slots_by_date.insert(date, day_slots);
        }

        let total: usize = slots_by_date.values().map(Vec::len).sum();
        debug!("Found {} available slot(s)", total);

        Ok((business, slots_by_date))
    }

    /// Weekly blocks plus overrides from today (business time) onwards.
    #[instrument(skip(self))]
    pub async fn get_schedule(&self, provider_id: Uuid) -> Result<ProviderSchedule, AvailabilityError> {
        let provider = self
            .store
            .get_provider(provider_id)
            .await?
            .ok_or(AvailabilityError::ProviderNotFound)?;

        let tz = self
            .store
            .get_business(provider.business_id)
            .await?
            .map(|business| business.timezone)
            .unwrap_or(Tz::UTC);
        let today = self.clock.now().with_timezone(&tz).date_naive();

        let weekly = self.store.weekly_schedule(provider_id).await?;
        let overrides = self
            .store
            .date_overrides(provider_id, today, NaiveDate::MAX)
            .await?;

        Ok(ProviderSchedule {
            provider_id,
            weekly,
            overrides,
        })
    }

    /// Replaces the provider's whole weekly schedule.
    #[instrument(skip(self, blocks), fields(blocks = blocks.len()))]
    pub async fn replace_schedule(
        &self,
        provider_id: Uuid,
        acting_user: Uuid,
        blocks: Vec<ScheduleBlockInput>,
    ) -> Result<Vec<WeeklyScheduleBlock>, AvailabilityError> {
        let parsed = blocks
            .into_iter()
            .map(|input| parse_block(provider_id, input))
            .collect::<Result<Vec<_>, _>>()?;

        self.managed_provider(provider_id, acting_user).await?;

        let saved = self
            .store
            .replace_weekly_schedule(provider_id, parsed)
            .await?;

        info!("Weekly schedule replaced for provider {} ({} blocks)", provider_id, saved.len());
        Ok(saved)
    }

    /// Records a date-specific exception to the provider's weekly hours.
    #[instrument(skip(self, request), fields(date = %request.date))]
    pub async fn create_override(
        &self,
        provider_id: Uuid,
        acting_user: Uuid,
        request: CreateOverrideRequest,
    ) -> Result<DateOverride, AvailabilityError> {
        let start_time = parse_optional_time("start_time", request.start_time.as_deref())?;
        let end_time = parse_optional_time("end_time", request.end_time.as_deref())?;

        if !request.is_blocked {
            match (start_time, end_time) {
                (Some(start), Some(end)) if start < end => {}
                (Some(_), Some(_)) => {
                    return Err(AvailabilityError::Validation(
                        "start_time must be before end_time".to_string(),
                    ))
                }
                _ => {
                    return Err(AvailabilityError::Validation(
                        "an open override needs both start_time and end_time".to_string(),
                    ))
                }
            }
        }

        self.managed_provider(provider_id, acting_user).await?;

        let date_override = DateOverride {
            id: Uuid::new_v4(),
            provider_id,
            date: request.date,
            start_time,
            end_time,
            is_blocked: request.is_blocked,
            reason: request.reason,
        };

        let saved = self.store.insert_date_override(date_override).await?;
        info!(
            "Override created for provider {} on {} (blocked: {})",
            provider_id, saved.date, saved.is_blocked
        );
        Ok(saved)
    }

    async fn bookable_service(
        &self,
        business: &Business,
        service_id: Uuid,
    ) -> Result<Service, AvailabilityError> {
        match self.store.get_service(service_id).await? {
            Some(service) if service.is_active && service.business_id == business.id => Ok(service),
            Some(_) => {
                debug!("Service {} is inactive or belongs to another business", service_id);
                Err(AvailabilityError::ServiceNotFound)
            }
            None => Err(AvailabilityError::ServiceNotFound),
        }
    }

    async fn eligible_providers(
        &self,
        business: &Business,
        service: &Service,
        provider_id: Option<Uuid>,
    ) -> Result<Vec<Provider>, AvailabilityError> {
        let providers = match provider_id {
            Some(provider_id) => {
                let provider = self.store.get_provider(provider_id).await?;
                match provider {
                    Some(provider)
                        if provider.is_active
                            && provider.business_id == business.id
                            && self.store.provider_offers(provider.id, service.id).await? =>
                    {
                        vec![provider]
                    }
                    _ => Vec::new(),
                }
            }
            None => self.store.providers_offering(business.id, service.id).await?,
        };

        if providers.is_empty() {
            warn!("No eligible provider for service {}", service.id);
            return Err(AvailabilityError::NoEligibleProvider);
        }
        Ok(providers)
    }

    async fn load_calendar(
        &self,
        provider: Provider,
        from: NaiveDate,
        until: NaiveDate,
        range: TimeInterval,
    ) -> Result<ProviderCalendar, AvailabilityError> {
        let (weekly, overrides, bookings) = futures::try_join!(
            self.store.weekly_schedule(provider.id),
            self.store.date_overrides(provider.id, from, until),
            self.store.committed_bookings(provider.id, range),
        )?;

        Ok(ProviderCalendar {
            provider,
            weekly,
            overrides,
            bookings,
        })
    }

    async fn managed_provider(
        &self,
        provider_id: Uuid,
        acting_user: Uuid,
    ) -> Result<Provider, AvailabilityError> {
        let provider = self
            .store
            .get_provider(provider_id)
            .await?
            .ok_or(AvailabilityError::ProviderNotFound)?;

        if !provider.is_managed_by(acting_user) {
            warn!("User {} may not edit provider {}", acting_user, provider_id);
            return Err(AvailabilityError::Forbidden);
        }
        Ok(provider)
    }
}

/// Exclusive last date of a `days`-long query starting at `from`.
fn end_date(from: NaiveDate, days: u32) -> Result<NaiveDate, AvailabilityError> {
    from.checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| AvailabilityError::Validation(format!("date {} is out of range", from)))
}

/// Instants spanning `[from, until)` in business time, padded by a day on each side so
/// windows shifted by DST are still covered. `None` at the edge of the calendar.
fn day_range(tz: &Tz, from: NaiveDate, until: NaiveDate) -> Option<TimeInterval> {
    let midnight = NaiveTime::MIN;
    let start = localize(tz, from, midnight).unwrap_or_else(|| from.and_time(midnight).and_utc());
    let end = localize(tz, until, midnight).unwrap_or_else(|| until.and_time(midnight).and_utc());

    Some(TimeInterval::new(
        start.checked_sub_signed(Duration::days(1))?,
        end.checked_add_signed(Duration::days(1))?,
    ))
}

fn parse_block(
    provider_id: Uuid,
    input: ScheduleBlockInput,
) -> Result<WeeklyScheduleBlock, AvailabilityError> {
    if input.day_of_week > 6 {
        return Err(AvailabilityError::Validation(format!(
            "day_of_week must be 0-6, got {}",
            input.day_of_week
        )));
    }

    let start_time = parse_time("start_time", &input.start_time)?;
    let end_time = parse_time("end_time", &input.end_time)?;
    if start_time >= end_time {
        return Err(AvailabilityError::Validation(format!(
            "start_time {} must be before end_time {}",
            input.start_time, input.end_time
        )));
    }

    Ok(WeeklyScheduleBlock {
        provider_id,
        day_of_week: input.day_of_week,
        start_time,
        end_time,
        is_available: input.is_available,
    })
}

fn parse_time(field: &str, raw: &str) -> Result<NaiveTime, AvailabilityError> {
    clock_time::parse(raw).map_err(|e| AvailabilityError::Validation(format!("{}: {}", field, e)))
}

fn parse_optional_time(field: &str, raw: Option<&str>) -> Result<Option<NaiveTime>, AvailabilityError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_time(field, raw).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_models::BookingStatus;
    use shared_utils::test_utils::{hm, reference_monday, SchedulingFixture};

    fn query(fixture: &SchedulingFixture, days: u32) -> AvailabilityQuery {
        AvailabilityQuery {
            business_id: fixture.business.id,
            service_id: fixture.service.id,
            provider_id: None,
            from_date: Some(reference_monday()),
            days: Some(days),
        }
    }

    #[tokio::test]
    async fn monday_with_one_booking_has_fifteen_open_slots() {
        let fixture = SchedulingFixture::new().await;
        let monday = reference_monday();
        fixture
            .seed_booking(fixture.at(monday, 10, 0), BookingStatus::Confirmed)
            .await;

        let service = AvailabilityService::new(&fixture.state());
        let (_, slots) = service.resolve_availability(query(&fixture, 1)).await.unwrap();

        let monday_slots = &slots[&monday];
        assert_eq!(monday_slots.len(), 15);
        assert!(monday_slots
            .iter()
            .all(|slot| slot.start_time != fixture.at(monday, 10, 0)));
        assert_eq!(monday_slots[0].start_time, fixture.at(monday, 9, 0));
        assert_eq!(monday_slots[14].end_time, fixture.at(monday, 17, 0));
    }

    #[tokio::test]
    async fn every_requested_day_is_present_even_when_empty() {
        let fixture = SchedulingFixture::new().await;
        let service = AvailabilityService::new(&fixture.state());

        // Friday noon clock, starting Saturday: weekend days are empty.
        let mut q = query(&fixture, 3);
        q.from_date = Some(reference_monday() - Duration::days(2));
        let (_, slots) = service.resolve_availability(q).await.unwrap();

        assert_eq!(slots.len(), 3);
        let counts: Vec<usize> = slots.values().map(Vec::len).collect();
        assert_eq!(counts, vec![0, 0, 16]);
    }

    #[tokio::test]
    async fn past_slots_are_dropped() {
        let fixture = SchedulingFixture::new().await;
        fixture.clock.set(fixture.at(reference_monday(), 12, 0));
        let service = AvailabilityService::new(&fixture.state());

        let (_, slots) = service.resolve_availability(query(&fixture, 1)).await.unwrap();
        let monday_slots = &slots[&reference_monday()];

        assert_eq!(monday_slots.len(), 9);
        assert_eq!(monday_slots[0].start_time, fixture.at(reference_monday(), 12, 30));
    }

    #[tokio::test]
    async fn blocked_override_and_custom_hours_apply() {
        let fixture = SchedulingFixture::new().await;
        let monday = reference_monday();
        let tuesday = monday + Duration::days(1);
        fixture.add_override(fixture.provider.id, monday, None).await;
        fixture
            .add_override(fixture.provider.id, tuesday, Some((hm(12, 0), hm(13, 0))))
            .await;

        let service = AvailabilityService::new(&fixture.state());
        let (_, slots) = service.resolve_availability(query(&fixture, 2)).await.unwrap();

        assert!(slots[&monday].is_empty());
        assert_eq!(slots[&tuesday].len(), 2);
        assert_eq!(slots[&tuesday][0].start_time, fixture.at(tuesday, 12, 0));
    }

    #[tokio::test]
    async fn slots_merge_across_providers_sorted_by_start() {
        let fixture = SchedulingFixture::new().await;
        let second = fixture.add_provider("Dana", None).await;
        let monday = reference_monday();
        fixture
            .add_override(second.id, monday, Some((hm(8, 0), hm(9, 30))))
            .await;

        let service = AvailabilityService::new(&fixture.state());
        let (_, slots) = service.resolve_availability(query(&fixture, 1)).await.unwrap();
        let monday_slots = &slots[&monday];

        assert_eq!(monday_slots.len(), 16 + 3);
        assert_eq!(monday_slots[0].provider_name, "Dana");
        assert!(monday_slots
            .windows(2)
            .all(|pair| pair[0].start_time <= pair[1].start_time));

        // Both providers offer 09:00; registration order breaks the tie.
        let nine: Vec<&str> = monday_slots
            .iter()
            .filter(|slot| slot.start_time == fixture.at(monday, 9, 0))
            .map(|slot| slot.provider_name.as_str())
            .collect();
        assert_eq!(nine, vec!["Marco", "Dana"]);
    }

    #[tokio::test]
    async fn explicit_provider_restricts_the_result() {
        let fixture = SchedulingFixture::new().await;
        let second = fixture.add_provider("Dana", None).await;

        let service = AvailabilityService::new(&fixture.state());
        let mut q = query(&fixture, 1);
        q.provider_id = Some(second.id);
        let (_, slots) = service.resolve_availability(q).await.unwrap();

        assert!(slots[&reference_monday()]
            .iter()
            .all(|slot| slot.provider_id == second.id));
    }

    #[tokio::test]
    async fn lookup_failures_map_to_named_errors() {
        let fixture = SchedulingFixture::new().await;
        let service = AvailabilityService::new(&fixture.state());

        let mut unknown_business = query(&fixture, 1);
        unknown_business.business_id = Uuid::new_v4();
        assert_matches!(
            service.resolve_availability(unknown_business).await,
            Err(AvailabilityError::BusinessNotFound)
        );

        let mut unknown_service = query(&fixture, 1);
        unknown_service.service_id = Uuid::new_v4();
        assert_matches!(
            service.resolve_availability(unknown_service).await,
            Err(AvailabilityError::ServiceNotFound)
        );

        let mut foreign_provider = query(&fixture, 1);
        foreign_provider.provider_id = Some(Uuid::new_v4());
        assert_matches!(
            service.resolve_availability(foreign_provider).await,
            Err(AvailabilityError::NoEligibleProvider)
        );
    }

    #[tokio::test]
    async fn inactive_service_is_not_found() {
        let fixture = SchedulingFixture::new().await;
        let mut inactive = fixture.service.clone();
        inactive.is_active = false;
        fixture.store.put_service(inactive).await;

        let service = AvailabilityService::new(&fixture.state());
        assert_matches!(
            service.resolve_availability(query(&fixture, 1)).await,
            Err(AvailabilityError::ServiceNotFound)
        );
    }

    #[tokio::test]
    async fn day_count_is_validated() {
        let fixture = SchedulingFixture::new().await;
        let service = AvailabilityService::new(&fixture.state());

        assert_matches!(
            service.resolve_availability(query(&fixture, 0)).await,
            Err(AvailabilityError::Validation(_))
        );
        assert_matches!(
            service.resolve_availability(query(&fixture, 32)).await,
            Err(AvailabilityError::Validation(_))
        );
    }

    #[tokio::test]
    async fn dates_at_the_end_of_the_calendar_are_rejected() {
        let fixture = SchedulingFixture::new().await;
        let service = AvailabilityService::new(&fixture.state());

        let mut q = query(&fixture, 7);
        q.from_date = Some(NaiveDate::MAX - Duration::days(1));
        assert_matches!(
            service.resolve_availability(q).await,
            Err(AvailabilityError::Validation(_))
        );

        let mut q = query(&fixture, 1);
        q.from_date = Some(NaiveDate::MAX.pred_opt().unwrap());
        assert_matches!(
            service.resolve_availability(q).await,
            Err(AvailabilityError::Validation(_))
        );

        let mut q = query(&fixture, 1);
        q.from_date = Some(NaiveDate::MAX - Duration::days(5));
        assert_matches!(service.resolve_availability(q).await, Ok((_, days)) if days.len() == 1);
    }

    #[tokio::test]
    async fn cancelled_booking_frees_its_slot() {
        let fixture = SchedulingFixture::new().await;
        let monday = reference_monday();
        fixture
            .seed_booking(fixture.at(monday, 10, 0), BookingStatus::Cancelled)
            .await;

        let service = AvailabilityService::new(&fixture.state());
        let (_, slots) = service.resolve_availability(query(&fixture, 1)).await.unwrap();
        assert_eq!(slots[&monday].len(), 16);
    }

    #[tokio::test]
    async fn schedule_replacement_requires_the_linked_user() {
        let fixture = SchedulingFixture::new().await;
        let service = AvailabilityService::new(&fixture.state());
        let blocks = vec![ScheduleBlockInput {
            day_of_week: 6,
            start_time: "10:00".to_string(),
            end_time: "14:00".to_string(),
            is_available: true,
        }];

        assert_matches!(
            service
                .replace_schedule(fixture.provider.id, fixture.customer, blocks.clone())
                .await,
            Err(AvailabilityError::Forbidden)
        );

        let saved = service
            .replace_schedule(fixture.provider.id, fixture.provider_user, blocks)
            .await
            .unwrap();
        assert_eq!(saved.len(), 1);

        let schedule = service.get_schedule(fixture.provider.id).await.unwrap();
        assert_eq!(schedule.weekly.len(), 1);
        assert_eq!(schedule.weekly[0].day_of_week, 6);
    }

    #[tokio::test]
    async fn invalid_blocks_are_rejected_before_any_write() {
        let fixture = SchedulingFixture::new().await;
        let service = AvailabilityService::new(&fixture.state());

        for (day, start, end) in [(7, "09:00", "17:00"), (1, "9am", "17:00"), (1, "17:00", "09:00")] {
            let blocks = vec![ScheduleBlockInput {
                day_of_week: day,
                start_time: start.to_string(),
                end_time: end.to_string(),
                is_available: true,
            }];
            assert_matches!(
                service
                    .replace_schedule(fixture.provider.id, fixture.provider_user, blocks)
                    .await,
                Err(AvailabilityError::Validation(_))
            );
        }

        let schedule = service.get_schedule(fixture.provider.id).await.unwrap();
        assert_eq!(schedule.weekly.len(), 5);
    }

    #[tokio::test]
    async fn overrides_are_validated_and_unique_per_date() {
        let fixture = SchedulingFixture::new().await;
        let service = AvailabilityService::new(&fixture.state());
        let monday = reference_monday();

        let half_open = CreateOverrideRequest {
            date: monday,
            start_time: Some("10:00".to_string()),
            end_time: None,
            is_blocked: false,
            reason: None,
        };
        assert_matches!(
            service
                .create_override(fixture.provider.id, fixture.provider_user, half_open)
                .await,
            Err(AvailabilityError::Validation(_))
        );

        let day_off = CreateOverrideRequest {
            date: monday,
            start_time: None,
            end_time: None,
            is_blocked: true,
            reason: Some("Holiday".to_string()),
        };
        let saved = service
            .create_override(fixture.provider.id, fixture.provider_user, day_off.clone())
            .await
            .unwrap();
        assert!(saved.is_blocked);

        assert_matches!(
            service
                .create_override(fixture.provider.id, fixture.provider_user, day_off)
                .await,
            Err(AvailabilityError::DuplicateOverride(date)) if date == monday
        );

        let schedule = service.get_schedule(fixture.provider.id).await.unwrap();
        assert_eq!(schedule.overrides.len(), 1);
    }
}
