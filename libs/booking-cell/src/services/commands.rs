//! Tagged-union entry point for conversational front ends.
//!
//! A front end turns a tool call into a [`SchedulingCommand`] and renders the
//! [`CommandOutcome`]; it never reaches into the services directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use availability_cell::{
    AvailabilityError, AvailabilityQuery, AvailabilityResponse, AvailabilityService,
};
use shared_models::error::AppError;
use shared_models::{Booking, BookingStatus};
use shared_utils::AppState;

use crate::models::{BookingError, BookingListFilter, CreateBookingRequest};
use crate::services::booking::BookingService;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SchedulingCommand {
    SearchAvailability {
        business_id: Uuid,
        service_id: Uuid,
        provider_id: Option<Uuid>,
        date: Option<NaiveDate>,
        days: Option<u32>,
    },
    CreateBooking {
        business_id: Uuid,
        service_id: Uuid,
        provider_id: Uuid,
        start_time: DateTime<Utc>,
        notes: Option<String>,
    },
    ConfirmBooking {
        booking_id: Uuid,
    },
    CancelBooking {
        booking_id: Uuid,
        reason: Option<String>,
    },
    ListMyBookings {
        status: Option<BookingStatus>,
        #[serde(default)]
        upcoming: bool,
    },
}

impl SchedulingCommand {
    pub fn name(&self) -> &'static str {
        match self {
            SchedulingCommand::SearchAvailability { .. } => "search_availability",
            SchedulingCommand::CreateBooking { .. } => "create_booking",
            SchedulingCommand::ConfirmBooking { .. } => "confirm_booking",
            SchedulingCommand::CancelBooking { .. } => "cancel_booking",
            SchedulingCommand::ListMyBookings { .. } => "list_my_bookings",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", content = "data", rename_all = "snake_case")]
pub enum CommandOutcome {
    Availability(AvailabilityResponse),
    Booking(Booking),
    Bookings(Vec<Booking>),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Availability(e) => e.into(),
            CommandError::Booking(e) => e.into(),
        }
    }
}

pub struct CommandHandler {
    availability: AvailabilityService,
    bookings: BookingService,
}

impl CommandHandler {
    pub fn new(state: &AppState) -> Self {
        Self {
            availability: AvailabilityService::new(state),
            bookings: BookingService::new(state),
        }
    }

    #[instrument(skip(self, command), fields(command = command.name()))]
    pub async fn handle(
        &self,
        acting_user: Uuid,
        command: SchedulingCommand,
    ) -> Result<CommandOutcome, CommandError> {
        debug!("Dispatching command for user {}", acting_user);

        let outcome = match command {
            SchedulingCommand::SearchAvailability {
                business_id,
                service_id,
                provider_id,
                date,
                days,
            } => {
                let query = AvailabilityQuery {
                    business_id,
                    service_id,
                    provider_id,
                    from_date: date,
                    days,
                };
                let (business, slots) = self.availability.resolve_availability(query).await?;
                CommandOutcome::Availability(AvailabilityResponse::new(
                    business.id,
                    service_id,
                    business.timezone,
                    slots,
                ))
            }
            SchedulingCommand::CreateBooking {
                business_id,
                service_id,
                provider_id,
                start_time,
                notes,
            } => {
                let request = CreateBookingRequest {
                    service_id,
                    provider_id,
                    start_time,
                    notes,
                };
                CommandOutcome::Booking(
                    self.bookings
                        .create_booking(business_id, acting_user, request)
                        .await?,
                )
            }
            SchedulingCommand::ConfirmBooking { booking_id } => CommandOutcome::Booking(
                self.bookings.confirm_booking(booking_id, acting_user).await?,
            ),
            SchedulingCommand::CancelBooking { booking_id, reason } => CommandOutcome::Booking(
                self.bookings
                    .cancel_booking(booking_id, acting_user, reason)
                    .await?,
            ),
            SchedulingCommand::ListMyBookings { status, upcoming } => CommandOutcome::Bookings(
                self.bookings
                    .list_customer_bookings(acting_user, BookingListFilter { status, upcoming })
                    .await?,
            ),
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_utils::test_utils::{reference_monday, SchedulingFixture};

    #[test]
    fn commands_parse_from_tool_calls() {
        let raw = r#"{"command":"cancel_booking","booking_id":"7f1c7f0e-4b8a-4d5e-9a55-0b0c6f6f1a11"}"#;
        let command: SchedulingCommand = serde_json::from_str(raw).unwrap();
        assert_matches!(command, SchedulingCommand::CancelBooking { reason: None, .. });

        let raw = r#"{"command":"list_my_bookings","status":"Confirmed"}"#;
        let command: SchedulingCommand = serde_json::from_str(raw).unwrap();
        assert_matches!(
            command,
            SchedulingCommand::ListMyBookings { status: Some(BookingStatus::Confirmed), upcoming: false }
        );
    }

    #[tokio::test]
    async fn search_then_book_then_list() {
        let fixture = SchedulingFixture::new().await;
        let handler = CommandHandler::new(&fixture.state());

        let search = SchedulingCommand::SearchAvailability {
            business_id: fixture.business.id,
            service_id: fixture.service.id,
            provider_id: None,
            date: Some(reference_monday()),
            days: Some(1),
        };
        let slots = match handler.handle(fixture.customer, search).await.unwrap() {
            CommandOutcome::Availability(response) => response.days[0].slots.clone(),
            other => panic!("unexpected outcome: {:?}", other),
        };
        let first = &slots[0];

        let create = SchedulingCommand::CreateBooking {
            business_id: fixture.business.id,
            service_id: fixture.service.id,
            provider_id: first.provider_id,
            start_time: first.start_time,
            notes: Some("Skin fade".to_string()),
        };
        let booking = match handler.handle(fixture.customer, create).await.unwrap() {
            CommandOutcome::Booking(booking) => booking,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(booking.customer_id, fixture.customer);

        let list = SchedulingCommand::ListMyBookings {
            status: None,
            upcoming: true,
        };
        assert_matches!(
            handler.handle(fixture.customer, list).await,
            Ok(CommandOutcome::Bookings(bookings)) if bookings.len() == 1
        );
    }

    #[tokio::test]
    async fn errors_keep_their_cell_of_origin() {
        let fixture = SchedulingFixture::new().await;
        let handler = CommandHandler::new(&fixture.state());

        let search = SchedulingCommand::SearchAvailability {
            business_id: Uuid::new_v4(),
            service_id: fixture.service.id,
            provider_id: None,
            date: None,
            days: None,
        };
        assert_matches!(
            handler.handle(fixture.customer, search).await,
            Err(CommandError::Availability(AvailabilityError::BusinessNotFound))
        );

        let confirm = SchedulingCommand::ConfirmBooking {
            booking_id: Uuid::new_v4(),
        };
        assert_matches!(
            handler.handle(fixture.customer, confirm).await,
            Err(CommandError::Booking(BookingError::NotFound))
        );
    }
}
