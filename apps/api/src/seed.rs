//! Demo tenants for local runs.

use chrono_tz::{America, Europe};
use tracing::info;
use uuid::Uuid;

use shared_database::{InMemoryStore, ScheduleStore, StoreResult};
use shared_models::{Business, Provider, Service, SubscriptionStatus, WeeklyScheduleBlock};

/// Identifiers worth printing so a developer can call the API right away.
#[derive(Debug, Clone)]
pub struct DemoIds {
    pub barbershop_id: Uuid,
    pub haircut_id: Uuid,
    pub physio_id: Uuid,
    pub assessment_id: Uuid,
    pub provider_user_id: Uuid,
}

/// Seeds an auto-confirming barbershop and a manually confirming physio clinic.
pub async fn seed_demo_data(store: &InMemoryStore) -> StoreResult<DemoIds> {
    let provider_user_id = Uuid::new_v4();

    let barbershop = Business {
        id: Uuid::new_v4(),
        name: "Fresh Cuts Barbershop".to_string(),
        timezone: America::New_York,
        auto_confirm_bookings: true,
        reminder_lead_minutes: 120,
        subscription_status: SubscriptionStatus::Active,
    };
    store.put_business(barbershop.clone()).await;

    let haircut = service(&barbershop, "Classic Haircut", 30, 35.0);
    let beard = service(&barbershop, "Beard Trim", 15, 20.0);
    store.put_service(haircut.clone()).await;
    store.put_service(beard.clone()).await;

    let tony = provider(&barbershop, "Tony", Some(provider_user_id));
    let sarah = provider(&barbershop, "Sarah", None);
    for p in [&tony, &sarah] {
        store.put_provider(p.clone()).await;
        store.put_offering(p.id, haircut.id).await;
    }
    store.put_offering(tony.id, beard.id).await;

    // Tony works Tue-Sat with a lunch break; Sarah works Mon-Fri straight through.
    store
        .replace_weekly_schedule(
            tony.id,
            (2..=6)
                .flat_map(|day| {
                    [
                        block(tony.id, day, (9, 0), (12, 0)),
                        block(tony.id, day, (13, 0), (18, 0)),
                    ]
                })
                .collect(),
        )
        .await?;
    store
        .replace_weekly_schedule(
            sarah.id,
            (1..=5).map(|day| block(sarah.id, day, (10, 0), (19, 0))).collect(),
        )
        .await?;

    let physio = Business {
        id: Uuid::new_v4(),
        name: "Lotus Physio".to_string(),
        timezone: Europe::London,
        auto_confirm_bookings: false,
        reminder_lead_minutes: 24 * 60,
        subscription_status: SubscriptionStatus::Trial,
    };
    store.put_business(physio.clone()).await;

    let assessment = service(&physio, "Initial Assessment", 60, 80.0);
    store.put_service(assessment.clone()).await;

    let therapist = provider(&physio, "Dr. Okafor", None);
    store.put_provider(therapist.clone()).await;
    store.put_offering(therapist.id, assessment.id).await;
    store
        .replace_weekly_schedule(
            therapist.id,
            (1..=5).map(|day| block(therapist.id, day, (8, 0), (16, 0))).collect(),
        )
        .await?;

    let ids = DemoIds {
        barbershop_id: barbershop.id,
        haircut_id: haircut.id,
        physio_id: physio.id,
        assessment_id: assessment.id,
        provider_user_id,
    };
    info!("Seeded demo data: {:?}", ids);
    Ok(ids)
}

fn service(business: &Business, name: &str, minutes: i64, price: f64) -> Service {
    Service {
        id: Uuid::new_v4(),
        business_id: business.id,
        name: name.to_string(),
        duration_minutes: minutes,
        price,
        is_active: true,
    }
}

fn provider(business: &Business, name: &str, user_id: Option<Uuid>) -> Provider {
    Provider {
        id: Uuid::new_v4(),
        business_id: business.id,
        display_name: name.to_string(),
        user_id,
        is_active: true,
    }
}

fn block(provider_id: Uuid, day: u8, start: (u32, u32), end: (u32, u32)) -> WeeklyScheduleBlock {
    WeeklyScheduleBlock {
        provider_id,
        day_of_week: day,
        start_time: chrono::NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap_or_default(),
        end_time: chrono::NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap_or_default(),
        is_available: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_database::CatalogStore;

    #[tokio::test]
    async fn demo_tenants_are_bookable() {
        let store = InMemoryStore::new();
        let ids = seed_demo_data(&store).await.unwrap();

        let haircut_providers = store
            .providers_offering(ids.barbershop_id, ids.haircut_id)
            .await
            .unwrap();
        assert_eq!(haircut_providers.len(), 2);

        let physio = store.get_business(ids.physio_id).await.unwrap().unwrap();
        assert!(!physio.auto_confirm_bookings);
        assert_eq!(store.list_active_businesses().await.unwrap().len(), 2);
    }
}
