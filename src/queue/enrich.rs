use sqlx::SqlitePool;

use super::{format, EntrySource, QueueEntry, ServiceInfo, TierSnapshot};
use crate::{
    db,
    models::{BookingRow, WalkInRow},
};

pub const DEFAULT_DURATION_MINUTES: i64 = 30;
const WALK_IN_SERVICE: &str = "Walk-in Service";
const BOOKING_SERVICE: &str = "Service";

pub(crate) fn default_tier() -> TierSnapshot {
    TierSnapshot {
        id: None,
        name: "Bronze".to_string(),
        icon: "🥉".to_string(),
        color: "#CD7F32".to_string(),
        display_order: 1,
    }
}

async fn lookup_service(pool: &SqlitePool, service_id: &str) -> Option<ServiceInfo> {
    match db::fetch_service(pool, service_id).await {
        Ok(Some(row)) => Some(ServiceInfo {
            name: row.name,
            duration_minutes: row.duration_minutes,
            price: row.price,
        }),
        Ok(None) => {
            log::debug!("Service {service_id} not found; using defaults");
            None
        }
        Err(err) => {
            log::warn!("Service {service_id} lookup failed: {err}");
            None
        }
    }
}

pub(crate) async fn walk_in_entry(pool: &SqlitePool, row: WalkInRow) -> QueueEntry {
    let service = match row.service_id.as_deref() {
        Some(service_id) => lookup_service(pool, service_id).await,
        None => None,
    };
    let service = service.unwrap_or_else(|| ServiceInfo {
        name: row
            .notes
            .as_deref()
            .and_then(format::service_from_notes)
            .unwrap_or_else(|| WALK_IN_SERVICE.to_string()),
        duration_minutes: DEFAULT_DURATION_MINUTES,
        price: 0.0,
    });

    let minutes = row
        .scheduled_time
        .as_deref()
        .and_then(format::minutes_of_day)
        .or_else(|| row.start_time.as_deref().and_then(format::minutes_of_day));

    QueueEntry::new(
        row.id,
        row.name,
        Some(row.phone),
        service,
        minutes,
        row.status,
        row.barber_id,
        row.created_at,
        EntrySource::Walkin {
            queue_number: row.queue_number,
        },
    )
}

struct Loyalty {
    name: Option<String>,
    tier: TierSnapshot,
    lifetime_points: f64,
}

async fn lookup_loyalty(pool: &SqlitePool, customer_id: &str) -> Loyalty {
    let customer = db::fetch_customer(pool, customer_id)
        .await
        .unwrap_or_else(|err| {
            log::warn!("Customer {customer_id} lookup failed: {err}");
            None
        });

    let tier_id = customer
        .as_ref()
        .and_then(|customer| customer.current_tier_id.clone());
    let tier = match tier_id {
        Some(tier_id) => db::fetch_tier(pool, &tier_id).await.unwrap_or_else(|err| {
            log::warn!("Tier {tier_id} lookup failed: {err}");
            None
        }),
        None => None,
    };
    let tier = tier
        .map(|row| TierSnapshot {
            id: Some(row.id),
            name: row.name,
            icon: row.icon,
            color: row.color,
            display_order: row.display_order,
        })
        .unwrap_or_else(default_tier);

    let lifetime_earned = db::fetch_lifetime_earned(pool, customer_id)
        .await
        .unwrap_or_else(|err| {
            log::warn!("Points ledger for {customer_id} unavailable: {err}");
            None
        })
        .unwrap_or(0);

    Loyalty {
        name: customer.map(|customer| customer.full_name),
        tier,
        lifetime_points: lifetime_earned as f64 / 100.0,
    }
}

pub(crate) async fn booking_entry(pool: &SqlitePool, row: BookingRow) -> QueueEntry {
    let service = lookup_service(pool, &row.service_id)
        .await
        .unwrap_or_else(|| ServiceInfo {
            name: BOOKING_SERVICE.to_string(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            price: row.price,
        });

    let guest_name = row
        .customer_name
        .filter(|name| !name.trim().is_empty());

    let (name, phone, source) = match row.customer_id {
        Some(customer_id) => {
            let loyalty = lookup_loyalty(pool, &customer_id).await;
            let name = guest_name
                .or(loyalty.name)
                .unwrap_or_else(|| "Customer".to_string());
            let source = EntrySource::Booking {
                booking_code: row.booking_code,
                customer_id: Some(customer_id),
                tier: Some(loyalty.tier),
                lifetime_points: Some(loyalty.lifetime_points),
            };
            (name, None, source)
        }
        None => {
            let source = EntrySource::Booking {
                booking_code: row.booking_code,
                customer_id: None,
                tier: None,
                lifetime_points: None,
            };
            let phone = row.customer_phone.filter(|phone| !phone.trim().is_empty());
            (guest_name.unwrap_or_else(|| "Customer".to_string()), phone, source)
        }
    };

    QueueEntry::new(
        row.id,
        name,
        phone,
        service,
        format::minutes_of_day(&row.time),
        row.status,
        row.barber_id,
        row.created_at,
        source,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;

    fn walk_in_row(notes: Option<&str>) -> WalkInRow {
        WalkInRow {
            id: "w1".into(),
            branch_id: "b1".into(),
            barber_id: Some("r1".into()),
            queue_number: 4,
            name: "Jose Rizal".into(),
            phone: "0917".into(),
            service_id: None,
            scheduled_time: Some("bad".into()),
            start_time: Some("10:15".into()),
            notes: notes.map(str::to_string),
            status: "waiting".into(),
            created_at: 1,
        }
    }

    #[actix_web::test]
    async fn walk_in_service_comes_from_notes_then_default() {
        let pool = fixtures::test_pool().await;

        let entry = walk_in_entry(&pool, walk_in_row(Some("Service: Hot Towel Shave"))).await;
        assert_eq!(entry.service.name, "Hot Towel Shave");
        assert_eq!(entry.service.duration_minutes, 30);
        assert_eq!(entry.service.price, 0.0);
        assert_eq!(entry.time.as_deref(), Some("10:15"));
        assert_eq!(entry.queue_number(), Some(4));
        assert!(!entry.has_account);

        let entry = walk_in_entry(&pool, walk_in_row(None)).await;
        assert_eq!(entry.service.name, WALK_IN_SERVICE);
    }

    #[actix_web::test]
    async fn linked_booking_gets_tier_and_points() {
        let pool = fixtures::test_pool().await;
        fixtures::branch(&pool, "b1", "Makati").await;
        fixtures::service(&pool, "s1", "b1", "Skin Fade", 45, 350.0).await;
        fixtures::tier(&pool, "t-gold", "Gold", 3).await;
        fixtures::customer(&pool, "c1", "Andres Bonifacio", Some("t-gold")).await;
        fixtures::ledger(&pool, "c1", 1_234_500).await;
        fixtures::customer(&pool, "c2", "Apolinario Mabini", None).await;

        let mut row = BookingRow {
            id: "k1".into(),
            booking_code: "BK1".into(),
            branch_id: "b1".into(),
            customer_id: Some("c1".into()),
            customer_name: None,
            customer_phone: Some("0917".into()),
            customer_email: None,
            service_id: "s1".into(),
            barber_id: None,
            date: "2026-10-17".into(),
            time: "14:00".into(),
            status: "confirmed".into(),
            price: 0.0,
            created_at: 1,
        };

        let entry = booking_entry(&pool, row.clone()).await;
        assert_eq!(entry.name, "Andres Bonifacio");
        assert!(entry.has_account);
        assert_eq!(entry.phone, None);
        assert_eq!(entry.service.duration_minutes, 45);
        match &entry.source {
            EntrySource::Booking {
                tier: Some(tier),
                lifetime_points,
                ..
            } => {
                assert_eq!(tier.name, "Gold");
                assert_eq!(*lifetime_points, Some(12_345.0));
            }
            other => panic!("unexpected source {other:?}"),
        }

        row.customer_id = Some("c2".into());
        row.service_id = "gone".into();
        row.price = 180.0;
        let entry = booking_entry(&pool, row).await;
        assert_eq!(entry.service.name, BOOKING_SERVICE);
        assert_eq!(entry.service.price, 180.0);
        match &entry.source {
            EntrySource::Booking {
                tier: Some(tier),
                lifetime_points,
                ..
            } => {
                assert_eq!(tier, &default_tier());
                assert_eq!(*lifetime_points, Some(0.0));
            }
            other => panic!("unexpected source {other:?}"),
        }
    }
}
