//! Unified branch queue: today's walk-ins and bookings merged into one
//! ordered line, grouped per barber with same-minute conflicts flagged.

mod enrich;
pub mod format;
mod grouping;
mod ordering;
pub mod public;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{db, error::AppError, models::is_closed_status};

/// A server-local calendar day and its inclusive millisecond bounds.
#[derive(Clone, Debug)]
pub struct QueueDay {
    pub date: NaiveDate,
    pub start_ms: i64,
    pub end_ms: i64,
}

impl QueueDay {
    pub fn today() -> Self {
        Self::for_date(Local::now().date_naive())
    }

    pub fn for_date(date: NaiveDate) -> Self {
        let start_ms = local_midnight_ms(date);
        let end_ms = date
            .succ_opt()
            .map(|next| local_midnight_ms(next) - 1)
            .unwrap_or(start_ms + 86_399_999);
        Self {
            date,
            start_ms,
            end_ms,
        }
    }

    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn contains(&self, timestamp_ms: i64) -> bool {
        (self.start_ms..=self.end_ms).contains(&timestamp_ms)
    }

    /// A millisecond timestamp `minutes` after local midnight.
    #[cfg(test)]
    pub fn at_minute(&self, minutes: u32) -> i64 {
        self.start_ms + i64::from(minutes) * 60_000
    }
}

fn local_midnight_ms(date: NaiveDate) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|instant: DateTime<Local>| instant.timestamp_millis())
        .unwrap_or_else(|| midnight.and_utc().timestamp_millis())
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: String,
    pub duration_minutes: i64,
    pub price: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierSnapshot {
    pub id: Option<String>,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub display_order: i64,
}

/// Where a queue entry came from, and what only that source knows.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntrySource {
    Walkin {
        #[serde(rename = "queueNumber")]
        queue_number: i64,
    },
    Booking {
        #[serde(rename = "bookingCode")]
        booking_code: String,
        #[serde(rename = "customerId")]
        customer_id: Option<String>,
        tier: Option<TierSnapshot>,
        #[serde(rename = "lifetimePoints")]
        lifetime_points: Option<f64>,
    },
}

/// One person in line, whichever channel they arrived through.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub service: ServiceInfo,
    /// Canonical "HH:MM", if the entry has a slot at all.
    pub time: Option<String>,
    pub start_time: Option<String>,
    pub status: String,
    pub barber_id: Option<String>,
    pub has_account: bool,
    pub created_at: i64,
    pub has_time_conflict: bool,
    #[serde(flatten)]
    pub source: EntrySource,
    #[serde(skip)]
    minutes: Option<u32>,
}

impl QueueEntry {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: String,
        name: String,
        phone: Option<String>,
        service: ServiceInfo,
        minutes: Option<u32>,
        status: String,
        barber_id: Option<String>,
        created_at: i64,
        source: EntrySource,
    ) -> Self {
        let has_account = matches!(
            &source,
            EntrySource::Booking {
                customer_id: Some(_),
                ..
            }
        );
        Self {
            id,
            name,
            phone,
            service,
            time: minutes.map(format::clock_time),
            start_time: minutes.map(format::display_time),
            status,
            barber_id,
            has_account,
            created_at,
            has_time_conflict: false,
            source,
            minutes,
        }
    }

    pub fn minutes(&self) -> Option<u32> {
        self.minutes
    }

    pub fn is_walk_in(&self) -> bool {
        matches!(self.source, EntrySource::Walkin { .. })
    }

    pub fn queue_number(&self) -> Option<i64> {
        match self.source {
            EntrySource::Walkin { queue_number } => Some(queue_number),
            EntrySource::Booking { .. } => None,
        }
    }

    /// Still waiting or in the chair.
    pub fn is_visible(&self) -> bool {
        !is_closed_status(&self.status)
    }

    fn is_assigned_to(&self, barber_id: &str) -> bool {
        self.barber_id.as_deref() == Some(barber_id)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarberStats {
    pub total: usize,
    pub active: usize,
    pub waiting: usize,
    pub completed: usize,
    pub signed_in: usize,
    pub walk_ins: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeConflict {
    pub time: String,
    pub count: usize,
    pub entry_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarberQueue {
    pub barber_id: String,
    pub barber_name: String,
    pub barber_avatar: String,
    pub barber_color: String,
    pub barber_status: String,
    pub customers: Vec<QueueEntry>,
    pub stats: BarberStats,
    pub conflicts: Vec<TimeConflict>,
}

impl BarberQueue {
    fn empty(barber_id: &str) -> Self {
        Self {
            barber_id: barber_id.to_string(),
            barber_name: String::new(),
            barber_avatar: String::new(),
            barber_color: format::barber_color(barber_id).to_string(),
            barber_status: grouping::BARBER_AVAILABLE.to_string(),
            customers: Vec::new(),
            stats: BarberStats::default(),
            conflicts: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub total_customers: usize,
    pub total_signed_in: usize,
    pub total_walk_ins: usize,
    pub active: usize,
    pub waiting: usize,
    pub completed: usize,
    pub total_barbers: usize,
    pub available_barbers: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedQueue {
    pub branch_id: String,
    pub branch_name: String,
    pub date: String,
    pub queue_by_barber: Vec<BarberQueue>,
    pub all_customers: Vec<QueueEntry>,
    pub stats: QueueStats,
}

pub async fn compose_queue(
    pool: &SqlitePool,
    branch_id: &str,
    status: Option<&str>,
) -> Result<ComposedQueue, AppError> {
    compose_queue_for(pool, branch_id, status, &QueueDay::today()).await
}

/// Builds the queue for `day`. Walk-in and booking read failures degrade
/// to an empty source instead of failing the whole view.
pub async fn compose_queue_for(
    pool: &SqlitePool,
    branch_id: &str,
    status: Option<&str>,
    day: &QueueDay,
) -> Result<ComposedQueue, AppError> {
    let branch = db::fetch_branch(pool, branch_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("branch {branch_id}")))?;
    let barbers = db::fetch_active_barbers(pool, branch_id).await?;

    let walk_ins = match db::fetch_walk_ins(pool, branch_id, day.start_ms, day.end_ms).await {
        Ok(rows) => rows,
        Err(err) => {
            log::warn!("Queue for branch {branch_id}: walk-ins unavailable: {err}");
            Vec::new()
        }
    };
    let bookings = match db::fetch_bookings(pool, branch_id, &day.date_string()).await {
        Ok(rows) => rows,
        Err(err) => {
            log::warn!("Queue for branch {branch_id}: bookings unavailable: {err}");
            Vec::new()
        }
    };

    let mut entries = Vec::with_capacity(walk_ins.len() + bookings.len());
    for row in walk_ins
        .into_iter()
        .filter(|row| day.contains(row.created_at))
        .filter(|row| status.map_or(true, |wanted| row.status == wanted))
    {
        entries.push(enrich::walk_in_entry(pool, row).await);
    }
    for row in bookings
        .into_iter()
        .filter(|row| !is_closed_status(&row.status))
    {
        entries.push(enrich::booking_entry(pool, row).await);
    }

    ordering::sort_entries(&mut entries);
    let queue_by_barber = grouping::group_by_barber(&barbers, &mut entries);
    let stats = grouping::branch_stats(&entries, &barbers, &queue_by_barber);

    Ok(ComposedQueue {
        branch_id: branch.id,
        branch_name: branch.name,
        date: day.date_string(),
        queue_by_barber,
        all_customers: entries,
        stats,
    })
}

/// One barber's slice of the branch queue; unknown barbers get an empty group.
pub async fn barber_queue(
    pool: &SqlitePool,
    branch_id: &str,
    barber_id: &str,
) -> Result<BarberQueue, AppError> {
    let queue = compose_queue(pool, branch_id, None).await?;
    Ok(pick_barber(queue, barber_id))
}

pub async fn queue_stats(pool: &SqlitePool, branch_id: &str) -> Result<QueueStats, AppError> {
    Ok(compose_queue(pool, branch_id, None).await?.stats)
}

fn pick_barber(queue: ComposedQueue, barber_id: &str) -> BarberQueue {
    queue
        .queue_by_barber
        .into_iter()
        .find(|group| group.barber_id == barber_id)
        .unwrap_or_else(|| BarberQueue::empty(barber_id))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::db::fixtures;

    const DATE: &str = "2026-10-17";

    fn day() -> QueueDay {
        QueueDay::for_date(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap())
    }

    /// Two barbers, four walk-ins (one finished, one from yesterday) and
    /// four bookings (one cancelled, one for tomorrow).
    async fn seeded() -> SqlitePool {
        let pool = fixtures::test_pool().await;
        let day = day();
        fixtures::branch(&pool, "b1", "Makati").await;
        fixtures::barber(&pool, "r1", "b1", "Ramon Cruz").await;
        fixtures::barber(&pool, "r2", "b1", "Lito Reyes").await;
        fixtures::service(&pool, "s1", "b1", "Classic Cut", 30, 250.0).await;
        fixtures::customer(&pool, "c1", "Andres Bonifacio", None).await;

        fixtures::walk_in(&pool, "w1", "b1", Some("r1"), 1, "Emilio Aguinaldo", None, "waiting", day.at_minute(480)).await;
        fixtures::walk_in(&pool, "w2", "b1", Some("r1"), 2, "Melchora Aquino", Some("13:30"), "active", day.at_minute(490)).await;
        fixtures::walk_in(&pool, "w3", "b1", Some("r2"), 3, "Juan Luna", None, "completed", day.at_minute(500)).await;
        fixtures::walk_in(&pool, "w-old", "b1", Some("r1"), 9, "Yesterday", None, "waiting", day.start_ms - 1).await;

        fixtures::booking(&pool, "k1", "b1", Some("r1"), Some("c1"), "s1", DATE, "14:00", "confirmed", day.at_minute(300)).await;
        fixtures::booking(&pool, "k2", "b1", Some("r2"), None, "s1", DATE, "09:00", "pending", day.at_minute(310)).await;
        fixtures::booking(&pool, "k3", "b1", Some("r2"), None, "s1", DATE, "11:00", "cancelled", day.at_minute(320)).await;
        fixtures::booking(&pool, "k4", "b1", Some("r1"), None, "s1", "2026-10-18", "10:00", "confirmed", day.at_minute(330)).await;
        pool
    }

    fn ids(entries: &[QueueEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    #[actix_web::test]
    async fn merges_todays_open_records() {
        let pool = seeded().await;
        let queue = compose_queue_for(&pool, "b1", None, &day()).await.unwrap();

        let all: HashSet<&str> = ids(&queue.all_customers).into_iter().collect();
        assert_eq!(all, HashSet::from(["w1", "w2", "w3", "k1", "k2"]));
        assert_eq!(queue.branch_name, "Makati");
        assert_eq!(queue.date, DATE);

        let r1 = &queue.queue_by_barber[1];
        assert_eq!(r1.barber_id, "r1");
        assert_eq!(ids(&r1.customers), ["w2", "k1", "w1"]);
        let r2 = &queue.queue_by_barber[0];
        assert_eq!(ids(&r2.customers), ["k2", "w3"]);

        let grouped: Vec<&str> = queue
            .queue_by_barber
            .iter()
            .flat_map(|group| ids(&group.customers))
            .collect();
        assert_eq!(grouped.len(), grouped.iter().collect::<HashSet<_>>().len());
    }

    #[actix_web::test]
    async fn status_filter_only_narrows_walk_ins() {
        let pool = seeded().await;
        let queue = compose_queue_for(&pool, "b1", Some("waiting"), &day()).await.unwrap();
        let all: HashSet<&str> = ids(&queue.all_customers).into_iter().collect();
        assert_eq!(all, HashSet::from(["w1", "k1", "k2"]));
    }

    #[actix_web::test]
    async fn composing_twice_gives_the_same_queue() {
        let pool = seeded().await;
        let first = compose_queue_for(&pool, "b1", None, &day()).await.unwrap();
        let second = compose_queue_for(&pool, "b1", None, &day()).await.unwrap();
        assert_eq!(first, second);
    }

    #[actix_web::test]
    async fn stats_cover_the_whole_branch() {
        let pool = seeded().await;
        let stats = compose_queue_for(&pool, "b1", None, &day()).await.unwrap().stats;
        assert_eq!(stats.total_customers, 5);
        assert_eq!(stats.total_walk_ins, 3);
        assert_eq!(stats.total_signed_in, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.waiting, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.total_barbers, 2);
        assert_eq!(stats.available_barbers, 1);
    }

    #[actix_web::test]
    async fn unreadable_source_degrades_to_the_other() {
        let pool = seeded().await;
        sqlx::query("DROP TABLE walk_ins").execute(&pool).await.unwrap();
        let queue = compose_queue_for(&pool, "b1", None, &day()).await.unwrap();
        let all: HashSet<&str> = ids(&queue.all_customers).into_iter().collect();
        assert_eq!(all, HashSet::from(["k1", "k2"]));

        let pool = seeded().await;
        sqlx::query("DROP TABLE bookings").execute(&pool).await.unwrap();
        let queue = compose_queue_for(&pool, "b1", None, &day()).await.unwrap();
        let all: HashSet<&str> = ids(&queue.all_customers).into_iter().collect();
        assert_eq!(all, HashSet::from(["w1", "w2", "w3"]));
    }

    #[actix_web::test]
    async fn missing_branch_is_not_found() {
        let pool = seeded().await;
        let err = compose_queue_for(&pool, "nowhere", None, &day()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(matches!(queue_stats(&pool, "nowhere").await, Err(AppError::NotFound(_))));
    }

    #[actix_web::test]
    async fn barber_slice_and_unknown_barber() {
        let pool = seeded().await;
        let queue = compose_queue_for(&pool, "b1", None, &day()).await.unwrap();
        let slice = pick_barber(queue.clone(), "r2");
        assert_eq!(ids(&slice.customers), ["k2", "w3"]);

        let ghost = pick_barber(queue, "r-ghost");
        assert_eq!(ghost.barber_id, "r-ghost");
        assert!(ghost.customers.is_empty());
        assert_eq!(ghost.stats, BarberStats::default());

        let empty = barber_queue(&pool, "b1", "r-ghost").await.unwrap();
        assert!(empty.customers.is_empty());
    }
}
