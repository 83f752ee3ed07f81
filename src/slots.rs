//! Time-slot checks and the two intake writes (bookings and walk-ins).
//!
//! `validate_time_slot` is advisory only. `reserve_booking` repeats the same
//! check inside the insert transaction, and the partial unique index on open
//! bookings has the final say when two reservations race.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    auth::new_id,
    error::AppError,
    models::{BookingRow, WalkInRow, STATUS_PENDING, STATUS_WAITING},
    queue::{format, QueueDay},
};

pub const REASON_SLOT_TAKEN: &str = "time_slot_taken";

#[derive(Clone, Debug, Deserialize)]
pub struct SlotQuery {
    pub barber_id: String,
    pub date: String,
    pub time: String,
    pub exclude_booking_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictingRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub customer_name: Option<String>,
    pub time: String,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_record: Option<ConflictingRecord>,
}

impl SlotAvailability {
    fn open() -> Self {
        Self {
            available: true,
            reason: None,
            conflicting_record: None,
        }
    }

    fn taken(record: Option<ConflictingRecord>) -> Self {
        Self {
            available: false,
            reason: Some(REASON_SLOT_TAKEN.to_string()),
            conflicting_record: record,
        }
    }
}

struct Slot {
    date: NaiveDate,
    time: String,
}

impl Slot {
    fn parse(date: &str, time: &str) -> Result<Self, AppError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::BadRequest(format!("invalid date '{date}', expected YYYY-MM-DD")))?;
        let minutes = format::minutes_of_day(time)
            .ok_or_else(|| AppError::BadRequest(format!("invalid time '{time}', expected HH:MM")))?;
        Ok(Self {
            date,
            time: format::clock_time(minutes),
        })
    }

    fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

async fn find_conflict(
    conn: &mut SqliteConnection,
    barber_id: &str,
    slot: &Slot,
    exclude_booking_id: Option<&str>,
    today: &QueueDay,
) -> Result<Option<ConflictingRecord>, sqlx::Error> {
    let booking = sqlx::query_as::<_, (String, Option<String>, String, String)>(
        r#"SELECT id, customer_name, time, status
           FROM bookings
           WHERE barber_id = ? AND date = ? AND substr(time, 1, 5) = ?
             AND status NOT IN ('cancelled', 'completed')
             AND (? IS NULL OR id <> ?)
           LIMIT 1"#,
    )
    .bind(barber_id)
    .bind(slot.date_string())
    .bind(&slot.time)
    .bind(exclude_booking_id)
    .bind(exclude_booking_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some((id, customer_name, time, status)) = booking {
        return Ok(Some(ConflictingRecord {
            id,
            kind: "booking",
            customer_name,
            time,
            status,
        }));
    }

    if slot.date != today.date {
        return Ok(None);
    }

    let walk_in = sqlx::query_as::<_, (String, String, Option<String>, Option<String>, String)>(
        r#"SELECT id, name, scheduled_time, start_time, status
           FROM walk_ins
           WHERE barber_id = ? AND created_at >= ? AND created_at <= ?
             AND status NOT IN ('cancelled', 'completed')
             AND (substr(scheduled_time, 1, 5) = ? OR substr(start_time, 1, 5) = ?)
           LIMIT 1"#,
    )
    .bind(barber_id)
    .bind(today.start_ms)
    .bind(today.end_ms)
    .bind(&slot.time)
    .bind(&slot.time)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(walk_in.map(|(id, name, scheduled_time, start_time, status)| ConflictingRecord {
        id,
        kind: "walkin",
        customer_name: Some(name),
        time: scheduled_time.or(start_time).unwrap_or_default(),
        status,
    }))
}

pub async fn validate_time_slot(pool: &SqlitePool, query: &SlotQuery) -> Result<SlotAvailability, AppError> {
    validate_time_slot_for(pool, query, &QueueDay::today()).await
}

pub async fn validate_time_slot_for(
    pool: &SqlitePool,
    query: &SlotQuery,
    today: &QueueDay,
) -> Result<SlotAvailability, AppError> {
    let slot = Slot::parse(&query.date, &query.time)?;
    let exclude = query
        .exclude_booking_id
        .as_deref()
        .filter(|id| !id.trim().is_empty());

    let mut conn = pool.acquire().await?;
    let conflict = find_conflict(&mut conn, &query.barber_id, &slot, exclude, today).await?;
    Ok(match conflict {
        Some(record) => SlotAvailability::taken(Some(record)),
        None => SlotAvailability::open(),
    })
}

async fn row_exists(conn: &mut SqliteConnection, sql: &str, binds: &[&str]) -> Result<bool, sqlx::Error> {
    let mut query = sqlx::query_scalar::<_, i64>(sql);
    for value in binds {
        query = query.bind(*value);
    }
    Ok(query.fetch_optional(&mut *conn).await?.is_some())
}

async fn ensure_branch_and_barber(
    conn: &mut SqliteConnection,
    branch_id: &str,
    barber_id: Option<&str>,
) -> Result<(), AppError> {
    if !row_exists(&mut *conn, "SELECT 1 FROM branches WHERE id = ?", &[branch_id]).await? {
        return Err(AppError::NotFound(format!("branch {branch_id}")));
    }
    if let Some(barber_id) = barber_id {
        let sql = "SELECT 1 FROM barbers WHERE id = ? AND branch_id = ? AND is_active = 1";
        if !row_exists(&mut *conn, sql, &[barber_id, branch_id]).await? {
            return Err(AppError::NotFound(format!("barber {barber_id}")));
        }
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub barber_id: String,
    pub service_id: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
}

#[derive(Debug)]
pub enum Reservation {
    Confirmed(BookingRow),
    Rejected(SlotAvailability),
}

fn booking_code() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("BK-{}", id.chars().take(8).collect::<String>().to_uppercase())
}

/// Returns `false` when an open booking already holds the slot.
async fn insert_booking(conn: &mut SqliteConnection, row: &BookingRow) -> Result<bool, sqlx::Error> {
    let inserted = sqlx::query(
        r#"INSERT INTO bookings
           (id, booking_code, branch_id, customer_id, customer_name, customer_phone, customer_email,
            service_id, barber_id, date, time, status, price, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&row.id)
    .bind(&row.booking_code)
    .bind(&row.branch_id)
    .bind(&row.customer_id)
    .bind(&row.customer_name)
    .bind(&row.customer_phone)
    .bind(&row.customer_email)
    .bind(&row.service_id)
    .bind(&row.barber_id)
    .bind(&row.date)
    .bind(&row.time)
    .bind(&row.status)
    .bind(row.price)
    .bind(row.created_at)
    .execute(&mut *conn)
    .await;

    match inserted {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Ok(false),
        Err(err) => Err(err),
    }
}

/// Check-and-insert under `BEGIN IMMEDIATE`: concurrent writers wait on the
/// busy timeout, so the conflict check always sees earlier bookings.
pub async fn reserve_booking(
    pool: &SqlitePool,
    branch_id: &str,
    input: NewBooking,
    today: &QueueDay,
) -> Result<Reservation, AppError> {
    let slot = Slot::parse(&input.date, &input.time)?;
    let customer_id = non_empty(input.customer_id);
    let customer_name = non_empty(input.customer_name);
    if customer_id.is_none() && customer_name.is_none() {
        return Err(AppError::BadRequest(
            "guest bookings need a customer name".to_string(),
        ));
    }

    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;
    ensure_branch_and_barber(&mut tx, branch_id, Some(&input.barber_id)).await?;
    if let Some(customer_id) = customer_id.as_deref() {
        if !row_exists(&mut tx, "SELECT 1 FROM customers WHERE id = ?", &[customer_id]).await? {
            return Err(AppError::NotFound(format!("customer {customer_id}")));
        }
    }
    let price = sqlx::query_scalar::<_, f64>("SELECT price FROM services WHERE id = ?")
        .bind(&input.service_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("unknown service {}", input.service_id)))?;

    if let Some(record) = find_conflict(&mut tx, &input.barber_id, &slot, None, today).await? {
        return Ok(Reservation::Rejected(SlotAvailability::taken(Some(record))));
    }

    let row = BookingRow {
        id: new_id(),
        booking_code: booking_code(),
        branch_id: branch_id.to_string(),
        customer_id,
        customer_name,
        customer_phone: non_empty(input.customer_phone),
        customer_email: non_empty(input.customer_email),
        service_id: input.service_id,
        barber_id: Some(input.barber_id),
        date: slot.date_string(),
        time: slot.time,
        status: STATUS_PENDING.to_string(),
        price,
        created_at: Utc::now().timestamp_millis(),
    };

    if !insert_booking(&mut tx, &row).await? {
        log::info!("Booking slot {} {} for barber {:?} lost a race", row.date, row.time, row.barber_id);
        return Ok(Reservation::Rejected(SlotAvailability::taken(None)));
    }

    tx.commit().await?;
    log::info!("Booked {} at {} {} for branch {branch_id}", row.booking_code, row.date, row.time);
    Ok(Reservation::Confirmed(row))
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWalkIn {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub barber_id: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Registers a front-desk arrival with the next queue number for the day.
pub async fn check_in_walk_in(
    pool: &SqlitePool,
    branch_id: &str,
    input: NewWalkIn,
    now: DateTime<Local>,
) -> Result<WalkInRow, AppError> {
    let name = input.name.trim().to_string();
    let phone = input.phone.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("customer name is required".to_string()));
    }
    if phone.is_empty() {
        return Err(AppError::BadRequest("phone number is required".to_string()));
    }
    let scheduled_time = match non_empty(input.scheduled_time) {
        Some(raw) => Some(
            format::minutes_of_day(&raw)
                .map(format::clock_time)
                .ok_or_else(|| AppError::BadRequest(format!("invalid time '{raw}', expected HH:MM")))?,
        ),
        None => None,
    };
    let barber_id = non_empty(input.barber_id);
    let service_id = non_empty(input.service_id);
    let day = QueueDay::for_date(now.date_naive());

    // Holds the write lock across MAX() + 1 and the insert.
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;
    ensure_branch_and_barber(&mut tx, branch_id, barber_id.as_deref()).await?;
    if let Some(service_id) = service_id.as_deref() {
        if !row_exists(&mut tx, "SELECT 1 FROM services WHERE id = ?", &[service_id]).await? {
            return Err(AppError::BadRequest(format!("unknown service {service_id}")));
        }
    }

    let queue_number = sqlx::query_scalar::<_, i64>(
        r#"SELECT COALESCE(MAX(queue_number), 0) + 1
           FROM walk_ins
           WHERE branch_id = ? AND created_at >= ? AND created_at <= ?"#,
    )
    .bind(branch_id)
    .bind(day.start_ms)
    .bind(day.end_ms)
    .fetch_one(&mut *tx)
    .await?;

    let row = WalkInRow {
        id: new_id(),
        branch_id: branch_id.to_string(),
        barber_id,
        queue_number,
        name,
        phone,
        service_id,
        scheduled_time,
        start_time: None,
        notes: non_empty(input.notes),
        status: STATUS_WAITING.to_string(),
        created_at: now.timestamp_millis(),
    };

    sqlx::query(
        r#"INSERT INTO walk_ins
           (id, branch_id, barber_id, queue_number, name, phone, service_id,
            scheduled_time, start_time, notes, status, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&row.id)
    .bind(&row.branch_id)
    .bind(&row.barber_id)
    .bind(row.queue_number)
    .bind(&row.name)
    .bind(&row.phone)
    .bind(&row.service_id)
    .bind(&row.scheduled_time)
    .bind(&row.start_time)
    .bind(&row.notes)
    .bind(&row.status)
    .bind(row.created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    log::info!("Walk-in #{} checked in at branch {branch_id}", row.queue_number);
    Ok(row)
}
