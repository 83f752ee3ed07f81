use std::{fs, path::Path};

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    auth::{hash_password, new_id},
    config::AdminSeed,
    models::{
        BarberRow, BookingRow, BranchRow, CustomerRow, ServiceRow, TierRow, WalkInRow, ROLE_ADMIN,
    },
};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else {
        db_url.strip_prefix("sqlite:")
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn seed_admin(pool: &SqlitePool, seed: &AdminSeed) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_as::<_, (String,)>("SELECT id FROM staff_users WHERE role = ? LIMIT 1")
        .bind(ROLE_ADMIN)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    if seed.password == "admin" {
        log::warn!("ADMIN_PASSWORD not set. Using default password 'admin'. Set ADMIN_PASSWORD in production.");
    }

    let password_hash = hash_password(&seed.password)
        .map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;

    sqlx::query(
        r#"INSERT INTO staff_users (id, username, display_name, role, password_hash, active, created_at)
           VALUES (?, ?, ?, ?, ?, 1, ?)"#,
    )
    .bind(new_id())
    .bind(&seed.username)
    .bind(&seed.display_name)
    .bind(ROLE_ADMIN)
    .bind(password_hash)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    log::info!("Seeded admin account '{}'", seed.username);
    Ok(())
}

pub async fn fetch_branch(pool: &SqlitePool, branch_id: &str) -> Result<Option<BranchRow>, sqlx::Error> {
    sqlx::query_as::<_, BranchRow>("SELECT id, name, is_active FROM branches WHERE id = ? LIMIT 1")
        .bind(branch_id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_active_barbers(
    pool: &SqlitePool,
    branch_id: &str,
) -> Result<Vec<BarberRow>, sqlx::Error> {
    sqlx::query_as::<_, BarberRow>(
        r#"SELECT id, branch_id, full_name, is_active
           FROM barbers
           WHERE branch_id = ? AND is_active = 1
           ORDER BY full_name, id"#,
    )
    .bind(branch_id)
    .fetch_all(pool)
    .await
}

/// Walk-ins for a branch created inside `[start_ms, end_ms]`.
pub async fn fetch_walk_ins(
    pool: &SqlitePool,
    branch_id: &str,
    start_ms: i64,
    end_ms: i64,
) -> Result<Vec<WalkInRow>, sqlx::Error> {
    sqlx::query_as::<_, WalkInRow>(
        r#"SELECT id, branch_id, barber_id, queue_number, name, phone, service_id,
                  scheduled_time, start_time, notes, status, created_at
           FROM walk_ins
           WHERE branch_id = ? AND created_at >= ? AND created_at <= ?"#,
    )
    .bind(branch_id)
    .bind(start_ms)
    .bind(end_ms)
    .fetch_all(pool)
    .await
}

pub async fn fetch_bookings(
    pool: &SqlitePool,
    branch_id: &str,
    date: &str,
) -> Result<Vec<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>(
        r#"SELECT id, booking_code, branch_id, customer_id, customer_name, customer_phone,
                  customer_email, service_id, barber_id, date, time, status, price, created_at
           FROM bookings
           WHERE branch_id = ? AND date = ?"#,
    )
    .bind(branch_id)
    .bind(date)
    .fetch_all(pool)
    .await
}

pub async fn fetch_service(pool: &SqlitePool, service_id: &str) -> Result<Option<ServiceRow>, sqlx::Error> {
    sqlx::query_as::<_, ServiceRow>(
        "SELECT id, name, duration_minutes, price FROM services WHERE id = ? LIMIT 1",
    )
    .bind(service_id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_customer(pool: &SqlitePool, customer_id: &str) -> Result<Option<CustomerRow>, sqlx::Error> {
    sqlx::query_as::<_, CustomerRow>(
        "SELECT id, full_name, current_tier_id FROM customers WHERE id = ? LIMIT 1",
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_tier(pool: &SqlitePool, tier_id: &str) -> Result<Option<TierRow>, sqlx::Error> {
    sqlx::query_as::<_, TierRow>(
        "SELECT id, name, icon, color, display_order FROM tiers WHERE id = ? LIMIT 1",
    )
    .bind(tier_id)
    .fetch_optional(pool)
    .await
}

/// Lifetime earned points in ledger storage units (points × 100).
pub async fn fetch_lifetime_earned(pool: &SqlitePool, customer_id: &str) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT lifetime_earned FROM points_ledger WHERE user_id = ? LIMIT 1")
        .bind(customer_id)
        .fetch_optional(pool)
        .await
}
