pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STAFF: &str = "staff";

pub const STATUS_WAITING: &str = "waiting";
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";

/// Completed and cancelled records no longer occupy a chair or a slot.
pub fn is_closed_status(status: &str) -> bool {
    status == STATUS_COMPLETED || status == STATUS_CANCELLED
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StaffUserRow {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub password_hash: String,
    pub active: i64,
    pub created_at: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BranchRow {
    pub id: String,
    pub name: String,
    pub is_active: i64,
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BarberRow {
    pub id: String,
    pub branch_id: String,
    pub full_name: String,
    pub is_active: i64,
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: String,
    pub name: String,
    pub duration_minutes: i64,
    pub price: f64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TierRow {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub display_order: i64,
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: String,
    pub full_name: String,
    pub current_tier_id: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WalkInRow {
    pub id: String,
    pub branch_id: String,
    pub barber_id: Option<String>,
    pub queue_number: i64,
    pub name: String,
    pub phone: String,
    pub service_id: Option<String>,
    pub scheduled_time: Option<String>,
    pub start_time: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookingRow {
    pub id: String,
    pub booking_code: String,
    pub branch_id: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub service_id: String,
    pub barber_id: Option<String>,
    pub date: String,
    pub time: String,
    pub status: String,
    pub price: f64,
    pub created_at: i64,
}
