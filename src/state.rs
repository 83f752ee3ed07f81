use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

pub const EVENT_QUEUE_CHANGED: &str = "queue_changed";

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub events: broadcast::Sender<QueueEvent>,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        let (events, _) = broadcast::channel(64);
        Self { db, events }
    }

    /// Nobody listening is fine; the board re-fetches on reconnect.
    pub fn notify_queue_changed(&self, branch_id: &str) {
        let _ = self.events.send(QueueEvent {
            kind: EVENT_QUEUE_CHANGED.to_string(),
            branch_id: branch_id.to_string(),
        });
    }
}

/// Carries no customer data; it only tells a board to re-fetch.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEvent {
    pub kind: String,
    pub branch_id: String,
}
