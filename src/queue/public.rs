//! Waiting-room projection of the queue. Only first names, services, times
//! and statuses leave this module; phones, surnames, account links, loyalty
//! data and creation stamps are dropped here.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::SqlitePool;

use super::{compose_queue, format, BarberQueue, ComposedQueue, EntrySource, QueueEntry};
use crate::error::AppError;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicEntry {
    pub id: String,
    /// 1-based place in the barber's visible line.
    pub position: Option<usize>,
    pub first_name: String,
    pub service: String,
    pub time: Option<String>,
    pub start_time: Option<String>,
    pub status: String,
    pub barber_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub queue_number: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicBarberQueue {
    pub barber_id: String,
    pub barber_name: String,
    pub barber_avatar: String,
    pub barber_color: String,
    pub barber_status: String,
    pub customers: Vec<PublicEntry>,
    pub waiting: usize,
    pub active: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStats {
    pub total_customers: usize,
    pub active: usize,
    pub waiting: usize,
    pub total_barbers: usize,
    pub available_barbers: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQueue {
    pub branch_id: String,
    pub branch_name: String,
    pub date: String,
    pub queue_by_barber: Vec<PublicBarberQueue>,
    pub customers: Vec<PublicEntry>,
    pub stats: PublicStats,
}

pub async fn public_queue(pool: &SqlitePool, branch_id: &str) -> Result<PublicQueue, AppError> {
    Ok(sanitize(compose_queue(pool, branch_id, None).await?))
}

fn public_entry(entry: &QueueEntry, position: Option<usize>) -> PublicEntry {
    let kind = match entry.source {
        EntrySource::Walkin { .. } => "walkin",
        EntrySource::Booking { .. } => "booking",
    };
    PublicEntry {
        id: entry.id.clone(),
        position,
        first_name: format::first_name(&entry.name),
        service: entry.service.name.clone(),
        time: entry.time.clone(),
        start_time: entry.start_time.clone(),
        status: entry.status.clone(),
        barber_id: entry.barber_id.clone(),
        kind,
        queue_number: entry.queue_number(),
    }
}

fn public_barber(group: &BarberQueue, positions: &mut HashMap<String, usize>) -> PublicBarberQueue {
    let customers: Vec<PublicEntry> = group
        .customers
        .iter()
        .filter(|entry| entry.is_visible())
        .enumerate()
        .map(|(index, entry)| {
            positions.insert(entry.id.clone(), index + 1);
            public_entry(entry, Some(index + 1))
        })
        .collect();

    PublicBarberQueue {
        barber_id: group.barber_id.clone(),
        barber_name: group.barber_name.clone(),
        barber_avatar: group.barber_avatar.clone(),
        barber_color: group.barber_color.clone(),
        barber_status: group.barber_status.clone(),
        waiting: group.stats.waiting,
        active: group.stats.active,
        customers,
    }
}

/// Completed and cancelled entries are not shown.
pub fn sanitize(queue: ComposedQueue) -> PublicQueue {
    let mut positions = HashMap::new();
    let queue_by_barber: Vec<PublicBarberQueue> = queue
        .queue_by_barber
        .iter()
        .map(|group| public_barber(group, &mut positions))
        .collect();

    let customers: Vec<PublicEntry> = queue
        .all_customers
        .iter()
        .filter(|entry| entry.is_visible())
        .map(|entry| public_entry(entry, positions.get(&entry.id).copied()))
        .collect();

    let stats = PublicStats {
        total_customers: customers.len(),
        active: queue.stats.active,
        waiting: queue.stats.waiting,
        total_barbers: queue.stats.total_barbers,
        available_barbers: queue.stats.available_barbers,
    };

    PublicQueue {
        branch_id: queue.branch_id,
        branch_name: queue.branch_name,
        date: queue.date,
        queue_by_barber,
        customers,
        stats,
    }
}
