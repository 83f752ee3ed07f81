use std::collections::{BTreeMap, HashMap, HashSet};

use super::{format, BarberQueue, BarberStats, QueueEntry, QueueStats, TimeConflict};
use crate::models::{BarberRow, STATUS_ACTIVE, STATUS_COMPLETED, STATUS_WAITING};

pub const BARBER_AVAILABLE: &str = "available";
pub const BARBER_BUSY: &str = "busy";

/// Same-minute clashes among one barber's entries, earliest slot first.
pub(crate) fn detect_conflicts(entries: &[&QueueEntry]) -> Vec<TimeConflict> {
    let mut slots: BTreeMap<u32, Vec<&QueueEntry>> = BTreeMap::new();
    for entry in entries {
        if let Some(minutes) = entry.minutes() {
            slots.entry(minutes).or_default().push(entry);
        }
    }

    slots
        .into_iter()
        .filter(|(_, slot)| slot.len() > 1)
        .map(|(minutes, slot)| TimeConflict {
            time: format::clock_time(minutes),
            count: slot.len(),
            entry_ids: slot.iter().map(|entry| entry.id.clone()).collect(),
        })
        .collect()
}

fn barber_stats<'a>(entries: impl IntoIterator<Item = &'a QueueEntry>) -> BarberStats {
    entries
        .into_iter()
        .fold(BarberStats::default(), |mut stats, entry| {
            stats.total += 1;
            match entry.status.as_str() {
                STATUS_ACTIVE => stats.active += 1,
                STATUS_WAITING => stats.waiting += 1,
                STATUS_COMPLETED => stats.completed += 1,
                _ => {}
            }
            if entry.is_walk_in() {
                stats.walk_ins += 1;
            } else {
                stats.signed_in += 1;
            }
            stats
        })
}

/// Splits the sorted line per barber and flags conflicting entries in place,
/// so the flat list and the groups agree. Unassigned entries stay flat only.
pub(crate) fn group_by_barber(barbers: &[BarberRow], entries: &mut [QueueEntry]) -> Vec<BarberQueue> {
    let mut conflicted: HashSet<String> = HashSet::new();
    let mut conflicts_by_barber: HashMap<&str, Vec<TimeConflict>> = HashMap::new();

    for barber in barbers {
        let assigned: Vec<&QueueEntry> = entries
            .iter()
            .filter(|entry| entry.is_assigned_to(&barber.id))
            .collect();
        let conflicts = detect_conflicts(&assigned);
        for conflict in &conflicts {
            conflicted.extend(conflict.entry_ids.iter().cloned());
        }
        conflicts_by_barber.insert(barber.id.as_str(), conflicts);
    }

    for entry in entries.iter_mut() {
        entry.has_time_conflict = conflicted.contains(&entry.id);
    }

    barbers
        .iter()
        .map(|barber| {
            let customers: Vec<QueueEntry> = entries
                .iter()
                .filter(|entry| entry.is_assigned_to(&barber.id))
                .cloned()
                .collect();
            let stats = barber_stats(&customers);
            let barber_status = if stats.active > 0 {
                BARBER_BUSY
            } else {
                BARBER_AVAILABLE
            };
            BarberQueue {
                barber_id: barber.id.clone(),
                barber_name: barber.full_name.clone(),
                barber_avatar: format::initials(&barber.full_name),
                barber_color: format::barber_color(&barber.id).to_string(),
                barber_status: barber_status.to_string(),
                customers,
                stats,
                conflicts: conflicts_by_barber
                    .remove(barber.id.as_str())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

pub(crate) fn branch_stats(
    entries: &[QueueEntry],
    barbers: &[BarberRow],
    groups: &[BarberQueue],
) -> QueueStats {
    let totals = barber_stats(entries);
    QueueStats {
        total_customers: totals.total,
        total_signed_in: totals.signed_in,
        total_walk_ins: totals.walk_ins,
        active: totals.active,
        waiting: totals.waiting,
        completed: totals.completed,
        total_barbers: barbers.len(),
        available_barbers: groups
            .iter()
            .filter(|group| group.barber_status == BARBER_AVAILABLE)
            .count(),
    }
}
