use std::cmp::Ordering;

use super::QueueEntry;

/// A walk-in timed at most this many minutes before a booking is served ahead of it.
pub(crate) const INSERTION_WINDOW_MINUTES: u32 = 60;

pub(crate) fn sort_entries(entries: &mut [QueueEntry]) {
    entries.sort_by(compare_entries);
}

/// Total order over queue entries. Timed entries come first by minute of
/// day; untimed ones sink and follow queue number, then arrival.
pub(crate) fn compare_entries(a: &QueueEntry, b: &QueueEntry) -> Ordering {
    let ordering = match (a.minutes(), b.minutes()) {
        (None, None) => compare_untimed(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(x), Some(y)) if x == y => tie_rank(a)
            .cmp(&tie_rank(b))
            .then(a.created_at.cmp(&b.created_at)),
        (Some(x), Some(y)) => walk_in_insertion(a, x, b, y).unwrap_or_else(|| x.cmp(&y)),
    };
    ordering.then_with(|| a.id.cmp(&b.id))
}

fn compare_untimed(a: &QueueEntry, b: &QueueEntry) -> Ordering {
    match (a.queue_number(), b.queue_number()) {
        (Some(x), Some(y)) => x.cmp(&y).then(a.created_at.cmp(&b.created_at)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.created_at.cmp(&b.created_at),
    }
}

/// Same-minute priority: linked bookings, then guest bookings, then walk-ins.
fn tie_rank(entry: &QueueEntry) -> u8 {
    match (entry.is_walk_in(), entry.has_account) {
        (false, true) => 0,
        (false, false) => 1,
        (true, _) => 2,
    }
}

fn walk_in_insertion(a: &QueueEntry, x: u32, b: &QueueEntry, y: u32) -> Option<Ordering> {
    if a.is_walk_in() && !b.is_walk_in() && within_window(x, y) {
        return Some(Ordering::Less);
    }
    if b.is_walk_in() && !a.is_walk_in() && within_window(y, x) {
        return Some(Ordering::Greater);
    }
    None
}

fn within_window(walk_in: u32, booking: u32) -> bool {
    booking > walk_in && booking - walk_in <= INSERTION_WINDOW_MINUTES
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::queue::{format::minutes_of_day, EntrySource, ServiceInfo};

    fn service() -> ServiceInfo {
        ServiceInfo {
            name: "Cut".into(),
            duration_minutes: 30,
            price: 0.0,
        }
    }

    pub(crate) fn walk_in(id: &str, time: Option<&str>, queue_number: i64, created_at: i64) -> QueueEntry {
        QueueEntry::new(
            id.into(),
            format!("Walk {id}"),
            Some("0917".into()),
            service(),
            time.and_then(minutes_of_day),
            "waiting".into(),
            Some("r1".into()),
            created_at,
            EntrySource::Walkin { queue_number },
        )
    }

    pub(crate) fn booking(id: &str, time: &str, customer: Option<&str>, created_at: i64) -> QueueEntry {
        QueueEntry::new(
            id.into(),
            format!("Book {id}"),
            None,
            service(),
            minutes_of_day(time),
            "confirmed".into(),
            Some("r1".into()),
            created_at,
            EntrySource::Booking {
                booking_code: format!("BK-{id}"),
                customer_id: customer.map(str::to_string),
                tier: None,
                lifetime_points: None,
            },
        )
    }

    fn sorted_ids(mut entries: Vec<QueueEntry>) -> Vec<String> {
        sort_entries(&mut entries);
        entries.into_iter().map(|entry| entry.id).collect()
    }

    #[test]
    fn booking_wins_a_same_minute_tie() {
        let ids = sorted_ids(vec![
            walk_in("w", Some("14:00"), 1, 10),
            booking("b", "14:00", None, 20),
        ]);
        assert_eq!(ids, ["b", "w"]);
    }

    #[test]
    fn linked_booking_beats_guest_booking_at_same_minute() {
        let ids = sorted_ids(vec![
            booking("guest", "11:00", None, 1),
            booking("member", "11:00", Some("c1"), 5),
            booking("member-late", "11:00", Some("c2"), 9),
        ]);
        assert_eq!(ids, ["member", "member-late", "guest"]);
    }

    #[test]
    fn walk_in_within_the_hour_goes_right_before_the_booking() {
        let ids = sorted_ids(vec![
            booking("b", "14:00", Some("c1"), 1),
            walk_in("w", Some("13:10"), 3, 2),
            booking("early", "09:00", None, 3),
        ]);
        assert_eq!(ids, ["early", "w", "b"]);

        let w = walk_in("w", Some("13:10"), 3, 2);
        let b = booking("b", "14:00", Some("c1"), 1);
        assert_eq!(compare_entries(&w, &b), Ordering::Less);
        assert_eq!(compare_entries(&b, &w), Ordering::Greater);
        assert!(within_window(13 * 60 + 10, 14 * 60));
        assert!(within_window(13 * 60, 14 * 60));
    }

    #[test]
    fn walk_in_two_hours_early_sorts_by_clock_only() {
        assert!(!within_window(12 * 60, 14 * 60));
        let ids = sorted_ids(vec![
            booking("b", "14:00", None, 1),
            booking("mid", "13:00", None, 2),
            walk_in("w", Some("12:00"), 1, 3),
        ]);
        assert_eq!(ids, ["w", "mid", "b"]);
    }

    #[test]
    fn untimed_entries_sink_by_queue_number() {
        let ids = sorted_ids(vec![
            walk_in("q3", None, 3, 1),
            walk_in("q1", None, 1, 9),
            booking("late", "18:30", None, 50),
            walk_in("q2", None, 2, 5),
            walk_in("timed", Some("08:00"), 7, 100),
        ]);
        assert_eq!(ids, ["timed", "late", "q1", "q2", "q3"]);
    }

    #[test]
    fn order_does_not_depend_on_input_order() {
        let entries = vec![
            walk_in("w1", Some("10:00"), 1, 1),
            booking("b1", "10:00", None, 2),
            walk_in("w2", None, 2, 3),
            booking("b2", "10:30", Some("c"), 4),
            walk_in("w3", Some("10:20"), 3, 5),
        ];
        let mut reversed = entries.clone();
        reversed.reverse();
        assert_eq!(sorted_ids(entries), sorted_ids(reversed));
    }
}
