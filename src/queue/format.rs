//! Small display helpers shared by the composer and the live board.

use chrono::{NaiveTime, Timelike};

const BARBER_PALETTE: [&str; 8] = [
    "bg-blue-500",
    "bg-purple-500",
    "bg-green-500",
    "bg-pink-500",
    "bg-orange-500",
    "bg-teal-500",
    "bg-red-500",
    "bg-indigo-500",
];

/// Parses "HH:MM" (or "HH:MM:SS") into minutes since midnight.
pub fn minutes_of_day(value: &str) -> Option<u32> {
    let value = value.trim();
    let time = NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()?;
    Some(time.hour() * 60 + time.minute())
}

pub fn clock_time(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// "14:05" style minutes rendered as "2:05 PM".
pub fn display_time(minutes: u32) -> String {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
        .map(|time| time.format("%-I:%M %p").to_string())
        .unwrap_or_else(|| clock_time(minutes))
}

/// Front desk staff type "Service: Fade" into walk-in notes.
pub fn service_from_notes(notes: &str) -> Option<String> {
    let (_, rest) = notes.split_once("Service:")?;
    let name = rest
        .split(|c| c == '\n' || c == ',')
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

pub fn initials(full_name: &str) -> String {
    full_name
        .split_whitespace()
        .filter_map(|part| part.chars().next())
        .take(2)
        .collect::<String>()
        .to_uppercase()
}

pub fn first_name(full_name: &str) -> String {
    full_name
        .split_whitespace()
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| "Customer".to_string())
}

/// Stable palette slot for a barber id.
pub fn barber_color(barber_id: &str) -> &'static str {
    let hash = barber_id.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    BARBER_PALETTE[hash.unsigned_abs() as usize % BARBER_PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clock_strings() {
        assert_eq!(minutes_of_day("14:00"), Some(840));
        assert_eq!(minutes_of_day("09:05:30"), Some(545));
        assert_eq!(minutes_of_day(" 7:30 "), Some(450));
        assert_eq!(minutes_of_day("25:00"), None);
        assert_eq!(minutes_of_day("soon"), None);
        assert_eq!(minutes_of_day(""), None);
    }

    #[test]
    fn formats_times() {
        assert_eq!(clock_time(545), "09:05");
        assert_eq!(display_time(840), "2:00 PM");
        assert_eq!(display_time(5), "12:05 AM");
    }

    #[test]
    fn notes_service_pattern() {
        assert_eq!(
            service_from_notes("VIP\nService: Skin Fade, extra towel").as_deref(),
            Some("Skin Fade")
        );
        assert_eq!(service_from_notes("Service:   "), None);
        assert_eq!(service_from_notes("no pattern here"), None);
    }

    #[test]
    fn names() {
        assert_eq!(initials("ramon de la cruz"), "RD");
        assert_eq!(first_name("Maria Clara Santos"), "Maria");
        assert_eq!(first_name("   "), "Customer");
    }

    #[test]
    fn barber_color_is_stable() {
        let color = barber_color("barber-123");
        assert_eq!(color, barber_color("barber-123"));
        assert!(BARBER_PALETTE.contains(&color));
    }
}
