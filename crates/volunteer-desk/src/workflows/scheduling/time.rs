//! Tolerant time-of-day parsing for appointment slots.
//!
//! Staff type times as `"9h00"`, `"09:00"`, `"900"` or `"9h"`. Everything is
//! reduced to minutes since midnight; anything that does not describe a valid
//! time of day yields `None` so callers can file it under "unscheduled".

/// Minutes since midnight for a free-text time, if it is one.
pub fn parse_minutes(text: &str) -> Option<u16> {
    let cleaned: String = text
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| if ch == 'h' || ch == 'H' { ':' } else { ch })
        .filter(|ch| ch.is_ascii_digit() || *ch == ':')
        .collect();

    // Only hours and minutes count; seconds in `HH:MM:SS` are dropped.
    let (hours, minutes) = match cleaned.split_once(':') {
        Some((hours, rest)) => (hours, rest.split(':').next().unwrap_or("")),
        None if (3..=4).contains(&cleaned.len()) => cleaned.split_at(cleaned.len() - 2),
        None => (cleaned.as_str(), ""),
    };

    let hours: u16 = hours.parse().ok()?;
    let minutes: u16 = if minutes.is_empty() {
        0
    } else {
        minutes.parse().ok()?
    };

    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Canonical `HH:MM` rendering.
pub fn normalize_time(text: &str) -> Option<String> {
    parse_minutes(text).map(format_minutes)
}

/// Minutes since midnight for an already canonical `HH:MM` value.
pub fn time_to_minutes(time: &str) -> Option<u16> {
    parse_minutes(time)
}

pub fn format_minutes(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_spellings_normalize_to_the_same_slot() {
        for input in ["9h00", "09:00", "900", "9h", " 09 h 00 ", "9"] {
            assert_eq!(normalize_time(input).as_deref(), Some("09:00"), "{input}");
        }
        assert_eq!(normalize_time("1430").as_deref(), Some("14:30"));
        assert_eq!(normalize_time("14h5").as_deref(), Some("14:05"));
    }

    #[test]
    fn seconds_are_ignored() {
        assert_eq!(normalize_time("09:00:00").as_deref(), Some("09:00"));
        assert_eq!(normalize_time("14:30:00").as_deref(), Some("14:30"));
        assert_eq!(normalize_time("14:30:99").as_deref(), Some("14:30"));
    }

    #[test]
    fn canonical_times_convert_to_minutes() {
        assert_eq!(time_to_minutes("09:00"), Some(540));
        assert_eq!(time_to_minutes("00:00"), Some(0));
        assert_eq!(time_to_minutes("23:59"), Some(1439));
    }

    #[test]
    fn unparseable_times_have_no_value() {
        for input in ["", "matin", "25:00", "12:75", "h", "12345"] {
            assert_eq!(parse_minutes(input), None, "{input}");
        }
    }

    #[test]
    fn round_trip_over_every_minute() {
        for minutes in 0..24 * 60 {
            let text = format_minutes(minutes);
            assert_eq!(time_to_minutes(&text), Some(minutes));
            assert_eq!(normalize_time(&text), Some(text));
        }
    }
}
