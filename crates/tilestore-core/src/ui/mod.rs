//! ============================================================================
//! UI Logic - the view-model behind each screen
//! ============================================================================
//! - forms:        inline validation, request never sent on failure
//! - selection:    wishlist -> reservation dialog
//! - reservations: state badges, cancel/review actions, reload-after-mutate
//! - inventory:    availability badge
//! ============================================================================

pub mod forms;
pub mod inventory;
pub mod reservations;
pub mod selection;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Parse a server timestamp: RFC 3339, or naive ISO (assumed UTC)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Display form used across list views; unparseable input is shown as-is
pub fn format_timestamp(raw: Option<&str>) -> String {
    match raw {
        Some(s) => parse_timestamp(s)
            .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| s.to_string()),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2026-03-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-01T14:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-01T12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-01T12:30:00.123456").map(|d| d.timestamp()), Some(expected.timestamp()));
        assert_eq!(parse_timestamp("ayer"), None);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(Some("2026-03-01T12:30:00Z")), "2026-03-01 12:30 UTC");
        assert_eq!(format_timestamp(Some("pronto")), "pronto");
        assert_eq!(format_timestamp(None), "-");
    }
}
