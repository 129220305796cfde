use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use tracing::warn;

/// Fixed wall-clock offset of the clinic site. Applied to timestamps on
/// the way out to a presentation layer only; stored values stay UTC.
pub const SITE_OFFSET_HOURS: i64 = 3;

/// Canonical stored form: RFC 3339 UTC with fixed microsecond width, so
/// lexicographic ordering in SQLite matches chronological ordering.
pub fn to_ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now_ts() -> String {
    to_ts(Utc::now())
}

/// Parse a stored timestamp. Rows written by this server are RFC 3339;
/// SQLite's own `datetime('now')` format is accepted as a fallback.
pub fn parse_ts(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

fn site_local(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt + Duration::hours(SITE_OFFSET_HOURS)
}

/// Full display form for message and task timestamps.
pub fn display_full(dt: DateTime<Utc>) -> String {
    site_local(dt).format("%H:%M %d.%m.%Y").to_string()
}

/// Short clock-only form used in unread summaries.
pub fn display_clock(dt: DateTime<Utc>) -> String {
    site_local(dt).format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_and_sqlite_formats() {
        let want = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(parse_ts("2026-03-14T09:26:53Z"), want);
        assert_eq!(parse_ts("2026-03-14 09:26:53"), want);
    }

    #[test]
    fn display_applies_site_offset() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 14, 22, 30, 0).unwrap();
        // 22:30 UTC + 3h rolls over to the next day
        assert_eq!(display_full(dt), "01:30 15.03.2026");
        assert_eq!(display_clock(dt), "01:30");
    }
}
