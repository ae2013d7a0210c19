use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Midnight (00:00:00.000 UTC) of the day containing `dt`.
pub fn start_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Last millisecond (23:59:59.999 UTC) of the day containing `dt`.
pub fn end_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    // Time-of-day arithmetic wraps instead of overflowing, even on the last
    // representable date
    let last_millisecond = NaiveTime::MIN + (Duration::days(1) - Duration::milliseconds(1));
    dt.date_naive().and_time(last_millisecond).and_utc()
}

/// Parse a calendar date (`YYYY-MM-DD`) or an RFC 3339 timestamp.
/// Bare dates resolve to midnight UTC.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}
