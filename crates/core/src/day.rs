#![forbid(unsafe_code)]

use time::{Date, OffsetDateTime, UtcOffset};

pub fn now_ms() -> i64 {
    let now = match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

pub fn offset_from_minutes(minutes: i32) -> Option<UtcOffset> {
    UtcOffset::from_whole_seconds(minutes.checked_mul(60)?).ok()
}

/// Calendar day of an epoch-ms timestamp as seen from `offset`.
pub fn calendar_day(ts_ms: i64, offset: UtcOffset) -> Option<Date> {
    let nanos = i128::from(ts_ms).checked_mul(1_000_000)?;
    let utc = OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?;
    Some(utc.to_offset(offset).date())
}

pub fn same_calendar_day(a_ms: i64, b_ms: i64, offset: UtcOffset) -> bool {
    match (calendar_day(a_ms, offset), calendar_day(b_ms, offset)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

pub fn iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;

    #[test]
    fn same_day_respects_offset() {
        // 2026-10-16T23:30:00Z
        let late_utc = 1_792_193_400_000;
        let next_morning_utc = late_utc + 60 * 60 * 1000;
        assert!(!same_calendar_day(late_utc, next_morning_utc, UtcOffset::UTC));

        let minus_three = offset_from_minutes(-180).expect("offset");
        assert!(same_calendar_day(late_utc, next_morning_utc, minus_three));
    }

    #[test]
    fn iso_date_is_zero_padded() {
        let day = calendar_day(0, UtcOffset::UTC).expect("epoch day");
        assert_eq!(iso_date(day), "1970-01-01");
        let day = calendar_day(40 * DAY_MS, UtcOffset::UTC).expect("day 40");
        assert_eq!(iso_date(day), "1970-02-10");
    }
}
