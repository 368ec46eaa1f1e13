//! Local time handling, date parsing and the weekly schedule generator

use chrono::{
    Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc,
    Weekday,
};

pub const DATETIME_INPUT_FORMAT: &str = "%d.%m.%Y %H:%M";
pub const DATE_INPUT_FORMAT: &str = "%d.%m.%Y";
pub const TIME_INPUT_FORMAT: &str = "%H:%M";

/// Fixed offset for the configured local timezone
pub fn local_offset(offset_hours: i32) -> FixedOffset {
    FixedOffset::east_opt(offset_hours * 3600).unwrap_or_else(|| Utc.fix())
}

/// Current wall-clock time in the tutor's timezone
pub fn now_local(offset_hours: i32) -> NaiveDateTime {
    Utc::now().with_timezone(&local_offset(offset_hours)).naive_local()
}

/// Parse a lesson date typed as `DD.MM.YYYY HH:MM`
pub fn parse_lesson_datetime(input: &str) -> Result<NaiveDateTime, &'static str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("empty");
    }

    NaiveDateTime::parse_from_str(trimmed, DATETIME_INPUT_FORMAT).map_err(|_| "invalid_format")
}

/// Parse a deadline typed as `DD.MM.YYYY`; the deadline is the end of that day
pub fn parse_deadline(input: &str) -> Result<NaiveDateTime, &'static str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("empty");
    }

    let date = NaiveDate::parse_from_str(trimmed, DATE_INPUT_FORMAT).map_err(|_| "invalid_format")?;
    date.and_hms_opt(23, 59, 0).ok_or("invalid_format")
}

/// Parse a time of day typed as `HH:MM`
pub fn parse_time(input: &str) -> Result<NaiveTime, &'static str> {
    NaiveTime::parse_from_str(input.trim(), TIME_INPUT_FORMAT).map_err(|_| "invalid_format")
}

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_INPUT_FORMAT).to_string()
}

pub fn format_date(dt: &NaiveDateTime) -> String {
    dt.format(DATE_INPUT_FORMAT).to_string()
}

/// Weekday encoded as 0 (Monday) ..= 6 (Sunday) for callback data
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn weekday_index(day: Weekday) -> u8 {
    day.num_days_from_monday() as u8
}

/// Every lesson slot on the chosen weekdays within `weeks` weeks from `now`.
///
/// Slots at or before `now` are skipped. The result is sorted by date.
pub fn weekly_occurrences(
    days: &[Weekday],
    time: NaiveTime,
    now: NaiveDateTime,
    weeks: u32,
) -> Vec<NaiveDateTime> {
    let start = now.date();
    let total_days = i64::from(weeks) * 7;

    (0..total_days)
        .map(|offset| start + Duration::days(offset))
        .filter(|date| days.contains(&date.weekday()))
        .map(|date| date.and_time(time))
        .filter(|slot| *slot > now)
        .collect()
}

/// Start (inclusive) and end (exclusive) of the month `months_back` months before `today`
pub fn month_bounds(today: NaiveDate, months_back: u32) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let first_of_current = today.with_day(1)?;
    let start = first_of_current.checked_sub_months(Months::new(months_back))?;
    let end = start.checked_add_months(Months::new(1))?;
    Some((start.and_hms_opt(0, 0, 0)?, end.and_hms_opt(0, 0, 0)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_lesson_datetime() {
        assert_eq!(
            parse_lesson_datetime(" 05.03.2025 16:30 ").unwrap(),
            dt(2025, 3, 5, 16, 30)
        );
        assert_eq!(parse_lesson_datetime(""), Err("empty"));
        assert_eq!(parse_lesson_datetime("2025-03-05 16:30"), Err("invalid_format"));
        assert_eq!(parse_lesson_datetime("31.02.2025 10:00"), Err("invalid_format"));
    }

    #[test]
    fn test_parse_deadline_is_end_of_day() {
        assert_eq!(parse_deadline("10.10.2025").unwrap(), dt(2025, 10, 10, 23, 59));
        assert_eq!(parse_deadline("10/10/2025"), Err("invalid_format"));
    }

    #[test]
    fn test_weekly_occurrences_skips_past_slots() {
        // Wednesday 2025-03-05 at 12:00
        let now = dt(2025, 3, 5, 12, 0);
        let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let slots = weekly_occurrences(&[Weekday::Mon, Weekday::Wed], time, now, 4);

        // Today's 10:00 is already past, so the first slot is next Monday
        assert_eq!(slots.first(), Some(&dt(2025, 3, 10, 10, 0)));
        assert_eq!(slots.len(), 7);
        assert!(slots.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_weekly_occurrences_includes_later_today() {
        let now = dt(2025, 3, 5, 9, 0);
        let time = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        let slots = weekly_occurrences(&[Weekday::Wed], time, now, 2);
        assert_eq!(slots, vec![dt(2025, 3, 5, 18, 0), dt(2025, 3, 12, 18, 0)]);
    }

    #[test]
    fn test_month_bounds() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        assert_eq!(
            month_bounds(today, 0),
            Some((dt(2025, 1, 1, 0, 0), dt(2025, 2, 1, 0, 0)))
        );
        assert_eq!(
            month_bounds(today, 2),
            Some((dt(2024, 11, 1, 0, 0), dt(2024, 12, 1, 0, 0)))
        );
    }

    #[test]
    fn test_weekday_index_roundtrip() {
        for index in 0..7 {
            let day = weekday_from_index(index).unwrap();
            assert_eq!(weekday_index(day), index);
        }
        assert!(weekday_from_index(7).is_none());
    }
}
