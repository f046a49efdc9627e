//! Date utilities for daily reset hour handling.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, Timelike};

/// Study day of a local wall-clock time.
///
/// Before `daily_reset_hour` the study day is still the previous calendar day,
/// so late-night sessions count towards the day they started in.
pub fn adjusted_date(now: NaiveDateTime, daily_reset_hour: u32) -> NaiveDate {
    if now.hour() < daily_reset_hour {
        (now - Duration::days(1)).date()
    } else {
        now.date()
    }
}

/// Adjusted "today" in the server's local time zone.
pub fn local_today(daily_reset_hour: u32) -> NaiveDate {
    adjusted_date(Local::now().naive_local(), daily_reset_hour)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_midnight_reset() {
        assert_eq!(adjusted_date(at(5, 0), 0), at(5, 0).date());
        assert_eq!(adjusted_date(at(5, 23), 0), at(5, 0).date());
    }

    #[test]
    fn test_before_reset_hour_is_previous_day() {
        assert_eq!(adjusted_date(at(5, 3), 4), at(4, 0).date());
        assert_eq!(adjusted_date(at(5, 4), 4), at(5, 0).date());
    }

    #[test]
    fn test_month_boundary() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();
        assert_eq!(
            adjusted_date(now, 4),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_local_today_with_midnight_reset() {
        assert_eq!(local_today(0), Local::now().date_naive());
    }
}
