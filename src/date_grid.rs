use chrono::{Datelike, Duration, Local, NaiveDate};

pub const DAYS_PER_WEEK: i64 = 7;

/// First calendar day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Partitions the month into full Monday-start weeks. The first and last rows
/// spill into the neighbouring months so every row holds exactly seven days.
pub fn weeks_in_month(date: NaiveDate) -> Vec<[NaiveDate; 7]> {
    let last = month_end(date);
    let mut weeks = Vec::with_capacity(6);
    let mut start = week_start(month_start(date));
    while start <= last {
        let mut week = [start; 7];
        for (offset, day) in week.iter_mut().enumerate() {
            *day = start + Duration::days(offset as i64);
        }
        weeks.push(week);
        start += Duration::days(DAYS_PER_WEEK);
    }
    weeks
}

/// Every calendar day of the month containing `date`, in ascending order.
pub fn days_in_month(date: NaiveDate) -> Vec<NaiveDate> {
    days_between(month_start(date), month_end(date))
}

/// Inclusive day range; empty when `start > end`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|day| *day <= end).collect()
}

/// ISO weekday number: Monday = 1 ... Sunday = 7.
pub fn day_label(date: NaiveDate) -> u32 {
    date.weekday().number_from_monday()
}

pub fn is_today(date: NaiveDate) -> bool {
    is_today_at(Local::now().date_naive(), date)
}

pub fn is_today_at(today: NaiveDate, date: NaiveDate) -> bool {
    today == date
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Canonical `YYYY-MM-DD` key used for every day-level join.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Accepts `YYYY-MM` (first of the month) or a full `YYYY-MM-DD`.
pub fn parse_month(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    parse_date(value).or_else(|| NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn month_bounds_handle_leap_years_and_december() {
        assert_eq!(month_start(ymd(2024, 2, 17)), ymd(2024, 2, 1));
        assert_eq!(month_end(ymd(2024, 2, 17)), ymd(2024, 2, 29));
        assert_eq!(month_end(ymd(2025, 2, 1)), ymd(2025, 2, 28));
        assert_eq!(month_end(ymd(2025, 12, 9)), ymd(2025, 12, 31));
    }

    #[test]
    fn weeks_are_full_and_start_on_monday() {
        // January 2026 starts on a Thursday and ends on a Saturday.
        let weeks = weeks_in_month(ymd(2026, 1, 15));
        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[0][0], ymd(2025, 12, 29));
        assert_eq!(weeks[4][6], ymd(2026, 2, 1));
        for week in &weeks {
            assert_eq!(day_label(week[0]), 1);
            assert_eq!(day_label(week[6]), 7);
        }
    }

    #[test]
    fn month_starting_on_monday_has_no_leading_spill() {
        // June 2026 starts on a Monday and ends on a Tuesday.
        let weeks = weeks_in_month(ymd(2026, 6, 3));
        assert_eq!(weeks[0][0], ymd(2026, 6, 1));
        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[4][0], ymd(2026, 6, 29));
    }

    #[test]
    fn day_label_uses_iso_numbering() {
        assert_eq!(day_label(ymd(2026, 1, 5)), 1);
        assert_eq!(day_label(ymd(2026, 1, 11)), 7);
    }

    #[test]
    fn parse_month_accepts_both_forms() {
        assert_eq!(parse_month("2026-01"), Some(ymd(2026, 1, 1)));
        assert_eq!(parse_month("2026-01-16"), Some(ymd(2026, 1, 16)));
        assert_eq!(parse_month("January"), None);
        assert_eq!(format_date(ymd(2026, 3, 4)), "2026-03-04");
    }

    #[test]
    fn days_between_is_inclusive_and_empty_when_reversed() {
        assert_eq!(days_between(ymd(2026, 1, 30), ymd(2026, 2, 2)).len(), 4);
        assert!(days_between(ymd(2026, 2, 2), ymd(2026, 1, 30)).is_empty());
        assert_eq!(days_in_month(ymd(2026, 2, 10)).len(), 28);
        assert!(is_today_at(ymd(2026, 2, 2), ymd(2026, 2, 2)));
    }
}
