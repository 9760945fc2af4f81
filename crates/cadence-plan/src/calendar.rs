//! Business-day arithmetic for iteration dates.

use chrono::{Datelike, Days, NaiveDate, Weekday};

const BUSINESS_DAYS_PER_WEEK: u32 = 5;

/// `true` for Monday through Friday.
#[must_use]
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Roll a weekend date forward to the following Monday.
///
/// Stops at the last representable date.
#[must_use]
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut current = date;
    while !is_business_day(current) {
        let Some(next) = current.succ_opt() else { break };
        current = next;
    }
    current
}

/// Advance `date` by `days` business days, skipping weekends.
///
/// `add_business_days(d, 0) == d`. Whole weeks are jumped at once, so the
/// cost does not grow with `days`; results past the calendar's range
/// saturate at [`NaiveDate::MAX`].
#[must_use]
pub fn add_business_days(date: NaiveDate, days: u32) -> NaiveDate {
    if days == 0 {
        return date;
    }

    // Any seven calendar days hold exactly five business days. Keep at least
    // one business day for the walk so a weekend start lands on Friday, not
    // on the following Saturday.
    let weeks = (days - 1) / BUSINESS_DAYS_PER_WEEK;
    let Some(mut current) = date.checked_add_days(Days::new(u64::from(weeks) * 7)) else {
        return NaiveDate::MAX;
    };

    let mut remaining = days - weeks * BUSINESS_DAYS_PER_WEEK;
    while remaining > 0 {
        let Some(next) = current.succ_opt() else { break };
        current = next;
        if is_business_day(current) {
            remaining -= 1;
        }
    }
    current
}

/// Start and end date of the iteration at zero-based `index`.
///
/// `start = add_business_days(project_start, index * length)` and
/// `end = add_business_days(start, length - 1)`; a weekend project start is
/// first rolled to Monday.
#[must_use]
pub fn iteration_window(
    project_start: NaiveDate,
    index: u32,
    length_days: u32,
) -> (NaiveDate, NaiveDate) {
    let origin = next_business_day(project_start);
    let start = add_business_days(origin, index.saturating_mul(length_days));
    let end = add_business_days(start, length_days.saturating_sub(1));
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn zero_days_is_identity() {
        let monday = date(2026, 1, 5);
        assert_eq!(add_business_days(monday, 0), monday);
    }

    #[test]
    fn friday_plus_one_is_monday() {
        assert_eq!(add_business_days(date(2026, 1, 9), 1), date(2026, 1, 12));
    }

    #[test]
    fn ten_business_days_span_two_weeks() {
        assert_eq!(add_business_days(date(2026, 1, 5), 10), date(2026, 1, 19));
    }

    #[test]
    fn weekend_start_rolls_forward() {
        assert_eq!(next_business_day(date(2026, 1, 10)), date(2026, 1, 12));
        assert_eq!(next_business_day(date(2026, 1, 12)), date(2026, 1, 12));
    }

    #[test]
    fn iteration_windows_are_contiguous() {
        let start = date(2026, 1, 5);
        let (s0, e0) = iteration_window(start, 0, 10);
        let (s1, _) = iteration_window(start, 1, 10);

        assert_eq!(s0, start);
        assert_eq!(e0, date(2026, 1, 16));
        assert_eq!(s1, date(2026, 1, 19));
        assert_eq!(add_business_days(e0, 1), s1);
    }

    /// One calendar day at a time; the reference for the week-jumping version.
    fn walk_business_days(date: NaiveDate, days: u32) -> NaiveDate {
        let mut current = date;
        let mut remaining = days;
        while remaining > 0 {
            current = current.succ_opt().expect("in range");
            if is_business_day(current) {
                remaining -= 1;
            }
        }
        current
    }

    #[test]
    fn week_jumps_match_day_by_day_walk() {
        // Covers every weekday, weekends included, as a starting point.
        for offset in 0..7 {
            let start = date(2026, 3, 2) + Days::new(offset);
            for days in 0..40 {
                assert_eq!(
                    add_business_days(start, days),
                    walk_business_days(start, days),
                    "start {start} + {days}"
                );
            }
        }
    }

    #[test]
    fn huge_offsets_saturate_instead_of_looping() {
        assert_eq!(add_business_days(date(2026, 1, 5), u32::MAX), NaiveDate::MAX);

        let (start, end) = iteration_window(date(2026, 1, 5), 3, u32::MAX);
        assert_eq!(start, NaiveDate::MAX);
        assert_eq!(end, NaiveDate::MAX);
    }

    #[test]
    fn rolling_forward_stops_at_the_last_date() {
        let last = NaiveDate::MAX;
        assert!(next_business_day(last) <= last);
        let near_end = last - Days::new(3);
        assert!(add_business_days(near_end, 10) <= last);
    }

    #[test]
    fn windows_never_start_on_weekends() {
        let saturday = date(2026, 1, 3);
        for index in 0..6 {
            let (s, e) = iteration_window(saturday, index, 14);
            assert!(is_business_day(s));
            assert!(is_business_day(e));
        }
    }
}
