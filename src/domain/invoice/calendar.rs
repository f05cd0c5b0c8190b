//! Date arithmetic for recurring billing and cancellation proration

use chrono::{Datelike, Duration, NaiveDate};

use crate::domain::{DomainError, DomainResult};

/// Length of a billing period in days, inclusive of both ends.
pub const PERIOD_DAYS: i64 = 365;

/// Same month/day as `start` in `year`. A Feb 29 start maps to Feb 28 in
/// non-leap years.
pub fn anniversary_in_year(start: NaiveDate, year: i32) -> DomainResult<NaiveDate> {
    let day = if start.month() == 2 && start.day() == 29 && !is_leap_year(year) {
        28
    } else {
        start.day()
    };
    NaiveDate::from_ymd_opt(year, start.month(), day).ok_or_else(|| {
        DomainError::Internal(format!(
            "no anniversary of {} in year {}",
            start, year
        ))
    })
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Billing period opened by an anniversary: `[anniversary, anniversary + 364]`.
pub fn billing_period(anniversary: NaiveDate) -> (NaiveDate, NaiveDate) {
    (anniversary, anniversary + Duration::days(PERIOD_DAYS - 1))
}

/// Period to invoice on `today`, if any.
///
/// The current year's anniversary must have been reached and must lie
/// inside the contract term. `end` is exclusive: a contract ending on its
/// anniversary opens no further period.
pub fn due_billing_period(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> DomainResult<Option<(NaiveDate, NaiveDate)>> {
    let anniversary = anniversary_in_year(start, today.year())?;
    if anniversary > today || anniversary < start || anniversary >= end {
        return Ok(None);
    }
    Ok(Some(billing_period(anniversary)))
}

/// Share of the annual charge for the elapsed part of the calendar year,
/// counted by ordinal day over a 365-day year and rounded to the cent.
pub fn prorated_amount_cents(annual_charge_cents: i64, today: NaiveDate) -> i64 {
    (annual_charge_cents as f64 * f64::from(today.ordinal()) / 365.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn leap_day_start_in_common_year() {
        assert_eq!(anniversary_in_year(d(2024, 2, 29), 2025).unwrap(), d(2025, 2, 28));
    }

    #[test]
    fn leap_day_start_in_leap_year() {
        assert_eq!(anniversary_in_year(d(2024, 2, 29), 2028).unwrap(), d(2028, 2, 29));
    }

    #[test]
    fn ordinary_anniversary() {
        assert_eq!(anniversary_in_year(d(2023, 7, 14), 2026).unwrap(), d(2026, 7, 14));
    }

    #[test]
    fn century_years() {
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(2100));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2025));
    }

    #[test]
    fn period_spans_365_days() {
        let (s, e) = billing_period(d(2025, 3, 1));
        assert_eq!(s, d(2025, 3, 1));
        assert_eq!(e, d(2026, 2, 28));
        assert_eq!((e - s).num_days(), 364);
    }

    #[test]
    fn due_on_and_after_anniversary() {
        let start = d(2024, 5, 10);
        let end = d(2027, 5, 10);
        assert_eq!(due_billing_period(start, end, d(2025, 5, 9)).unwrap(), None);
        assert_eq!(
            due_billing_period(start, end, d(2025, 5, 10)).unwrap(),
            Some((d(2025, 5, 10), d(2026, 5, 9)))
        );
        // missed run
        assert_eq!(
            due_billing_period(start, end, d(2025, 6, 1)).unwrap(),
            Some((d(2025, 5, 10), d(2026, 5, 9)))
        );
    }

    #[test]
    fn nothing_due_after_contract_end() {
        let start = d(2024, 5, 10);
        let end = d(2025, 5, 9);
        assert_eq!(due_billing_period(start, end, d(2025, 5, 10)).unwrap(), None);
    }

    #[test]
    fn term_end_is_exclusive() {
        let start = d(2024, 3, 15);
        let end = d(2025, 3, 15);
        assert_eq!(
            due_billing_period(start, end, d(2024, 3, 15)).unwrap(),
            Some((d(2024, 3, 15), d(2025, 3, 14)))
        );
        assert_eq!(due_billing_period(start, end, d(2025, 3, 15)).unwrap(), None);
    }

    #[test]
    fn proration_by_ordinal_day() {
        // day 100 of a common year
        let day_100 = d(2025, 4, 10);
        assert_eq!(day_100.ordinal(), 100);
        assert_eq!(prorated_amount_cents(36_500, day_100), 10_000);
        assert_eq!(prorated_amount_cents(0, day_100), 0);
    }

    #[test]
    fn proration_rounds_to_cent() {
        // 1000 * 1 / 365 = 2.739..
        assert_eq!(prorated_amount_cents(1000, d(2025, 1, 1)), 3);
    }
}
