//! Calendar period helpers used by reports, attendance and payroll.

use crate::errors::{Error, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// First day of `year`/`month` and first day of the following month.
pub fn month_dates(year: i32, month: i32) -> Result<(NaiveDate, NaiveDate)> {
    let month_u32 = u32::try_from(month)
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| Error::validation(format!("Month must be between 1 and 12, got {month}")))?;

    let start = NaiveDate::from_ymd_opt(year, month_u32, 1)
        .ok_or_else(|| Error::validation(format!("Invalid period {year}-{month:02}")))?;
    let end = if month_u32 == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month_u32 + 1, 1)
    }
    .ok_or_else(|| Error::validation(format!("Invalid period {year}-{month:02}")))?;

    Ok((start, end))
}

/// Half-open UTC instant range covering `year`/`month`.
pub fn month_bounds(year: i32, month: i32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let (start, end) = month_dates(year, month)?;
    Ok((start_of_day(start), start_of_day(end)))
}

/// Half-open UTC instant range covering `date`.
#[must_use]
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = date.succ_opt().unwrap_or(date);
    (start_of_day(date), start_of_day(next))
}

/// Midnight UTC at the start of `date`.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

/// Year and month of `date` as stored in payroll records.
#[must_use]
pub fn year_month(date: NaiveDate) -> (i32, i32) {
    // month() is always 1..=12
    (date.year(), i32::try_from(date.month()).unwrap_or(1))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_month_dates_rolls_over_december() {
        let (start, end) = month_dates(2024, 12).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_month_dates_rejects_bad_month() {
        assert!(matches!(month_dates(2024, 0), Err(Error::Validation { .. })));
        assert!(matches!(month_dates(2024, 13), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let (start, end) = day_bounds(date);
        assert_eq!(end - start, chrono::Duration::days(1));
        assert_eq!(start.date_naive(), date);
    }
}
