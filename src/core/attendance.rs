//! Attendance business logic - daily check-in and check-out.
//!
//! One record per employee per day. Shifts may cross midnight: a check-out
//! earlier than the check-in closes the previous day's record.

use crate::{
    core::{employee::get_employee, period::month_dates},
    entities::{Attendance, attendance},
    errors::{Error, Result},
};
use chrono::{DateTime, Days, NaiveTime, Utc};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// A month of attendance with totals
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceReport {
    /// Records ordered by date then employee
    pub records: Vec<attendance::Model>,
    /// Sum of `hours_worked`
    pub total_hours: f64,
    /// Number of records with a check-in
    pub days_present: usize,
}

/// Hours between two clock times, wrapping past midnight, rounded to 2 dp.
#[must_use]
pub fn hours_between(check_in: NaiveTime, check_out: NaiveTime) -> f64 {
    let mut seconds = (check_out - check_in).num_seconds();
    if seconds < 0 {
        seconds += SECONDS_PER_DAY;
    }
    let hours = Decimal::from(seconds) / Decimal::from(3600);
    crate::core::money::round_money(hours)
        .to_f64()
        .unwrap_or_default()
}

async fn find_record<C>(
    db: &C,
    employee_id: i64,
    date: chrono::NaiveDate,
) -> Result<Option<attendance::Model>>
where
    C: ConnectionTrait,
{
    Attendance::find()
        .filter(attendance::Column::EmployeeId.eq(employee_id))
        .filter(attendance::Column::Date.eq(date))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Checks an employee in at `at`.
///
/// # Errors
/// Returns an error if the employee is inactive or already checked in that day.
pub async fn check_in(
    db: &DatabaseConnection,
    outlet_id: i64,
    employee_id: i64,
    at: DateTime<Utc>,
) -> Result<attendance::Model> {
    let employee = get_employee(db, outlet_id, employee_id).await?;
    if !employee.is_active {
        return Err(Error::InvalidState {
            entity: "employee",
            state: "Inactive".to_string(),
            action: "check in",
        });
    }

    let date = at.date_naive();
    if find_record(db, employee_id, date).await?.is_some() {
        return Err(Error::Conflict {
            message: format!("{} already checked in on {date}", employee.name),
        });
    }

    let record = attendance::ActiveModel {
        outlet_id: Set(outlet_id),
        employee_id: Set(employee_id),
        date: Set(date),
        check_in_time: Set(Some(at.time())),
        check_out_time: Set(None),
        hours_worked: Set(0.0),
        notes: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(outlet_id, employee_id, %date, "Checked in");
    Ok(record)
}

/// Checks an employee out at `at` and computes hours worked.
///
/// Looks for an open check-in on the same day first, then on the previous
/// day for overnight shifts.
pub async fn check_out(
    db: &DatabaseConnection,
    outlet_id: i64,
    employee_id: i64,
    at: DateTime<Utc>,
) -> Result<attendance::Model> {
    get_employee(db, outlet_id, employee_id).await?;

    let today = at.date_naive();
    let is_open = |r: &attendance::Model| r.check_in_time.is_some() && r.check_out_time.is_none();

    let mut open = find_record(db, employee_id, today).await?.filter(is_open);
    if open.is_none() {
        if let Some(yesterday) = today.checked_sub_days(Days::new(1)) {
            open = find_record(db, employee_id, yesterday).await?.filter(is_open);
        }
    }
    let record = open.ok_or_else(|| Error::InvalidState {
        entity: "attendance",
        state: "NotCheckedIn".to_string(),
        action: "check out",
    })?;

    let check_in_time = record.check_in_time.unwrap_or_default();
    let check_out_time = at.time();
    let hours = hours_between(check_in_time, check_out_time);

    let mut active: attendance::ActiveModel = record.into();
    active.check_out_time = Set(Some(check_out_time));
    active.hours_worked = Set(hours);
    let updated = active.update(db).await?;

    tracing::info!(outlet_id, employee_id, hours, "Checked out");
    Ok(updated)
}

/// Attendance records of a month, optionally for one employee.
pub async fn month_records<C>(
    db: &C,
    outlet_id: i64,
    year: i32,
    month: i32,
    employee_id: Option<i64>,
) -> Result<Vec<attendance::Model>>
where
    C: ConnectionTrait,
{
    let (first, next) = month_dates(year, month)?;
    let mut query = Attendance::find()
        .filter(attendance::Column::OutletId.eq(outlet_id))
        .filter(attendance::Column::Date.gte(first))
        .filter(attendance::Column::Date.lt(next));
    if let Some(employee_id) = employee_id {
        query = query.filter(attendance::Column::EmployeeId.eq(employee_id));
    }
    query
        .order_by_asc(attendance::Column::Date)
        .order_by_asc(attendance::Column::EmployeeId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Monthly attendance with totals.
pub async fn attendance_report(
    db: &DatabaseConnection,
    outlet_id: i64,
    year: i32,
    month: i32,
    employee_id: Option<i64>,
) -> Result<AttendanceReport> {
    let records = month_records(db, outlet_id, year, month, employee_id).await?;
    let total_hours = crate::core::money::sum_amounts(records.iter().map(|r| r.hours_worked));
    let days_present = records.iter().filter(|r| r.check_in_time.is_some()).count();
    Ok(AttendanceReport {
        total_hours: crate::core::money::to_amount(total_hours),
        days_present,
        records,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{core::employee::deactivate_employee, entities::PaymentType, test_utils::*};
    use chrono::TimeZone;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_hours_between_wraps_midnight() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(hours_between(t(9, 0), t(17, 30)), 8.5);
        assert_eq!(hours_between(t(20, 0), t(2, 0)), 6.0);
        assert_eq!(hours_between(t(9, 0), t(9, 20)), 0.33);
    }

    #[tokio::test]
    async fn test_check_in_then_out() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let staff = create_test_employee(&db, ctx.outlet_id(), "Staff", PaymentType::Daily, 50.0, 0.0).await?;

        let record = check_in(&db, ctx.outlet_id(), staff.id, at(3, 9, 0)).await?;
        assert!(record.check_out_time.is_none());

        let closed = check_out(&db, ctx.outlet_id(), staff.id, at(3, 17, 15)).await?;
        assert_eq!(closed.id, record.id);
        assert_eq!(closed.hours_worked, 8.25);
        Ok(())
    }

    #[tokio::test]
    async fn test_second_check_in_same_day_rejected() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let staff = create_test_employee(&db, ctx.outlet_id(), "Staff", PaymentType::Daily, 50.0, 0.0).await?;
        check_in(&db, ctx.outlet_id(), staff.id, at(3, 9, 0)).await?;

        let again = check_in(&db, ctx.outlet_id(), staff.id, at(3, 13, 0)).await;
        assert!(matches!(again, Err(Error::Conflict { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_overnight_shift_closes_previous_day() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let staff = create_test_employee(&db, ctx.outlet_id(), "Night", PaymentType::Daily, 50.0, 0.0).await?;
        let record = check_in(&db, ctx.outlet_id(), staff.id, at(3, 20, 0)).await?;

        let closed = check_out(&db, ctx.outlet_id(), staff.id, at(4, 2, 30)).await?;
        assert_eq!(closed.id, record.id);
        assert_eq!(closed.hours_worked, 6.5);
        Ok(())
    }

    #[tokio::test]
    async fn test_check_out_without_check_in_rejected() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let staff = create_test_employee(&db, ctx.outlet_id(), "Staff", PaymentType::Daily, 50.0, 0.0).await?;
        let result = check_out(&db, ctx.outlet_id(), staff.id, at(3, 17, 0)).await;
        assert!(matches!(result, Err(Error::InvalidState { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_employee_cannot_check_in() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let staff = create_test_employee(&db, ctx.outlet_id(), "Gone", PaymentType::Daily, 50.0, 0.0).await?;
        deactivate_employee(&db, ctx.outlet_id(), staff.id).await?;

        let result = check_in(&db, ctx.outlet_id(), staff.id, at(3, 9, 0)).await;
        assert!(matches!(result, Err(Error::InvalidState { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_report_totals_month() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let staff = create_test_employee(&db, ctx.outlet_id(), "Staff", PaymentType::Daily, 50.0, 0.0).await?;
        for day in [2, 3] {
            check_in(&db, ctx.outlet_id(), staff.id, at(day, 10, 0)).await?;
            check_out(&db, ctx.outlet_id(), staff.id, at(day, 14, 0)).await?;
        }

        let report = attendance_report(&db, ctx.outlet_id(), 2024, 5, Some(staff.id)).await?;
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.total_hours, 8.0);
        assert_eq!(report.days_present, 2);

        let june = attendance_report(&db, ctx.outlet_id(), 2024, 6, None).await?;
        assert!(june.records.is_empty());
        Ok(())
    }
}
