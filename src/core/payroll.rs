//! Payroll business logic - monthly pay calculation and approval workflow.
//!
//! A payroll record moves `Draft -> Calculated -> Approved -> Paid`. Records
//! can be recalculated and have their deductions changed until they are
//! approved; after that they are frozen.

use crate::{
    core::{
        attendance::month_records,
        employee::{get_employee, list_employees},
        money,
        period::month_bounds,
        sale::completed_sales_between,
    },
    entities::{PaymentType, Payroll, PayrollStatus, employee, payroll},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, TryIntoModel, prelude::*};
use serde::Serialize;

/// Pay components derived from attendance and sales
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayBreakdown {
    /// Salary, minimum salary or daily earnings
    pub base: Decimal,
    /// Commission on outlet sales
    pub commission: Decimal,
}

/// A month of payroll with totals
#[derive(Debug, Clone, Serialize)]
pub struct PayrollReport {
    /// Year
    pub year: i32,
    /// Month
    pub month: i32,
    /// One record per employee
    pub records: Vec<payroll::Model>,
    /// Sum of total earnings
    pub total_earnings: f64,
    /// Sum of deductions
    pub total_deductions: f64,
    /// Sum of net pay
    pub total_net_pay: f64,
}

/// Computes base and commission for one employee.
///
/// `days_worked` counts attendance records in the month and `outlet_sales`
/// is the outlet's completed sales revenue for the month.
#[must_use]
pub fn compute_pay(employee: &employee::Model, days_worked: usize, outlet_sales: Decimal) -> PayBreakdown {
    let salary = money::dec(employee.base_salary);
    match employee.payment_type {
        PaymentType::Permanent => PayBreakdown {
            base: salary,
            commission: Decimal::ZERO,
        },
        PaymentType::Daily => PayBreakdown {
            base: salary * Decimal::from(days_worked),
            commission: Decimal::ZERO,
        },
        PaymentType::Commission => PayBreakdown {
            base: salary,
            commission: money::round_money(money::percent_of(outlet_sales, employee.commission_rate)),
        },
    }
}

const fn is_locked(status: PayrollStatus) -> bool {
    matches!(status, PayrollStatus::Approved | PayrollStatus::Paid)
}

fn status_name(status: PayrollStatus) -> String {
    format!("{status:?}")
}

/// Retrieves a payroll record of the outlet.
pub async fn get_payroll<C>(db: &C, outlet_id: i64, payroll_id: i64) -> Result<payroll::Model>
where
    C: ConnectionTrait,
{
    Payroll::find_by_id(payroll_id)
        .filter(payroll::Column::OutletId.eq(outlet_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("payroll", payroll_id))
}

async fn find_period<C>(db: &C, employee_id: i64, year: i32, month: i32) -> Result<Option<payroll::Model>>
where
    C: ConnectionTrait,
{
    Payroll::find()
        .filter(payroll::Column::EmployeeId.eq(employee_id))
        .filter(payroll::Column::Year.eq(year))
        .filter(payroll::Column::Month.eq(month))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn calculate_in<C>(
    db: &C,
    employee: &employee::Model,
    year: i32,
    month: i32,
    outlet_sales: Decimal,
    now: DateTime<Utc>,
) -> Result<payroll::Model>
where
    C: ConnectionTrait,
{
    let existing = find_period(db, employee.id, year, month).await?;
    if let Some(record) = existing.as_ref().filter(|r| is_locked(r.status)) {
        return Err(Error::InvalidState {
            entity: "payroll",
            state: status_name(record.status),
            action: "recalculate",
        });
    }

    let attendance = month_records(db, employee.outlet_id, year, month, Some(employee.id)).await?;
    let hours = money::sum_amounts(attendance.iter().map(|a| a.hours_worked));
    let pay = compute_pay(employee, attendance.len(), outlet_sales);
    let earnings = pay.base + pay.commission;
    let deductions = existing
        .as_ref()
        .map_or(Decimal::ZERO, |r| money::dec(r.deductions));

    let mut active: payroll::ActiveModel = match existing {
        Some(record) => record.into(),
        None => payroll::ActiveModel {
            outlet_id: Set(employee.outlet_id),
            employee_id: Set(employee.id),
            year: Set(year),
            month: Set(month),
            deductions: Set(0.0),
            status: Set(PayrollStatus::Draft),
            paid_at: Set(None),
            ..Default::default()
        },
    };
    active.total_hours_worked = Set(money::to_amount(hours));
    active.base_amount = Set(money::to_amount(pay.base));
    active.commission_amount = Set(money::to_amount(pay.commission));
    active.total_earnings = Set(money::to_amount(earnings));
    active.net_pay = Set(money::to_amount(earnings - deductions));
    active.status = Set(PayrollStatus::Calculated);
    active.calculated_at = Set(Some(now));

    let saved = active.save(db).await?;
    let record = saved.try_into_model()?;
    tracing::debug!(
        employee_id = employee.id,
        year,
        month,
        net_pay = record.net_pay,
        "Payroll calculated"
    );
    Ok(record)
}

async fn outlet_sales_in_month<C>(db: &C, outlet_id: i64, year: i32, month: i32) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let (start, end) = month_bounds(year, month)?;
    let sales = completed_sales_between(db, outlet_id, start, end).await?;
    Ok(money::sum_amounts(sales.iter().map(|s| s.total_amount)))
}

/// Calculates (or recalculates) one employee's pay for a month.
///
/// # Errors
/// Returns an error if:
/// - The month is outside 1..=12
/// - The employee does not belong to the outlet
/// - The record is already approved or paid
pub async fn calculate_payroll(
    db: &DatabaseConnection,
    outlet_id: i64,
    employee_id: i64,
    year: i32,
    month: i32,
) -> Result<payroll::Model> {
    let outlet_sales = outlet_sales_in_month(db, outlet_id, year, month).await?;
    let txn = db.begin().await?;
    let employee = get_employee(&txn, outlet_id, employee_id).await?;
    let record = calculate_in(&txn, &employee, year, month, outlet_sales, Utc::now()).await?;
    txn.commit().await?;
    Ok(record)
}

/// Calculates pay for every active employee. Approved and paid records are left as they are.
pub async fn calculate_outlet_payroll(
    db: &DatabaseConnection,
    outlet_id: i64,
    year: i32,
    month: i32,
) -> Result<Vec<payroll::Model>> {
    let outlet_sales = outlet_sales_in_month(db, outlet_id, year, month).await?;
    let now = Utc::now();

    let txn = db.begin().await?;
    let mut records = Vec::new();
    for employee in list_employees(&txn, outlet_id, true).await? {
        match calculate_in(&txn, &employee, year, month, outlet_sales, now).await {
            Ok(record) => records.push(record),
            Err(Error::InvalidState { state, .. }) => {
                tracing::debug!(employee_id = employee.id, %state, "Skipping frozen payroll");
            }
            Err(e) => return Err(e),
        }
    }
    txn.commit().await?;

    tracing::info!(outlet_id, year, month, count = records.len(), "Outlet payroll calculated");
    Ok(records)
}

/// Sets deductions and recomputes net pay.
pub async fn set_deductions(
    db: &DatabaseConnection,
    outlet_id: i64,
    payroll_id: i64,
    deductions: f64,
) -> Result<payroll::Model> {
    let deductions = money::require_non_negative(deductions)?;
    let record = get_payroll(db, outlet_id, payroll_id).await?;
    if is_locked(record.status) {
        return Err(Error::InvalidState {
            entity: "payroll",
            state: status_name(record.status),
            action: "change deductions of",
        });
    }

    let net = money::dec(record.total_earnings) - deductions;
    let mut active: payroll::ActiveModel = record.into();
    active.deductions = Set(money::to_amount(deductions));
    active.net_pay = Set(money::to_amount(net));
    active.update(db).await.map_err(Into::into)
}

async fn transition(
    db: &DatabaseConnection,
    outlet_id: i64,
    payroll_id: i64,
    from: PayrollStatus,
    to: PayrollStatus,
    action: &'static str,
) -> Result<payroll::Model> {
    let record = get_payroll(db, outlet_id, payroll_id).await?;
    if record.status != from {
        return Err(Error::InvalidState {
            entity: "payroll",
            state: status_name(record.status),
            action,
        });
    }
    let mut active: payroll::ActiveModel = record.into();
    active.status = Set(to);
    if to == PayrollStatus::Paid {
        active.paid_at = Set(Some(Utc::now()));
    }
    let updated = active.update(db).await?;
    tracing::info!(outlet_id, payroll_id, status = ?updated.status, "Payroll status changed");
    Ok(updated)
}

/// Approves a calculated payroll.
pub async fn approve_payroll(db: &DatabaseConnection, outlet_id: i64, payroll_id: i64) -> Result<payroll::Model> {
    transition(db, outlet_id, payroll_id, PayrollStatus::Calculated, PayrollStatus::Approved, "approve").await
}

/// Marks an approved payroll as paid.
pub async fn mark_paid(db: &DatabaseConnection, outlet_id: i64, payroll_id: i64) -> Result<payroll::Model> {
    transition(db, outlet_id, payroll_id, PayrollStatus::Approved, PayrollStatus::Paid, "pay").await
}

/// Payroll records of a month, ordered by employee.
pub async fn month_payrolls<C>(db: &C, outlet_id: i64, year: i32, month: i32) -> Result<Vec<payroll::Model>>
where
    C: ConnectionTrait,
{
    Payroll::find()
        .filter(payroll::Column::OutletId.eq(outlet_id))
        .filter(payroll::Column::Year.eq(year))
        .filter(payroll::Column::Month.eq(month))
        .order_by_asc(payroll::Column::EmployeeId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Payroll records and totals of a month.
pub async fn payroll_report(
    db: &DatabaseConnection,
    outlet_id: i64,
    year: i32,
    month: i32,
) -> Result<PayrollReport> {
    month_bounds(year, month)?;
    let records = month_payrolls(db, outlet_id, year, month).await?;
    Ok(PayrollReport {
        year,
        month,
        total_earnings: money::to_amount(money::sum_amounts(records.iter().map(|r| r.total_earnings))),
        total_deductions: money::to_amount(money::sum_amounts(records.iter().map(|r| r.deductions))),
        total_net_pay: money::to_amount(money::sum_amounts(records.iter().map(|r| r.net_pay))),
        records,
    })
}
