//! Employee, attendance and payroll routes.

use super::{
    AppState,
    error::{ApiResult, ok},
};
use crate::{
    core::{
        attendance::{self, AttendanceReport},
        employee::{self, EmployeeUpdate, NewEmployee},
        payroll::{self, PayrollReport},
        period::year_month,
        tenant::OutletContext,
    },
    entities::{attendance as attendance_entity, employee as employee_entity, payroll as payroll_entity},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use chrono::Utc;
use serde::Deserialize;

/// Routes under `/api`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/{id}", put(update_employee))
        .route("/employees/{id}/deactivate", post(deactivate_employee))
        .route("/attendance", get(attendance_report))
        .route("/attendance/{employee_id}/check-in", post(check_in))
        .route("/attendance/{employee_id}/check-out", post(check_out))
        .route("/payroll", get(payroll_report))
        .route("/payroll/calculate", post(calculate_payroll))
        .route("/payroll/{id}/deductions", put(set_deductions))
        .route("/payroll/{id}/approve", post(approve_payroll))
        .route("/payroll/{id}/paid", post(mark_paid))
}

/// `?year=&month=`, defaulting to the current month
#[derive(Debug, Deserialize)]
pub(crate) struct MonthQuery {
    year: Option<i32>,
    month: Option<i32>,
    employee_id: Option<i64>,
}

impl MonthQuery {
    pub(crate) fn resolve(&self) -> (i32, i32) {
        let (year, month) = year_month(Utc::now().date_naive());
        (self.year.unwrap_or(year), self.month.unwrap_or(month))
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    active_only: bool,
}

async fn list_employees(
    State(state): State<AppState>,
    ctx: OutletContext,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<employee_entity::Model>> {
    ok(employee::list_employees(&state.db, ctx.outlet_id(), query.active_only).await?)
}

async fn create_employee(
    State(state): State<AppState>,
    ctx: OutletContext,
    Json(input): Json<NewEmployee>,
) -> ApiResult<employee_entity::Model> {
    ok(employee::create_employee(&state.db, ctx.outlet_id(), input).await?)
}

async fn update_employee(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
    Json(update): Json<EmployeeUpdate>,
) -> ApiResult<employee_entity::Model> {
    ok(employee::update_employee(&state.db, ctx.outlet_id(), id, update).await?)
}

async fn deactivate_employee(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
) -> ApiResult<employee_entity::Model> {
    ok(employee::deactivate_employee(&state.db, ctx.outlet_id(), id).await?)
}

async fn check_in(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(employee_id): Path<i64>,
) -> ApiResult<attendance_entity::Model> {
    ok(attendance::check_in(&state.db, ctx.outlet_id(), employee_id, Utc::now()).await?)
}

async fn check_out(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(employee_id): Path<i64>,
) -> ApiResult<attendance_entity::Model> {
    ok(attendance::check_out(&state.db, ctx.outlet_id(), employee_id, Utc::now()).await?)
}

async fn attendance_report(
    State(state): State<AppState>,
    ctx: OutletContext,
    Query(query): Query<MonthQuery>,
) -> ApiResult<AttendanceReport> {
    let (year, month) = query.resolve();
    ok(attendance::attendance_report(&state.db, ctx.outlet_id(), year, month, query.employee_id).await?)
}

async fn payroll_report(
    State(state): State<AppState>,
    ctx: OutletContext,
    Query(query): Query<MonthQuery>,
) -> ApiResult<PayrollReport> {
    let (year, month) = query.resolve();
    ok(payroll::payroll_report(&state.db, ctx.outlet_id(), year, month).await?)
}

#[derive(Debug, Deserialize)]
struct CalculateRequest {
    year: i32,
    month: i32,
    /// One employee, or every active employee when absent
    #[serde(default)]
    employee_id: Option<i64>,
}

async fn calculate_payroll(
    State(state): State<AppState>,
    ctx: OutletContext,
    Json(req): Json<CalculateRequest>,
) -> ApiResult<Vec<payroll_entity::Model>> {
    let records = match req.employee_id {
        Some(employee_id) => {
            vec![payroll::calculate_payroll(&state.db, ctx.outlet_id(), employee_id, req.year, req.month).await?]
        }
        None => payroll::calculate_outlet_payroll(&state.db, ctx.outlet_id(), req.year, req.month).await?,
    };
    ok(records)
}

#[derive(Debug, Deserialize)]
struct DeductionsRequest {
    deductions: f64,
}

async fn set_deductions(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
    Json(req): Json<DeductionsRequest>,
) -> ApiResult<payroll_entity::Model> {
    ok(payroll::set_deductions(&state.db, ctx.outlet_id(), id, req.deductions).await?)
}

async fn approve_payroll(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
) -> ApiResult<payroll_entity::Model> {
    ok(payroll::approve_payroll(&state.db, ctx.outlet_id(), id).await?)
}

async fn mark_paid(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
) -> ApiResult<payroll_entity::Model> {
    ok(payroll::mark_paid(&state.db, ctx.outlet_id(), id).await?)
}
