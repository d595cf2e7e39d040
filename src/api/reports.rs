//! Expense, dashboard and financial summary routes.

use super::{
    AppState,
    error::{ApiResult, ok},
    staff::MonthQuery,
};
use crate::{
    core::{
        expense,
        report::{self, Dashboard, FinancialSummary},
        tenant::OutletContext,
    },
    entities::expense as expense_entity,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

/// Routes under `/api`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(add_expense))
        .route("/reports/dashboard", get(dashboard))
        .route("/reports/financial", get(financial_summary))
}

#[derive(Debug, Deserialize)]
struct ExpenseRequest {
    description: String,
    amount: f64,
    /// Defaults to today
    #[serde(default)]
    date: Option<NaiveDate>,
}

async fn add_expense(
    State(state): State<AppState>,
    ctx: OutletContext,
    Json(req): Json<ExpenseRequest>,
) -> ApiResult<expense_entity::Model> {
    let date = req.date.unwrap_or_else(|| Utc::now().date_naive());
    ok(expense::add_expense(&state.db, ctx.outlet_id(), &req.description, req.amount, date).await?)
}

async fn list_expenses(
    State(state): State<AppState>,
    ctx: OutletContext,
    Query(query): Query<MonthQuery>,
) -> ApiResult<Vec<expense_entity::Model>> {
    let (year, month) = query.resolve();
    ok(expense::list_expenses(&state.db, ctx.outlet_id(), year, month).await?)
}

async fn dashboard(State(state): State<AppState>, ctx: OutletContext) -> ApiResult<Dashboard> {
    ok(report::dashboard(
        &state.db,
        ctx.outlet_id(),
        Utc::now().date_naive(),
        state.config.business.low_stock_threshold,
    )
    .await?)
}

async fn financial_summary(
    State(state): State<AppState>,
    ctx: OutletContext,
    Query(query): Query<MonthQuery>,
) -> ApiResult<FinancialSummary> {
    let (year, month) = query.resolve();
    ok(report::financial_summary(&state.db, ctx.outlet_id(), year, month).await?)
}
