//! Counter sales, customer accounts and store credit routes.

use super::{
    AppState,
    error::{ApiResult, ok},
};
use crate::{
    core::{
        customer::{self, CustomerHistory, NewCustomer},
        sale::{self, DailySummary, Receipt, SaleRequest, SaleWithItems},
        tenant::OutletContext,
    },
    entities::{credit_payment, customer as customer_entity, sale_transaction},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Routes under `/api`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(sales_history).post(submit_sale))
        .route("/sales/summary", get(daily_summary))
        .route("/sales/{id}/receipt", get(receipt))
        .route("/sales/{id}/void", post(void_sale))
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/credit", get(credit_list))
        .route("/customers/{id}/history", get(customer_history))
        .route(
            "/customers/{id}/payments",
            get(credit_payments).post(record_credit_payment),
        )
}

async fn submit_sale(
    State(state): State<AppState>,
    ctx: OutletContext,
    Json(request): Json<SaleRequest>,
) -> ApiResult<SaleWithItems> {
    ok(sale::submit_sale(&state.db, ctx.outlet_id(), request, Utc::now()).await?)
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default = "default_limit")]
    limit: u64,
}

const fn default_limit() -> u64 {
    50
}

async fn sales_history(
    State(state): State<AppState>,
    ctx: OutletContext,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<sale_transaction::Model>> {
    ok(sale::sales_history(&state.db, ctx.outlet_id(), query.limit).await?)
}

async fn receipt(State(state): State<AppState>, ctx: OutletContext, Path(id): Path<i64>) -> ApiResult<Receipt> {
    ok(sale::receipt(&state.db, &ctx, id).await?)
}

async fn void_sale(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
) -> ApiResult<sale_transaction::Model> {
    ok(sale::void_sale(&state.db, &ctx, id).await?)
}

#[derive(Debug, Deserialize)]
struct SummaryQuery {
    date: Option<NaiveDate>,
}

async fn daily_summary(
    State(state): State<AppState>,
    ctx: OutletContext,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<DailySummary> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    ok(sale::daily_summary(&state.db, ctx.outlet_id(), date).await?)
}

async fn list_customers(State(state): State<AppState>, ctx: OutletContext) -> ApiResult<Vec<customer_entity::Model>> {
    ok(customer::list_customers(&state.db, ctx.outlet_id()).await?)
}

async fn create_customer(
    State(state): State<AppState>,
    ctx: OutletContext,
    Json(input): Json<NewCustomer>,
) -> ApiResult<customer_entity::Model> {
    ok(customer::create_customer(&state.db, ctx.outlet_id(), input).await?)
}

async fn credit_list(State(state): State<AppState>, ctx: OutletContext) -> ApiResult<Vec<customer_entity::Model>> {
    ok(customer::credit_list(&state.db, ctx.outlet_id()).await?)
}

async fn customer_history(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
) -> ApiResult<CustomerHistory> {
    ok(customer::customer_history(&state.db, ctx.outlet_id(), id).await?)
}

async fn credit_payments(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
) -> ApiResult<Vec<credit_payment::Model>> {
    ok(customer::credit_payments(&state.db, ctx.outlet_id(), id).await?)
}

#[derive(Debug, Deserialize)]
struct PaymentRequest {
    amount: f64,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct PaymentReceipt {
    payment: credit_payment::Model,
    customer: customer_entity::Model,
}

async fn record_credit_payment(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
    Json(req): Json<PaymentRequest>,
) -> ApiResult<PaymentReceipt> {
    let (payment, customer) =
        customer::record_credit_payment(&state.db, ctx.outlet_id(), id, req.amount, req.notes).await?;
    ok(PaymentReceipt { payment, customer })
}
