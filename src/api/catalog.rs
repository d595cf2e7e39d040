//! Product catalogue, stock movement and CSV routes.

use super::{
    AppState,
    error::{ApiResult, ok},
};
use crate::{
    core::{
        catalog_csv::{self, ImportSummary},
        inventory::{self, StockAdjustment, StockEntry},
        product::{self, NewProduct, PosCatalog, ProductUpdate},
        tenant::OutletContext,
    },
    entities::{inventory_log, product as product_entity},
    errors::Result,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

/// Routes under `/api`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/low-stock", get(low_stock))
        .route("/products/import", post(import_products))
        .route("/products/export", get(export_products))
        .route("/products/{id}", get(get_product).put(update_product))
        .route("/products/{id}/favorite", post(toggle_favorite))
        .route("/pos/catalog", get(pos_catalog))
        .route("/inventory/adjust", post(adjust_stock))
        .route("/inventory/receive", post(receive_stock))
        .route("/inventory/spoilage", post(log_spoilage))
        .route("/inventory/count", post(set_counted_level))
        .route("/inventory/bulk", post(bulk_stock_entry))
        .route("/inventory/history", get(inventory_history))
}

async fn list_products(State(state): State<AppState>, ctx: OutletContext) -> ApiResult<Vec<product_entity::Model>> {
    ok(product::list_products(&state.db, ctx.outlet_id()).await?)
}

async fn create_product(
    State(state): State<AppState>,
    ctx: OutletContext,
    Json(input): Json<NewProduct>,
) -> ApiResult<product_entity::Model> {
    ok(product::create_product(&state.db, ctx.outlet_id(), input).await?)
}

async fn get_product(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
) -> ApiResult<product_entity::Model> {
    ok(product::get_product(&state.db, ctx.outlet_id(), id).await?)
}

async fn update_product(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
    Json(update): Json<ProductUpdate>,
) -> ApiResult<product_entity::Model> {
    ok(product::update_product(&state.db, ctx.outlet_id(), id, update).await?)
}

async fn toggle_favorite(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
) -> ApiResult<product_entity::Model> {
    ok(product::toggle_favorite(&state.db, ctx.outlet_id(), id).await?)
}

async fn pos_catalog(State(state): State<AppState>, ctx: OutletContext) -> ApiResult<PosCatalog> {
    ok(product::pos_catalog(&state.db, ctx.outlet_id()).await?)
}

#[derive(Debug, Deserialize)]
struct ThresholdQuery {
    threshold: Option<i32>,
}

async fn low_stock(
    State(state): State<AppState>,
    ctx: OutletContext,
    Query(query): Query<ThresholdQuery>,
) -> ApiResult<Vec<product_entity::Model>> {
    let threshold = query
        .threshold
        .unwrap_or(state.config.business.low_stock_threshold);
    ok(product::low_stock(&state.db, ctx.outlet_id(), threshold).await?)
}

async fn import_products(State(state): State<AppState>, ctx: OutletContext, body: Bytes) -> ApiResult<ImportSummary> {
    ok(catalog_csv::import_products(&state.db, &ctx.outlet, body.as_ref()).await?)
}

async fn export_products(State(state): State<AppState>, ctx: OutletContext) -> Result<impl IntoResponse> {
    let body = catalog_csv::export_products(&state.db, ctx.outlet_id()).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        catalog_csv::export_filename(&ctx.outlet)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

async fn adjust_stock(
    State(state): State<AppState>,
    ctx: OutletContext,
    Json(adjustment): Json<StockAdjustment>,
) -> ApiResult<inventory_log::Model> {
    ok(inventory::adjust_stock(&state.db, ctx.outlet_id(), adjustment).await?)
}

#[derive(Debug, Deserialize)]
struct ReceiveRequest {
    product_id: i64,
    quantity: i32,
    #[serde(default)]
    reference: Option<String>,
}

async fn receive_stock(
    State(state): State<AppState>,
    ctx: OutletContext,
    Json(req): Json<ReceiveRequest>,
) -> ApiResult<inventory_log::Model> {
    ok(inventory::receive_stock(&state.db, ctx.outlet_id(), req.product_id, req.quantity, req.reference).await?)
}

#[derive(Debug, Deserialize)]
struct SpoilageRequest {
    product_id: i64,
    quantity: i32,
    #[serde(default)]
    notes: Option<String>,
}

async fn log_spoilage(
    State(state): State<AppState>,
    ctx: OutletContext,
    Json(req): Json<SpoilageRequest>,
) -> ApiResult<inventory_log::Model> {
    ok(inventory::log_spoilage(&state.db, ctx.outlet_id(), req.product_id, req.quantity, req.notes).await?)
}

#[derive(Debug, Deserialize)]
struct CountRequest {
    product_id: i64,
    counted: i32,
    #[serde(default)]
    notes: Option<String>,
}

async fn set_counted_level(
    State(state): State<AppState>,
    ctx: OutletContext,
    Json(req): Json<CountRequest>,
) -> ApiResult<Option<inventory_log::Model>> {
    ok(inventory::set_counted_level(&state.db, ctx.outlet_id(), req.product_id, req.counted, req.notes).await?)
}

#[derive(Debug, Deserialize)]
struct BulkRequest {
    entries: Vec<StockEntry>,
    #[serde(default)]
    reference: Option<String>,
}

async fn bulk_stock_entry(
    State(state): State<AppState>,
    ctx: OutletContext,
    Json(req): Json<BulkRequest>,
) -> ApiResult<Vec<inventory_log::Model>> {
    ok(inventory::bulk_stock_entry(&state.db, ctx.outlet_id(), &req.entries, req.reference).await?)
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    product_id: Option<i64>,
    #[serde(default = "default_history_limit")]
    limit: u64,
}

const fn default_history_limit() -> u64 {
    100
}

async fn inventory_history(
    State(state): State<AppState>,
    ctx: OutletContext,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<inventory_log::Model>> {
    ok(inventory::inventory_history(&state.db, ctx.outlet_id(), query.product_id, query.limit).await?)
}
