//! Room order and kitchen board routes.

use super::{
    AppState,
    error::{ApiResult, ok},
};
use crate::{
    alerts,
    core::{
        kitchen::{self, KitchenTicket, OrderLine},
        tenant::OutletContext,
    },
    entities::{product, room_order},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use chrono::Utc;

/// Routes under `/api`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/{id}/menu", get(customer_menu))
        .route("/sessions/{id}/orders", get(session_tickets).post(place_room_order))
        .route("/kitchen/orders", get(pending_orders))
        .route("/kitchen/orders/{id}", delete(void_order))
        .route("/kitchen/orders/{id}/complete", post(complete_order))
}

async fn customer_menu(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(session_id): Path<i64>,
) -> ApiResult<Vec<product::Model>> {
    ok(kitchen::customer_menu(&state.db, ctx.outlet_id(), session_id).await?)
}

async fn place_room_order(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(session_id): Path<i64>,
    Json(lines): Json<Vec<OrderLine>>,
) -> ApiResult<KitchenTicket> {
    let ticket = kitchen::place_room_order(&state.db, ctx.outlet_id(), session_id, &lines, Utc::now()).await?;
    state
        .alerts
        .publish(ctx.outlet_id(), alerts::order_alert(&ticket));
    ok(ticket)
}

async fn session_tickets(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(session_id): Path<i64>,
) -> ApiResult<Vec<KitchenTicket>> {
    ok(kitchen::session_tickets(&state.db, ctx.outlet_id(), session_id).await?)
}

async fn pending_orders(State(state): State<AppState>, ctx: OutletContext) -> ApiResult<Vec<KitchenTicket>> {
    ok(kitchen::pending_orders(&state.db, ctx.outlet_id()).await?)
}

async fn complete_order(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
) -> ApiResult<room_order::Model> {
    ok(kitchen::complete_order(&state.db, ctx.outlet_id(), id).await?)
}

async fn void_order(State(state): State<AppState>, ctx: OutletContext, Path(id): Path<i64>) -> ApiResult<()> {
    kitchen::void_order(&state.db, &ctx, id).await?;
    ok(())
}
