//! Room and room session routes.

use super::{
    AppState,
    error::{ApiResult, ok},
};
use crate::{
    core::{
        room::{self, NewRoom, RoomTile, RoomUpdate},
        session::{self, Checkout, CheckoutRequest, SessionBill},
        tenant::OutletContext,
    },
    entities::{room as room_entity, room_session},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use chrono::Utc;
use serde::Deserialize;

/// Routes under `/api`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/board", get(room_board))
        .route("/rooms/{id}", put(update_room))
        .route("/rooms/{id}/sessions", post(start_session))
        .route("/sessions", get(open_sessions))
        .route("/sessions/{id}/pause", post(pause_session))
        .route("/sessions/{id}/resume", post(resume_session))
        .route("/sessions/{id}/extend", post(extend_session))
        .route("/sessions/{id}/bill", get(session_bill))
        .route("/sessions/{id}/checkout", post(checkout_session))
        .route("/sessions/{id}/cancel", post(cancel_session))
}

async fn list_rooms(State(state): State<AppState>, ctx: OutletContext) -> ApiResult<Vec<room_entity::Model>> {
    ok(room::list_rooms(&state.db, ctx.outlet_id()).await?)
}

async fn create_room(
    State(state): State<AppState>,
    ctx: OutletContext,
    Json(input): Json<NewRoom>,
) -> ApiResult<room_entity::Model> {
    ok(room::create_room(&state.db, ctx.outlet_id(), input).await?)
}

async fn update_room(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
    Json(update): Json<RoomUpdate>,
) -> ApiResult<room_entity::Model> {
    ok(room::update_room(&state.db, ctx.outlet_id(), id, update).await?)
}

async fn room_board(State(state): State<AppState>, ctx: OutletContext) -> ApiResult<Vec<RoomTile>> {
    ok(room::room_board(&state.db, ctx.outlet_id()).await?)
}

#[derive(Debug, Deserialize)]
struct StartRequest {
    #[serde(default)]
    customer_name: Option<String>,
    #[serde(default = "default_booked_minutes")]
    booked_minutes: i32,
}

const fn default_booked_minutes() -> i32 {
    60
}

async fn start_session(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(room_id): Path<i64>,
    Json(req): Json<StartRequest>,
) -> ApiResult<room_session::Model> {
    ok(session::start_session(
        &state.db,
        ctx.outlet_id(),
        room_id,
        req.customer_name.as_deref(),
        req.booked_minutes,
        Utc::now(),
    )
    .await?)
}

async fn open_sessions(State(state): State<AppState>, ctx: OutletContext) -> ApiResult<Vec<room_session::Model>> {
    ok(session::open_sessions(&state.db, ctx.outlet_id()).await?)
}

async fn pause_session(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
) -> ApiResult<room_session::Model> {
    ok(session::pause_session(&state.db, ctx.outlet_id(), id, Utc::now()).await?)
}

async fn resume_session(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
) -> ApiResult<room_session::Model> {
    ok(session::resume_session(&state.db, ctx.outlet_id(), id, Utc::now()).await?)
}

#[derive(Debug, Deserialize)]
struct ExtendRequest {
    minutes: i32,
}

async fn extend_session(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
    Json(req): Json<ExtendRequest>,
) -> ApiResult<room_session::Model> {
    ok(session::extend_session(&state.db, ctx.outlet_id(), id, req.minutes).await?)
}

async fn session_bill(State(state): State<AppState>, ctx: OutletContext, Path(id): Path<i64>) -> ApiResult<SessionBill> {
    ok(session::session_bill(
        &state.db,
        ctx.outlet_id(),
        id,
        state.config.business.minimum_billable_minutes,
        Utc::now(),
    )
    .await?)
}

async fn checkout_session(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<Checkout> {
    ok(session::checkout_session(
        &state.db,
        &ctx,
        id,
        request,
        state.config.business.minimum_billable_minutes,
        Utc::now(),
    )
    .await?)
}

async fn cancel_session(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
) -> ApiResult<room_session::Model> {
    ok(session::cancel_session(&state.db, ctx.outlet_id(), id, Utc::now()).await?)
}
