//! Booking routes: the public request form and the staff approval queue.

use super::{
    AppState,
    error::{ApiResult, ok},
};
use crate::{
    alerts,
    core::{
        booking::{self, ApprovedBooking, NewBooking},
        tenant::OutletContext,
    },
    entities::booking_request,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;

/// Staff routes under `/api`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(pending_bookings))
        .route("/bookings/{id}/approve", post(approve_booking))
        .route("/bookings/{id}/cancel", post(cancel_booking))
}

/// Unauthenticated routes under `/public`
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/outlets/{outlet_id}/bookings", post(submit_booking))
}

async fn submit_booking(
    State(state): State<AppState>,
    Path(outlet_id): Path<i64>,
    Json(input): Json<NewBooking>,
) -> ApiResult<booking_request::Model> {
    let booking = booking::submit_booking(&state.db, outlet_id, input, Utc::now()).await?;
    state
        .alerts
        .publish(outlet_id, alerts::booking_requested(&booking));
    ok(booking)
}

async fn pending_bookings(
    State(state): State<AppState>,
    ctx: OutletContext,
) -> ApiResult<Vec<booking_request::Model>> {
    ok(booking::pending_bookings(&state.db, ctx.outlet_id()).await?)
}

#[derive(Debug, Deserialize)]
struct ApproveRequest {
    /// Start a session in this room right away
    #[serde(default)]
    room_id: Option<i64>,
}

async fn approve_booking(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
    Json(req): Json<ApproveRequest>,
) -> ApiResult<ApprovedBooking> {
    ok(booking::approve_booking(&state.db, ctx.outlet_id(), id, req.room_id, Utc::now()).await?)
}

async fn cancel_booking(
    State(state): State<AppState>,
    ctx: OutletContext,
    Path(id): Path<i64>,
) -> ApiResult<booking_request::Model> {
    ok(booking::cancel_booking(&state.db, ctx.outlet_id(), id).await?)
}
