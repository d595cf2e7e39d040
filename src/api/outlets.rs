//! Outlet and outlet settings routes.

use super::{
    AppState,
    auth::CurrentUser,
    error::{ApiResult, ok},
};
use crate::{
    core::{
        outlet::{self, NewOutlet, SettingsUpdate},
        tenant::OutletContext,
    },
    entities::{outlet as outlet_entity, outlet_setting},
};
use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

/// Routes under `/api`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/outlets", get(list_outlets).post(create_outlet))
        .route("/settings", get(get_settings).put(update_settings))
}

async fn list_outlets(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<outlet_entity::Model>> {
    ok(outlet::list_outlets(&state.db, &user).await?)
}

async fn create_outlet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NewOutlet>,
) -> ApiResult<outlet_entity::Model> {
    ok(outlet::create_outlet(&state.db, &user, input).await?)
}

async fn get_settings(State(state): State<AppState>, ctx: OutletContext) -> ApiResult<outlet_setting::Model> {
    ok(outlet::get_settings(&state.db, ctx.outlet_id()).await?)
}

async fn update_settings(
    State(state): State<AppState>,
    ctx: OutletContext,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<outlet_setting::Model> {
    ok(outlet::update_settings(&state.db, ctx.outlet_id(), update).await?)
}
