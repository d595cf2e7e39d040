//! Request identity extractors.
//!
//! Authentication happens upstream: the proxy in front of the service puts the
//! authenticated user's ID in `x-user-id`. An optional `x-outlet-id` picks the
//! outlet to act on; without it the user's default outlet is used.

use super::AppState;
use crate::{
    core::tenant::{self, OutletContext},
    entities::user,
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the authenticated user's ID
pub const USER_HEADER: &str = "x-user-id";
/// Header selecting the outlet
pub const OUTLET_HEADER: &str = "x-outlet-id";

/// The authenticated user, without outlet resolution
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

fn header_id(parts: &Parts, name: &str) -> Option<std::result::Result<i64, ()>> {
    parts
        .headers
        .get(name)
        .map(|value| value.to_str().ok().and_then(|v| v.trim().parse().ok()).ok_or(()))
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<user::Model> {
    let user_id = match header_id(parts, USER_HEADER) {
        Some(Ok(id)) => id,
        Some(Err(())) => {
            tracing::warn!(uri = %parts.uri, "Malformed user header");
            return Err(Error::Unauthenticated);
        }
        None => return Err(Error::Unauthenticated),
    };
    tenant::get_user(&state.db, user_id).await?.ok_or_else(|| {
        tracing::warn!(user_id, uri = %parts.uri, "Unknown user");
        Error::Unauthenticated
    })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if let Some(user) = parts.extensions.get::<Self>() {
            return Ok(user.clone());
        }
        let user = Self(authenticate(parts, state).await?);
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

impl FromRequestParts<AppState> for OutletContext {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        let requested = match header_id(parts, OUTLET_HEADER) {
            Some(Ok(id)) => Some(id),
            Some(Err(())) => return Err(Error::validation("x-outlet-id must be an integer")),
            None => None,
        };
        tenant::build_context(&state.db, user, requested).await
    }
}
