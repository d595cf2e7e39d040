//! JSON response envelope and error-to-status mapping.
//!
//! Every response body has the shape
//!
//! ```json
//! { "code": "E0000", "message": "Success", "data": { ... } }
//! ```
//!
//! where `data` is omitted on errors.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Code of a successful response
pub const SUCCESS_CODE: &str = "E0000";

/// Uniform response body
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    /// `E0000` on success, an error code otherwise
    pub code: String,
    /// Human readable outcome
    pub message: String,
    /// Payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Handler return type
pub type ApiResult<T> = std::result::Result<Json<AppResponse<T>>, Error>;

/// Wraps `data` in a success envelope.
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(AppResponse {
        code: SUCCESS_CODE.to_string(),
        message: "Success".to_string(),
        data: Some(data),
    }))
}

impl Error {
    /// HTTP status and error code for this error.
    #[must_use]
    pub const fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "E3001"),
            Self::Forbidden { .. } => (StatusCode::FORBIDDEN, "E2001"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "E0003"),
            Self::Conflict { .. } => (StatusCode::CONFLICT, "E0004"),
            Self::Validation { .. } | Self::InvalidAmount { .. } | Self::InvalidQuantity { .. } | Self::Csv(_) => {
                (StatusCode::BAD_REQUEST, "E0002")
            }
            Self::InvalidState { .. } | Self::Overpayment { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "E0005"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "E9002"),
            Self::Config { .. } | Self::Io(_) | Self::NumericConversion(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "E9001")
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, "Request rejected");
            self.to_string()
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message,
            data: None,
        });
        (status, body).into_response()
    }
}
