//! HTTP surface: axum routers, identity extraction and the staff WebSocket.
//!
//! Handlers are thin: they extract the caller's [`OutletContext`], call one
//! `core` operation and wrap the result in the JSON envelope from [`error`].
//!
//! [`OutletContext`]: crate::core::tenant::OutletContext

/// Identity and outlet extractors
pub mod auth;
/// Public booking form and the approval queue
pub mod bookings;
/// Products, stock movements and catalogue CSV
pub mod catalog;
/// Response envelope and error mapping
pub mod error;
/// Room orders and the kitchen board
pub mod kitchen;
/// Outlets and outlet settings
pub mod outlets;
/// Expenses and reports
pub mod reports;
/// Rooms and sessions
pub mod rooms;
/// Sales, customers and credit
pub mod sales;
/// Employees, attendance and payroll
pub mod staff;
/// Staff alert socket
pub mod ws;

use crate::{alerts::AlertHub, config::settings::AppConfig};
use axum::{Json, Router, routing::get};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Database pool
    pub db: DatabaseConnection,
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Outlet alert groups
    pub alerts: AlertHub,
}

impl AppState {
    /// Bundles the pool and configuration with a fresh alert hub.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
            alerts: AlertHub::new(),
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(catalog::routes())
        .merge(sales::routes())
        .merge(reports::routes())
        .merge(staff::routes())
        .merge(outlets::routes())
        .merge(rooms::routes())
        .merge(kitchen::routes())
        .merge(bookings::routes());

    Router::new()
        .route("/health", get(health))
        .route("/ws/staff/{outlet_id}", get(ws::staff_socket))
        .nest("/api", api)
        .nest("/public", bookings::public_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{errors::Result, test_utils::*};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: &str, uri: &str, user_id: Option<i64>, body: &Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = user_id {
            builder = builder.header(auth::USER_HEADER, id.to_string());
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, user_id: i64) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(auth::USER_HEADER, user_id.to_string())
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() -> Result<()> {
        let state = AppState::new(setup_test_db().await?, AppConfig::default());
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() -> Result<()> {
        let (db, _ctx) = setup_outlet().await?;
        let state = AppState::new(db, AppConfig::default());
        let request = Request::builder().uri("/api/products").body(Body::empty()).unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "E3001");
        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_outlet_is_forbidden() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let stranger = create_test_user(&db, "stranger", false).await?;
        let state = AppState::new(db, AppConfig::default());

        let mut request = get_request("/api/products", stranger.id);
        request
            .headers_mut()
            .insert(auth::OUTLET_HEADER, ctx.outlet_id().to_string().parse().unwrap());
        let (status, _) = send(&state, request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_list_products() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let state = AppState::new(db, AppConfig::default());

        let create = json_request(
            "POST",
            "/api/products",
            Some(ctx.user.id),
            &json!({ "name": "Cola", "selling_price": 2.5, "current_stock_level": 12 }),
        );
        let (status, body) = send(&state, create).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "E0000");
        assert_eq!(body["data"]["name"], "Cola");

        let (status, body) = send(&state, get_request("/api/products", ctx.user.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["current_stock_level"], 12);
        Ok(())
    }

    #[tokio::test]
    async fn test_sale_validation_maps_to_bad_request() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let state = AppState::new(db, AppConfig::default());

        let request = json_request(
            "POST",
            "/api/sales",
            Some(ctx.user.id),
            &json!({ "items": [], "payment_method": "Cash" }),
        );
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("data").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_export_sets_attachment_filename() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        create_test_product(&db, ctx.outlet_id(), "Tea", 2.0, 5).await?;
        let state = AppState::new(db, AppConfig::default());

        let response = router(state)
            .oneshot(get_request("/api/products/export", ctx.user.id))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert_eq!(disposition, "attachment; filename=\"Main Store_inventory.csv\"");
        Ok(())
    }

    #[tokio::test]
    async fn test_public_booking_alerts_staff() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let state = AppState::new(db, AppConfig::default());
        let mut staff = state.alerts.subscribe(ctx.outlet_id());

        let request = json_request(
            "POST",
            &format!("/public/outlets/{}/bookings", ctx.outlet_id()),
            None,
            &json!({
                "customer_name": "Aisha",
                "requested_date": "2030-05-01",
                "requested_time": "21:00:00"
            }),
        );
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["duration_minutes"], 60);

        let alert = staff.recv().await.unwrap();
        assert_eq!(alert["type"], "booking_requested");
        assert_eq!(alert["customer"], "Aisha");
        Ok(())
    }

    #[tokio::test]
    async fn test_room_order_alerts_kitchen() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let room = create_test_room(&db, ctx.outlet_id(), "VIP Room A", 150.0).await?;
        let fries = create_test_product(&db, ctx.outlet_id(), "Fries", 4.0, 20).await?;
        let state = AppState::new(db, AppConfig::default());
        let mut kitchen = state.alerts.subscribe(ctx.outlet_id());

        let start = json_request(
            "POST",
            &format!("/api/rooms/{}/sessions", room.id),
            Some(ctx.user.id),
            &json!({ "customer_name": "Ravi" }),
        );
        let (status, body) = send(&state, start).await;
        assert_eq!(status, StatusCode::OK);
        let session_id = body["data"]["id"].as_i64().unwrap();

        let order = json_request(
            "POST",
            &format!("/api/sessions/{session_id}/orders"),
            Some(ctx.user.id),
            &json!([{ "product_id": fries.id, "quantity": 2 }]),
        );
        let (status, body) = send(&state, order).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["order"]["total_price"], 8.0);

        let alert = kitchen.recv().await.unwrap();
        assert_eq!(alert["type"], "order_alert");
        assert_eq!(alert["room"], "VIP Room A");
        assert_eq!(alert["items"][0]["qty"], 2);
        Ok(())
    }
}
