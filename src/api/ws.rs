//! Staff WebSocket - joins a socket to its outlet's alert group.
//!
//! GET /ws/staff/{outlet_id}
//!
//! - Server → staff: every alert published to the outlet (order alerts,
//!   booking requests, and frames sent by other staff sockets)
//! - Staff → server: any JSON text frame, rebroadcast to the whole group
//!   including the sender. Frames that are not JSON are ignored.

use super::AppState;
use crate::{
    entities::Outlet,
    errors::{Error, Result},
};
use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use sea_orm::EntityTrait;
use tokio::sync::broadcast;

/// Upgrades the request after checking that the outlet exists.
pub async fn staff_socket(
    State(state): State<AppState>,
    Path(outlet_id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse> {
    Outlet::find_by_id(outlet_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| Error::not_found("outlet", outlet_id))?;
    Ok(ws.on_upgrade(move |socket| staff_session(socket, state, outlet_id)))
}

async fn staff_session(socket: WebSocket, state: AppState, outlet_id: i64) {
    let (mut sink, mut stream) = socket.split();
    let mut alerts = state.alerts.subscribe(outlet_id);
    tracing::info!(outlet_id, "Staff socket connected");

    loop {
        tokio::select! {
            alert = alerts.recv() => {
                match alert {
                    Ok(message) => {
                        if sink.send(Message::Text(message.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(outlet_id, skipped, "Staff socket lagged, alerts dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<serde_json::Value>(&text) {
                            Ok(message) => {
                                state.alerts.publish(outlet_id, message);
                            }
                            Err(e) => tracing::debug!(outlet_id, error = %e, "Ignoring non-JSON frame"),
                        }
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::info!(outlet_id, "Staff socket disconnected");
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{api::router, config::AppConfig, test_utils::*};
    use serde_json::{Value, json};
    use tokio::net::TcpStream;
    use tokio_tungstenite::{
        MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message as Frame,
    };

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn spawn_server(state: AppState) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        addr
    }

    async fn connect(addr: std::net::SocketAddr, outlet_id: i64) -> Client {
        let (client, _) = connect_async(format!("ws://{addr}/ws/staff/{outlet_id}"))
            .await
            .unwrap();
        client
    }

    async fn next_json(client: &mut Client) -> Value {
        loop {
            let frame = client.next().await.unwrap().unwrap();
            assert!(!frame.is_close(), "socket closed");
            if let Frame::Text(text) = frame {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_json_frames_reach_the_group_and_garbage_is_dropped() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let state = AppState::new(db, AppConfig::default());
        let mut listener = state.alerts.subscribe(ctx.outlet_id());
        let addr = spawn_server(state).await;

        let mut first = connect(addr, ctx.outlet_id()).await;
        first.send(Frame::text("not json")).await.unwrap();
        first.send(Frame::text(json!({ "type": "hello" }).to_string())).await.unwrap();

        // The sender is part of the group, so the first frame it gets back is the JSON one
        assert_eq!(next_json(&mut first).await["type"], "hello");
        assert_eq!(listener.recv().await.unwrap()["type"], "hello");

        // A second socket sees its own echo once subscribed, then frames from the first
        let mut second = connect(addr, ctx.outlet_id()).await;
        second.send(Frame::text(json!({ "type": "ready" }).to_string())).await.unwrap();
        assert_eq!(next_json(&mut second).await["type"], "ready");
        assert_eq!(next_json(&mut first).await["type"], "ready");

        first
            .send(Frame::text(json!({ "type": "room_cleaned", "room": 3 }).to_string()))
            .await
            .unwrap();
        let forwarded = next_json(&mut second).await;
        assert_eq!(forwarded["type"], "room_cleaned");
        assert_eq!(forwarded["room"], 3);

        assert_eq!(listener.recv().await.unwrap()["type"], "ready");
        assert_eq!(listener.recv().await.unwrap()["type"], "room_cleaned");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_outlet_is_not_upgraded() -> Result<()> {
        let state = AppState::new(setup_test_db().await?, AppConfig::default());
        let addr = spawn_server(state).await;
        let result = connect_async(format!("ws://{addr}/ws/staff/999")).await;
        assert!(result.is_err());
        Ok(())
    }
}
