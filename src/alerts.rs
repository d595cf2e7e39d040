//! Outlet-scoped alert fan-out.
//!
//! Staff screens of an outlet share one broadcast channel. Kitchen orders and
//! booking requests are published to it by the HTTP handlers, and every JSON
//! frame a staff socket sends is rebroadcast to the same group.
//!
//! Delivery is best effort: with no subscribers a message is dropped, and a
//! subscriber that falls behind skips what it missed.

use crate::{core::kitchen::KitchenTicket, entities::booking_request};
use dashmap::DashMap;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Messages buffered per outlet before slow subscribers start lagging
const CHANNEL_CAPACITY: usize = 256;

/// Broadcast channels keyed by outlet ID.
#[derive(Clone, Default)]
pub struct AlertHub {
    groups: Arc<DashMap<i64, broadcast::Sender<Value>>>,
}

impl AlertHub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, outlet_id: i64) -> broadcast::Sender<Value> {
        self.groups
            .entry(outlet_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Joins the outlet's group.
    #[must_use]
    pub fn subscribe(&self, outlet_id: i64) -> broadcast::Receiver<Value> {
        self.sender(outlet_id).subscribe()
    }

    /// Sends `message` to every subscriber of the outlet and returns how many
    /// received it.
    pub fn publish(&self, outlet_id: i64, message: Value) -> usize {
        // send fails only when nobody listens
        let delivered = self.sender(outlet_id).send(message).unwrap_or(0);
        tracing::debug!(outlet_id, delivered, "Alert published");
        delivered
    }
}

/// Payload announcing a new room order to the kitchen.
#[must_use]
pub fn order_alert(ticket: &KitchenTicket) -> Value {
    let items: Vec<Value> = ticket
        .items
        .iter()
        .map(|item| json!({ "name": item.product_name, "qty": item.quantity }))
        .collect();
    json!({
        "type": "order_alert",
        "order_id": ticket.order.id,
        "session_id": ticket.order.session_id,
        "room": ticket.room_name,
        "customer": ticket.customer_name,
        "total": ticket.order.total_price,
        "items": items,
        "created_at": ticket.order.created_at,
    })
}

/// Payload announcing a booking request that awaits approval.
#[must_use]
pub fn booking_requested(booking: &booking_request::Model) -> Value {
    json!({
        "type": "booking_requested",
        "booking_id": booking.id,
        "customer": booking.customer_name,
        "phone": booking.phone_number,
        "date": booking.requested_date,
        "time": booking.requested_time,
        "duration_minutes": booking.duration_minutes,
    })
}
