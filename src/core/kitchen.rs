//! Kitchen business logic - food and drink ordered from a room.
//!
//! Stock is taken when an order is placed, not at checkout, so the kitchen
//! board and the inventory agree while the session is still running.

use crate::{
    core::{
        inventory, money,
        product::get_product,
        session::{get_session, session_orders},
        tenant::OutletContext,
    },
    entities::{
        InventoryAction, Product, Room, RoomOrder, RoomOrderItem, RoomSession, SessionStatus,
        product, room, room_order, room_order_item, room_session,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Products in this category are billed through the room clock and hidden from the menu
pub const ROOM_RATE_CATEGORY: &str = "Room Rate";

/// One line of a room order
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    /// Product ordered
    pub product_id: i64,
    /// Units ordered
    pub quantity: i32,
}

/// An order with its items and where it goes
#[derive(Debug, Clone, Serialize)]
pub struct KitchenTicket {
    /// The order
    pub order: room_order::Model,
    /// Room to deliver to
    pub room_name: String,
    /// Guest name on the session
    pub customer_name: String,
    /// What was ordered
    pub items: Vec<room_order_item::Model>,
}

async fn order_items<C>(db: &C, order_ids: Vec<i64>) -> Result<Vec<room_order_item::Model>>
where
    C: ConnectionTrait,
{
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }
    RoomOrderItem::find()
        .filter(room_order_item::Column::OrderId.is_in(order_ids))
        .order_by_asc(room_order_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn get_order<C>(db: &C, outlet_id: i64, order_id: i64) -> Result<room_order::Model>
where
    C: ConnectionTrait,
{
    RoomOrder::find_by_id(order_id)
        .filter(room_order::Column::OutletId.eq(outlet_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("room order", order_id))
}

async fn ticket_for<C>(db: &C, order: room_order::Model) -> Result<KitchenTicket>
where
    C: ConnectionTrait,
{
    let session = get_session(db, order.outlet_id, order.session_id).await?;
    let room_name = Room::find_by_id(session.room_id)
        .one(db)
        .await?
        .map(|r| r.name)
        .unwrap_or_default();
    let items = order_items(db, vec![order.id]).await?;
    Ok(KitchenTicket {
        order,
        room_name,
        customer_name: session.customer_name,
        items,
    })
}

/// Places an order for an open session and takes the items from stock.
///
/// # Errors
/// Returns an error if:
/// - The order has no lines or a line has a non-positive quantity
/// - The session is not active or paused
/// - A product does not belong to the outlet
pub async fn place_room_order(
    db: &DatabaseConnection,
    outlet_id: i64,
    session_id: i64,
    lines: &[OrderLine],
    at: DateTime<Utc>,
) -> Result<KitchenTicket> {
    if lines.is_empty() {
        return Err(Error::validation("Order has no items"));
    }
    if let Some(bad) = lines.iter().find(|l| l.quantity <= 0) {
        return Err(Error::InvalidQuantity {
            quantity: bad.quantity,
        });
    }

    let txn = db.begin().await?;
    let session = get_session(&txn, outlet_id, session_id).await?;
    if !session.status.is_open() {
        return Err(Error::InvalidState {
            entity: "session",
            state: format!("{:?}", session.status),
            action: "order for",
        });
    }

    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let product = get_product(&txn, outlet_id, line.product_id).await?;
        priced.push((product, line.quantity));
    }
    let total: Decimal = priced
        .iter()
        .map(|(p, quantity)| money::line_total(p.selling_price, *quantity))
        .sum();

    let order = room_order::ActiveModel {
        outlet_id: Set(outlet_id),
        session_id: Set(session_id),
        total_price: Set(money::to_amount(total)),
        is_served: Set(false),
        created_at: Set(at),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let reference = format!("ROOM-ORDER-{}", order.id);
    for (product, quantity) in priced {
        room_order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(product.id),
            product_name: Set(product.name.clone()),
            quantity: Set(quantity),
            price: Set(product.selling_price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        inventory::apply_stock_change(
            &txn,
            outlet_id,
            product.id,
            InventoryAction::Sale,
            -quantity,
            Some(reference.clone()),
            None,
        )
        .await?;
    }

    let ticket = ticket_for(&txn, order).await?;
    txn.commit().await?;

    tracing::info!(
        outlet_id,
        session_id,
        order_id = ticket.order.id,
        total = ticket.order.total_price,
        "Room order placed"
    );
    Ok(ticket)
}

/// Products a guest can order from the session, excluding room-rate items.
pub async fn customer_menu(
    db: &DatabaseConnection,
    outlet_id: i64,
    session_id: i64,
) -> Result<Vec<product::Model>> {
    let session = get_session(db, outlet_id, session_id).await?;
    if !session.status.is_open() {
        return Err(Error::InvalidState {
            entity: "session",
            state: format!("{:?}", session.status),
            action: "show the menu for",
        });
    }
    Product::find()
        .filter(product::Column::OutletId.eq(outlet_id))
        .filter(
            Condition::any()
                .add(product::Column::Category.is_null())
                .add(product::Column::Category.ne(ROOM_RATE_CATEGORY)),
        )
        .order_by_asc(product::Column::Category)
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Unserved orders of the outlet, oldest first.
pub async fn pending_orders(db: &DatabaseConnection, outlet_id: i64) -> Result<Vec<KitchenTicket>> {
    let orders = RoomOrder::find()
        .filter(room_order::Column::OutletId.eq(outlet_id))
        .filter(room_order::Column::IsServed.eq(false))
        .order_by_asc(room_order::Column::CreatedAt)
        .order_by_asc(room_order::Column::Id)
        .all(db)
        .await?;
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let sessions: HashMap<i64, room_session::Model> = RoomSession::find()
        .filter(room_session::Column::Id.is_in(orders.iter().map(|o| o.session_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    let rooms: HashMap<i64, String> = Room::find()
        .filter(room::Column::OutletId.eq(outlet_id))
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect();
    let mut items: HashMap<i64, Vec<room_order_item::Model>> = HashMap::new();
    for item in order_items(db, orders.iter().map(|o| o.id).collect()).await? {
        items.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let session = sessions.get(&order.session_id);
            KitchenTicket {
                room_name: session
                    .and_then(|s| rooms.get(&s.room_id))
                    .cloned()
                    .unwrap_or_default(),
                customer_name: session.map(|s| s.customer_name.clone()).unwrap_or_default(),
                items: items.remove(&order.id).unwrap_or_default(),
                order,
            }
        })
        .collect())
}

/// Marks an order as served.
pub async fn complete_order(
    db: &DatabaseConnection,
    outlet_id: i64,
    order_id: i64,
) -> Result<room_order::Model> {
    let order = get_order(db, outlet_id, order_id).await?;
    if order.is_served {
        return Ok(order);
    }
    let mut active: room_order::ActiveModel = order.into();
    active.is_served = Set(true);
    let served = active.update(db).await?;
    tracing::info!(outlet_id, order_id, "Room order served");
    Ok(served)
}

/// Deletes an order of an open session and returns its items to stock.
pub async fn void_order(db: &DatabaseConnection, ctx: &OutletContext, order_id: i64) -> Result<()> {
    ctx.require_manager("void room orders")?;
    let outlet_id = ctx.outlet_id();

    let txn = db.begin().await?;
    let order = get_order(&txn, outlet_id, order_id).await?;
    let session = get_session(&txn, outlet_id, order.session_id).await?;
    if matches!(session.status, SessionStatus::Completed | SessionStatus::Cancelled) {
        return Err(Error::InvalidState {
            entity: "session",
            state: format!("{:?}", session.status),
            action: "void an order of",
        });
    }

    let reference = format!("VOID-ROOM-ORDER-{order_id}");
    for item in order_items(&txn, vec![order_id]).await? {
        inventory::apply_stock_change(
            &txn,
            outlet_id,
            item.product_id,
            InventoryAction::Return,
            item.quantity,
            Some(reference.clone()),
            None,
        )
        .await?;
    }

    RoomOrderItem::delete_many()
        .filter(room_order_item::Column::OrderId.eq(order_id))
        .exec(&txn)
        .await?;
    RoomOrder::delete_by_id(order_id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(outlet_id, order_id, user = %ctx.user.username, "Room order voided");
    Ok(())
}

/// Orders of a session with their items.
pub async fn session_tickets(
    db: &DatabaseConnection,
    outlet_id: i64,
    session_id: i64,
) -> Result<Vec<KitchenTicket>> {
    get_session(db, outlet_id, session_id).await?;
    let mut tickets = Vec::new();
    for order in session_orders(db, session_id).await? {
        tickets.push(ticket_for(db, order).await?);
    }
    Ok(tickets)
}
