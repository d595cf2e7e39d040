//! Room business logic - karaoke rooms and the live room board.

use crate::{
    core::money,
    entities::{Room, RoomOrder, RoomSession, SessionStatus, room, room_order, room_session},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Input for a new room
#[derive(Debug, Clone, Deserialize)]
pub struct NewRoom {
    /// Display name
    pub name: String,
    /// Seats
    #[serde(default = "default_capacity")]
    pub capacity: i32,
    /// Rate per hour
    pub price_per_hour: f64,
}

const fn default_capacity() -> i32 {
    4
}

/// Partial update for a room
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomUpdate {
    /// New name
    pub name: Option<String>,
    /// New capacity
    pub capacity: Option<i32>,
    /// New hourly rate
    pub price_per_hour: Option<f64>,
    /// Enable or disable bookings
    pub is_active: Option<bool>,
}

/// One tile of the room board
#[derive(Debug, Clone, Serialize)]
pub struct RoomTile {
    /// The room
    pub room: room::Model,
    /// Session currently occupying the room
    pub session: Option<room_session::Model>,
    /// Food and drink ordered so far in that session
    pub order_total: f64,
}

/// Retrieves a room of the outlet.
pub async fn get_room<C>(db: &C, outlet_id: i64, room_id: i64) -> Result<room::Model>
where
    C: ConnectionTrait,
{
    Room::find_by_id(room_id)
        .filter(room::Column::OutletId.eq(outlet_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("room", room_id))
}

fn validate_capacity(capacity: i32) -> Result<i32> {
    if capacity > 0 {
        Ok(capacity)
    } else {
        Err(Error::validation(format!("Room capacity must be positive, got {capacity}")))
    }
}

/// Creates a room.
pub async fn create_room(db: &DatabaseConnection, outlet_id: i64, input: NewRoom) -> Result<room::Model> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Room name cannot be empty"));
    }
    let rate = money::require_non_negative(input.price_per_hour)?;

    let created = room::ActiveModel {
        outlet_id: Set(outlet_id),
        name: Set(name),
        capacity: Set(validate_capacity(input.capacity)?),
        price_per_hour: Set(money::to_amount(rate)),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;
    tracing::info!(outlet_id, room_id = created.id, name = %created.name, "Room created");
    Ok(created)
}

/// Applies a partial update.
pub async fn update_room(
    db: &DatabaseConnection,
    outlet_id: i64,
    room_id: i64,
    update: RoomUpdate,
) -> Result<room::Model> {
    let existing = get_room(db, outlet_id, room_id).await?;
    let mut active: room::ActiveModel = existing.into();

    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("Room name cannot be empty"));
        }
        active.name = Set(name);
    }
    if let Some(capacity) = update.capacity {
        active.capacity = Set(validate_capacity(capacity)?);
    }
    if let Some(rate) = update.price_per_hour {
        active.price_per_hour = Set(money::to_amount(money::require_non_negative(rate)?));
    }
    if let Some(is_active) = update.is_active {
        active.is_active = Set(is_active);
    }

    active.update(db).await.map_err(Into::into)
}

/// Rooms of the outlet by name.
pub async fn list_rooms(db: &DatabaseConnection, outlet_id: i64) -> Result<Vec<room::Model>> {
    Room::find()
        .filter(room::Column::OutletId.eq(outlet_id))
        .order_by_asc(room::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active rooms with their occupying session and running order total.
pub async fn room_board(db: &DatabaseConnection, outlet_id: i64) -> Result<Vec<RoomTile>> {
    let rooms = Room::find()
        .filter(room::Column::OutletId.eq(outlet_id))
        .filter(room::Column::IsActive.eq(true))
        .order_by_asc(room::Column::Name)
        .all(db)
        .await?;

    let open_sessions = RoomSession::find()
        .filter(room_session::Column::OutletId.eq(outlet_id))
        .filter(room_session::Column::Status.is_in([SessionStatus::Active, SessionStatus::Paused]))
        .all(db)
        .await?;

    let orders = if open_sessions.is_empty() {
        Vec::new()
    } else {
        RoomOrder::find()
            .filter(room_order::Column::SessionId.is_in(open_sessions.iter().map(|s| s.id)))
            .all(db)
            .await?
    };
    let mut totals: HashMap<i64, Vec<f64>> = HashMap::new();
    for order in &orders {
        totals.entry(order.session_id).or_default().push(order.total_price);
    }

    let mut by_room: HashMap<i64, room_session::Model> =
        open_sessions.into_iter().map(|s| (s.room_id, s)).collect();

    Ok(rooms
        .into_iter()
        .map(|room| {
            let session = by_room.remove(&room.id);
            let order_total = session
                .as_ref()
                .and_then(|s| totals.get(&s.id))
                .map_or(0.0, |t| money::to_amount(money::sum_amounts(t.iter().copied())));
            RoomTile {
                room,
                session,
                order_total,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{core::session, test_utils::*};
    use chrono::Utc;

    #[tokio::test]
    async fn test_create_and_update_room() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let created = create_room(
            &db,
            ctx.outlet_id(),
            NewRoom {
                name: "VIP Room A".to_string(),
                capacity: 10,
                price_per_hour: 150.0,
            },
        )
        .await?;
        assert!(created.is_active);

        let updated = update_room(
            &db,
            ctx.outlet_id(),
            created.id,
            RoomUpdate {
                price_per_hour: Some(175.0),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.price_per_hour, 175.0);
        assert!(!updated.is_active);

        let bad = update_room(
            &db,
            ctx.outlet_id(),
            created.id,
            RoomUpdate {
                capacity: Some(0),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(bad, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_room_of_other_outlet_not_found() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let other = create_test_outlet(&db, "Other", ctx.user.id).await?;
        let room = create_test_room(&db, other.id, "Elsewhere", 100.0).await?;

        let result = get_room(&db, ctx.outlet_id(), room.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_room_board_shows_occupancy() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let busy = create_test_room(&db, ctx.outlet_id(), "A Room", 100.0).await?;
        create_test_room(&db, ctx.outlet_id(), "B Room", 100.0).await?;
        let session = session::start_session(&db, ctx.outlet_id(), busy.id, Some("Ali"), 60, Utc::now()).await?;

        let board = room_board(&db, ctx.outlet_id()).await?;
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].session.as_ref().map(|s| s.id), Some(session.id));
        assert_eq!(board[0].order_total, 0.0);
        assert!(board[1].session.is_none());
        Ok(())
    }
}
