//! Room order entity - a kitchen/bar ticket raised from a room session.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Room order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "room_orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning outlet
    pub outlet_id: i64,
    /// Session the order is billed to
    pub session_id: i64,
    /// Sum of item price times quantity
    pub total_price: f64,
    /// Delivered to the room
    pub is_served: bool,
    /// When the order was placed
    pub created_at: DateTimeUtc,
}

/// Defines relationships between RoomOrder and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one session
    #[sea_orm(
        belongs_to = "super::room_session::Entity",
        from = "Column::SessionId",
        to = "super::room_session::Column::Id"
    )]
    Session,
    /// One order has many items
    #[sea_orm(has_many = "super::room_order_item::Entity")]
    Items,
}

impl Related<super::room_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::room_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
