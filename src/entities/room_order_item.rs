//! Room order item entity - one line of a kitchen/bar ticket.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Room order item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "room_order_items")]
pub struct Model {
    /// Unique identifier for the line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent order
    pub order_id: i64,
    /// Product ordered
    pub product_id: i64,
    /// Product name at order time
    pub product_name: String,
    /// Units ordered
    pub quantity: i32,
    /// Unit price
    pub price: f64,
}

/// Defines relationships between RoomOrderItem and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one order
    #[sea_orm(
        belongs_to = "super::room_order::Entity",
        from = "Column::OrderId",
        to = "super::room_order::Column::Id"
    )]
    Order,
}

impl Related<super::room_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
