//! Room session entity - a timed room rental with accruing charges.
//!
//! Charges are zero while the session runs and are frozen at checkout.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum SessionStatus {
    /// Clock running
    #[sea_orm(string_value = "Active")]
    Active,
    /// Clock stopped, room still occupied
    #[sea_orm(string_value = "Paused")]
    Paused,
    /// Checked out and billed
    #[sea_orm(string_value = "Completed")]
    Completed,
    /// Abandoned without a bill
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl SessionStatus {
    /// Whether the session still occupies its room.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }
}

/// Room session database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "room_sessions")]
pub struct Model {
    /// Unique identifier for the session
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning outlet
    pub outlet_id: i64,
    /// Occupied room
    pub room_id: i64,
    /// Guest name
    pub customer_name: String,
    /// Customer account matched at checkout
    pub customer_id: Option<i64>,
    /// Clock start
    pub start_time: DateTimeUtc,
    /// Minutes booked up front; time beyond this is extra time
    pub booked_minutes: i32,
    /// Start of the current pause
    pub paused_at: Option<DateTimeUtc>,
    /// Minutes spent in closed pauses
    pub paused_minutes: i32,
    /// Clock stop (checkout or cancellation)
    pub end_time: Option<DateTimeUtc>,
    /// Lifecycle state
    pub status: SessionStatus,
    /// Booked time charge
    pub room_charge: f64,
    /// Overtime charge
    pub extra_time_charge: f64,
    /// Kitchen and bar charge
    pub food_beverage_charge: f64,
    /// `room_charge + extra_time_charge + food_beverage_charge`
    pub total_charge: f64,
    /// Sale created at checkout
    pub sale_id: Option<i64>,
}

/// Defines relationships between RoomSession and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each session occupies one room
    #[sea_orm(
        belongs_to = "super::room::Entity",
        from = "Column::RoomId",
        to = "super::room::Column::Id"
    )]
    Room,
    /// One session has many kitchen orders
    #[sea_orm(has_many = "super::room_order::Entity")]
    Orders,
}

impl Related<super::room::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Room.def()
    }
}

impl Related<super::room_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
