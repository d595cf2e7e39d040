//! Inventory log entity - one row per stock movement.
//!
//! `quantity_changed` is signed: positive for additions, negative for
//! deductions, and `new_level = previous_level + quantity_changed` always holds.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Why stock moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum InventoryAction {
    /// Sold at the counter or ordered from a room
    #[sea_orm(string_value = "Sale")]
    Sale,
    /// Stock received from a supplier
    #[sea_orm(string_value = "Purchase")]
    Purchase,
    /// Manual correction after a count
    #[sea_orm(string_value = "Adjustment")]
    Adjustment,
    /// Wasted or broken stock
    #[sea_orm(string_value = "Spoilage")]
    Spoilage,
    /// Moved between outlets
    #[sea_orm(string_value = "Transfer")]
    Transfer,
    /// Restored by a voided sale or kitchen order
    #[sea_orm(string_value = "Return")]
    Return,
}

/// Inventory log database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_logs")]
pub struct Model {
    /// Unique identifier for the log entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning outlet
    pub outlet_id: i64,
    /// Product whose stock moved
    pub product_id: i64,
    /// Reason for the movement
    pub action: InventoryAction,
    /// Signed change applied to the stock level
    pub quantity_changed: i32,
    /// Stock level before the change
    pub previous_level: i32,
    /// Stock level after the change
    pub new_level: i32,
    /// Sale number, order number, PO number, etc.
    pub reference: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// When the movement was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between InventoryLog and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each log entry belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
