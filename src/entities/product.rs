//! Product entity - a sellable catalogue item with a tracked stock level.
//!
//! Stock is kept as a plain counter; every change to it is mirrored by an
//! [`super::inventory_log`] row so the history can be audited.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning outlet
    pub outlet_id: i64,
    /// Name, unique within the outlet
    pub name: String,
    /// Optional stock keeping unit
    pub sku: Option<String>,
    /// Menu category (e.g. "Drinks", "Room Rate")
    pub category: Option<String>,
    /// Purchase cost per unit
    pub cost_price: f64,
    /// Sale price per unit
    pub selling_price: f64,
    /// Units on hand; may go negative when sales outrun recorded purchases
    pub current_stock_level: i32,
    /// Pinned to the POS favourites strip
    pub is_favorite: bool,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one outlet
    #[sea_orm(
        belongs_to = "super::outlet::Entity",
        from = "Column::OutletId",
        to = "super::outlet::Column::Id"
    )]
    Outlet,
    /// One product has many inventory log entries
    #[sea_orm(has_many = "super::inventory_log::Entity")]
    InventoryLogs,
}

impl Related<super::outlet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Outlet.def()
    }
}

impl Related<super::inventory_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
