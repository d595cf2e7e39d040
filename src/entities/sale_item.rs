//! Sale item entity - one cart line of a sale.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_items")]
pub struct Model {
    /// Unique identifier for the line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent sale
    pub sale_id: i64,
    /// Product sold; kept nullable so deleted products do not erase history
    pub product_id: Option<i64>,
    /// Product name at the time of sale
    pub product_name: String,
    /// Units sold
    pub quantity: i32,
    /// Unit price charged
    pub price: f64,
}

/// Defines relationships between SaleItem and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one sale
    #[sea_orm(
        belongs_to = "super::sale_transaction::Entity",
        from = "Column::SaleId",
        to = "super::sale_transaction::Column::Id"
    )]
    Sale,
}

impl Related<super::sale_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
