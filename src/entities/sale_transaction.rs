//! Sale transaction entity - a completed (or voided) checkout.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tender used to settle a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PaymentMethod {
    /// Cash
    #[sea_orm(string_value = "Cash")]
    Cash,
    /// Card terminal
    #[sea_orm(string_value = "Card")]
    Card,
    /// Bank transfer
    #[sea_orm(string_value = "Transfer")]
    Transfer,
    /// Added to the customer's credit balance
    #[sea_orm(string_value = "Credit")]
    Credit,
}

/// Lifecycle of a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum SaleStatus {
    /// Settled
    #[sea_orm(string_value = "Completed")]
    Completed,
    /// Reversed by a manager
    #[sea_orm(string_value = "Voided")]
    Voided,
}

/// Where the sale originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum SaleSource {
    /// POS counter
    #[sea_orm(string_value = "Counter")]
    Counter,
    /// Karaoke room checkout
    #[sea_orm(string_value = "RoomSession")]
    RoomSession,
}

/// Sale transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_transactions")]
pub struct Model {
    /// Unique identifier for the sale
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning outlet
    pub outlet_id: i64,
    /// Linked customer account
    pub customer_id: Option<i64>,
    /// Customer name as typed at the counter
    pub customer_name: Option<String>,
    /// When the sale was settled
    pub date: DateTimeUtc,
    /// Amount charged
    pub total_amount: f64,
    /// Tender
    pub payment_method: PaymentMethod,
    /// Lifecycle state
    pub status: SaleStatus,
    /// Counter sale or room checkout
    pub source: SaleSource,
}

/// Defines relationships between SaleTransaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One sale has many line items
    #[sea_orm(has_many = "super::sale_item::Entity")]
    Items,
}

impl Related<super::sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
