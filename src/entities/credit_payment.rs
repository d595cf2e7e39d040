//! Credit payment entity - money received against a customer's credit balance.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Credit payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning outlet
    pub outlet_id: i64,
    /// Customer paying down their balance
    pub customer_id: i64,
    /// Amount received
    pub amount_paid: f64,
    /// Free-form notes
    pub notes: Option<String>,
    /// When the payment was received
    pub date: DateTimeUtc,
}

/// Defines relationships between CreditPayment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
