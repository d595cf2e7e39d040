//! Customer entity - loyalty and store-credit account within an outlet.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    /// Unique identifier for the customer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning outlet
    pub outlet_id: i64,
    /// Name; matched case-insensitively when sales reference customers by name
    pub name: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Lifetime credit extended to this customer
    pub total_credit: f64,
    /// Outstanding debt
    pub current_balance: f64,
    /// Completed visits (counter sales and room checkouts)
    pub visit_count: i32,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Defines relationships between Customer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One customer has many credit payments
    #[sea_orm(has_many = "super::credit_payment::Entity")]
    CreditPayments,
}

impl Related<super::credit_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
