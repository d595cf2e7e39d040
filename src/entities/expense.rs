//! Expense entity - operating cost recorded against an outlet.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Unique identifier for the expense
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning outlet
    pub outlet_id: i64,
    /// What was paid for (e.g. "Electricity Bill")
    pub description: String,
    /// Amount paid
    pub amount: f64,
    /// Day the expense applies to
    pub date: Date,
}

/// `Expense` has no navigable relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
