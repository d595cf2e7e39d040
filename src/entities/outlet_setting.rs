//! Outlet setting entity - per-outlet preferences.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outlet setting database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "outlet_settings")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Outlet these settings belong to (one row per outlet)
    #[sea_orm(unique)]
    pub outlet_id: i64,
    /// Where booking notifications are addressed
    pub notification_email: Option<String>,
    /// Tax percentage printed on receipts
    pub tax_rate: f64,
}

/// `OutletSetting` has no navigable relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
