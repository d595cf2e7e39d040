//! User entity - an authenticated identity supplied by the fronting proxy.
//!
//! Users own outlets, may be linked to exactly one employee record, and
//! superusers can act on any outlet.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name
    #[sea_orm(unique)]
    pub username: String,
    /// Superusers may act on every outlet and perform manager-only operations
    pub is_superuser: bool,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many outlets
    #[sea_orm(has_many = "super::outlet::Entity")]
    Outlets,
}

impl Related<super::outlet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Outlets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
