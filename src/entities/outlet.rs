//! Outlet entity - the tenant that scopes every other business record.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outlet database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "outlets")]
pub struct Model {
    /// Unique identifier for the outlet
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Store name, also used in catalogue CSV column headers
    pub name: String,
    /// Owning user
    pub owner_id: i64,
    /// Free-form address or description
    pub location: Option<String>,
}

/// Defines relationships between Outlet and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each outlet belongs to one owner
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,
    /// One outlet has many rooms
    #[sea_orm(has_many = "super::room::Entity")]
    Rooms,
    /// One outlet has many employees
    #[sea_orm(has_many = "super::employee::Entity")]
    Employees,
    /// One outlet has many products
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::room::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rooms.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employees.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
