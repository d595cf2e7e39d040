//! Employee entity - staff member of an outlet and the unit of payroll.
//!
//! `base_salary` means different things per [`PaymentType`]: the monthly
//! salary for permanent staff, the guaranteed minimum for commission staff,
//! and the rate per attended day for daily-rated staff.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How an employee is paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PaymentType {
    /// Fixed monthly salary
    #[sea_orm(string_value = "P")]
    Permanent,
    /// Minimum salary plus a percentage of outlet sales
    #[sea_orm(string_value = "C")]
    Commission,
    /// Daily rate times attended days
    #[sea_orm(string_value = "D")]
    Daily,
}

/// Employee database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    /// Unique identifier for the employee
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning outlet
    pub outlet_id: i64,
    /// Linked login, if the employee uses the system
    pub user_id: Option<i64>,
    /// Display name
    pub name: String,
    /// Job title, e.g. "Cashier"
    pub role: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Payment structure
    pub payment_type: PaymentType,
    /// Monthly salary, minimum salary, or daily rate depending on `payment_type`
    pub base_salary: f64,
    /// Commission percentage of outlet sales
    pub commission_rate: f64,
    /// Inactive employees are skipped by payroll and cannot check in
    pub is_active: bool,
    /// Hire date
    pub date_joined: Option<Date>,
}

/// Defines relationships between Employee and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each employee belongs to one outlet
    #[sea_orm(
        belongs_to = "super::outlet::Entity",
        from = "Column::OutletId",
        to = "super::outlet::Column::Id"
    )]
    Outlet,
    /// One employee has many attendance records
    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendances,
    /// One employee has many payroll records
    #[sea_orm(has_many = "super::payroll::Entity")]
    Payrolls,
}

impl Related<super::outlet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Outlet.def()
    }
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendances.def()
    }
}

impl Related<super::payroll::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payrolls.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
