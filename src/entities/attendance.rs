//! Attendance entity - one check-in/check-out pair per employee per day.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendance database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendances")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning outlet
    pub outlet_id: i64,
    /// Employee who attended
    pub employee_id: i64,
    /// Shift date (the check-in date for overnight shifts)
    pub date: Date,
    /// Clock-in time
    pub check_in_time: Option<Time>,
    /// Clock-out time; earlier than check-in means the shift crossed midnight
    pub check_out_time: Option<Time>,
    /// Hours between check-in and check-out, 2 decimal places
    pub hours_worked: f64,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Defines relationships between Attendance and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each record belongs to one employee
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
