//! Payroll entity - monthly pay computation for one employee.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payroll workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PayrollStatus {
    /// Created, not yet computed
    #[sea_orm(string_value = "Draft")]
    Draft,
    /// Figures computed from attendance and sales
    #[sea_orm(string_value = "Calculated")]
    Calculated,
    /// Signed off; figures are frozen
    #[sea_orm(string_value = "Approved")]
    Approved,
    /// Paid out
    #[sea_orm(string_value = "Paid")]
    Paid,
}

/// Payroll database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payrolls")]
pub struct Model {
    /// Unique identifier for the payroll record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning outlet
    pub outlet_id: i64,
    /// Employee being paid
    pub employee_id: i64,
    /// Pay period year
    pub year: i32,
    /// Pay period month, 1-12
    pub month: i32,
    /// Sum of attendance hours in the period
    pub total_hours_worked: f64,
    /// Salary, minimum salary, or daily rate times days
    pub base_amount: f64,
    /// Commission on outlet sales
    pub commission_amount: f64,
    /// `base_amount + commission_amount`
    pub total_earnings: f64,
    /// Amount withheld
    pub deductions: f64,
    /// `total_earnings - deductions`
    pub net_pay: f64,
    /// Workflow state
    pub status: PayrollStatus,
    /// Last computation time
    pub calculated_at: Option<DateTimeUtc>,
    /// Payout time
    pub paid_at: Option<DateTimeUtc>,
}

/// Defines relationships between Payroll and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payroll record belongs to one employee
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
