//! Employee business logic - staff records and how they are paid.

use crate::{
    core::money,
    entities::{Employee, PaymentType, employee},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;

/// Input for a new employee
#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    /// Full name
    pub name: String,
    /// Job title
    #[serde(default)]
    pub role: String,
    /// Login linked to this employee
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Pay scheme
    pub payment_type: PaymentType,
    /// Monthly salary, minimum salary or daily rate depending on `payment_type`
    #[serde(default)]
    pub base_salary: f64,
    /// Commission in percent of outlet sales
    #[serde(default)]
    pub commission_rate: f64,
    /// Hire date
    #[serde(default)]
    pub date_joined: Option<NaiveDate>,
}

/// Partial update for an employee
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeUpdate {
    /// New name
    pub name: Option<String>,
    /// New job title
    pub role: Option<String>,
    /// New phone
    pub phone: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New pay scheme
    pub payment_type: Option<PaymentType>,
    /// New base salary
    pub base_salary: Option<f64>,
    /// New commission rate
    pub commission_rate: Option<f64>,
}

fn validate_rate(rate: f64) -> Result<f64> {
    if rate.is_finite() && (0.0..=100.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(Error::validation(format!(
            "Commission rate must be between 0 and 100, got {rate}"
        )))
    }
}

/// Retrieves an employee of the outlet.
pub async fn get_employee<C>(db: &C, outlet_id: i64, employee_id: i64) -> Result<employee::Model>
where
    C: ConnectionTrait,
{
    Employee::find_by_id(employee_id)
        .filter(employee::Column::OutletId.eq(outlet_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("employee", employee_id))
}

/// Creates an employee. A user can be linked to at most one employee per outlet.
pub async fn create_employee(
    db: &DatabaseConnection,
    outlet_id: i64,
    input: NewEmployee,
) -> Result<employee::Model> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Employee name cannot be empty"));
    }
    let base_salary = money::require_non_negative(input.base_salary)?;
    let commission_rate = validate_rate(input.commission_rate)?;

    if let Some(user_id) = input.user_id {
        let linked = Employee::find()
            .filter(employee::Column::OutletId.eq(outlet_id))
            .filter(employee::Column::UserId.eq(user_id))
            .one(db)
            .await?;
        if linked.is_some() {
            return Err(Error::Conflict {
                message: format!("User {user_id} is already linked to an employee of this outlet"),
            });
        }
    }

    let created = employee::ActiveModel {
        outlet_id: Set(outlet_id),
        user_id: Set(input.user_id),
        name: Set(name),
        role: Set(input.role),
        phone: Set(input.phone),
        email: Set(input.email),
        payment_type: Set(input.payment_type),
        base_salary: Set(money::to_amount(base_salary)),
        commission_rate: Set(commission_rate),
        is_active: Set(true),
        date_joined: Set(input.date_joined),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(outlet_id, employee_id = created.id, name = %created.name, "Employee created");
    Ok(created)
}

/// Applies a partial update.
pub async fn update_employee(
    db: &DatabaseConnection,
    outlet_id: i64,
    employee_id: i64,
    update: EmployeeUpdate,
) -> Result<employee::Model> {
    let existing = get_employee(db, outlet_id, employee_id).await?;
    let mut active: employee::ActiveModel = existing.into();

    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("Employee name cannot be empty"));
        }
        active.name = Set(name);
    }
    if let Some(role) = update.role {
        active.role = Set(role);
    }
    if let Some(phone) = update.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(email) = update.email {
        active.email = Set(Some(email));
    }
    if let Some(payment_type) = update.payment_type {
        active.payment_type = Set(payment_type);
    }
    if let Some(salary) = update.base_salary {
        active.base_salary = Set(money::to_amount(money::require_non_negative(salary)?));
    }
    if let Some(rate) = update.commission_rate {
        active.commission_rate = Set(validate_rate(rate)?);
    }

    active.update(db).await.map_err(Into::into)
}

/// Marks an employee inactive; they keep their history but can no longer check in.
pub async fn deactivate_employee(
    db: &DatabaseConnection,
    outlet_id: i64,
    employee_id: i64,
) -> Result<employee::Model> {
    let existing = get_employee(db, outlet_id, employee_id).await?;
    let mut active: employee::ActiveModel = existing.into();
    active.is_active = Set(false);
    let updated = active.update(db).await?;
    tracing::info!(outlet_id, employee_id, "Employee deactivated");
    Ok(updated)
}

/// Employees of the outlet by name, optionally only active ones.
pub async fn list_employees<C>(db: &C, outlet_id: i64, active_only: bool) -> Result<Vec<employee::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Employee::find().filter(employee::Column::OutletId.eq(outlet_id));
    if active_only {
        query = query.filter(employee::Column::IsActive.eq(true));
    }
    query
        .order_by_asc(employee::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}
