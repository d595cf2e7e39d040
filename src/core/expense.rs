//! Expense business logic - operating costs recorded against an outlet.

use crate::{
    core::{money, period::month_dates},
    entities::{Expense, expense},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};

/// Records an expense.
///
/// # Errors
/// Returns an error if the description is blank or the amount is not positive.
pub async fn add_expense(
    db: &DatabaseConnection,
    outlet_id: i64,
    description: &str,
    amount: f64,
    date: NaiveDate,
) -> Result<expense::Model> {
    let description = description.trim();
    if description.is_empty() {
        return Err(Error::validation("Expense description cannot be empty"));
    }
    let amount = money::require_positive(amount)?;

    let created = expense::ActiveModel {
        outlet_id: Set(outlet_id),
        description: Set(description.to_string()),
        amount: Set(money::to_amount(amount)),
        date: Set(date),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(outlet_id, expense_id = created.id, amount = created.amount, "Expense recorded");
    Ok(created)
}

/// Expenses dated within the month, newest first.
pub async fn list_expenses<C>(db: &C, outlet_id: i64, year: i32, month: i32) -> Result<Vec<expense::Model>>
where
    C: ConnectionTrait,
{
    let (first, next) = month_dates(year, month)?;
    Expense::find()
        .filter(expense::Column::OutletId.eq(outlet_id))
        .filter(expense::Column::Date.gte(first))
        .filter(expense::Column::Date.lt(next))
        .order_by_desc(expense::Column::Date)
        .order_by_desc(expense::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_list_expenses_by_month() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        add_expense(&db, ctx.outlet_id(), "Electricity", 120.5, date(2024, 2, 29)).await?;
        add_expense(&db, ctx.outlet_id(), "Ice delivery", 30.0, date(2024, 3, 1)).await?;
        add_expense(&db, ctx.outlet_id(), "Cleaning", 45.0, date(2024, 3, 31)).await?;

        let march = list_expenses(&db, ctx.outlet_id(), 2024, 3).await?;
        let names: Vec<&str> = march.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(names, vec!["Cleaning", "Ice delivery"]);

        let february = list_expenses(&db, ctx.outlet_id(), 2024, 2).await?;
        assert_eq!(february.len(), 1);
        assert_eq!(february[0].amount, 120.5);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_expense_rejected() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;

        let result = add_expense(&db, ctx.outlet_id(), "  ", 10.0, date(2024, 1, 1)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = add_expense(&db, ctx.outlet_id(), "Rent", -5.0, date(2024, 1, 1)).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));

        let result = list_expenses(&db, ctx.outlet_id(), 2024, 13).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        assert!(list_expenses(&db, ctx.outlet_id(), 2024, 1).await?.is_empty());
        Ok(())
    }
}
