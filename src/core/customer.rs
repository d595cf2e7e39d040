//! Customer business logic - loyalty counters and store credit.
//!
//! Credit is a running balance: credit sales add to `current_balance` and
//! `total_credit`, credit payments subtract from `current_balance` only.
//! Counter updates use atomic column expressions so concurrent checkouts
//! cannot lose a visit or a balance change.

use crate::{
    core::{money, report::ProductQuantity},
    entities::{
        CreditPayment, Customer, SaleItem, SaleTransaction, SaleStatus, credit_payment, customer,
        sale_item, sale_transaction,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{
    QueryOrder, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func, SimpleExpr},
};
use serde::{Deserialize, Serialize};

/// Input for a new customer
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    /// Display name
    pub name: String,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// A customer's purchase history and favourite products
#[derive(Debug, Clone, Serialize)]
pub struct CustomerHistory {
    /// The customer
    pub customer: customer::Model,
    /// Sales linked to the customer, newest first
    pub sales: Vec<sale_transaction::Model>,
    /// Top 10 products by quantity bought
    pub preferences: Vec<ProductQuantity>,
}

/// Retrieves one customer, failing if it does not belong to the outlet.
pub async fn get_customer<C>(db: &C, outlet_id: i64, customer_id: i64) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    Customer::find_by_id(customer_id)
        .filter(customer::Column::OutletId.eq(outlet_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("customer", customer_id))
}

/// Finds a customer by name, ignoring case and surrounding whitespace.
///
/// Both sides are folded by SQLite's `lower()`, which only folds ASCII, so
/// "Özil" and "ÖZIL" match but "özil" does not.
pub async fn find_customer_by_name<C>(
    db: &C,
    outlet_id: i64,
    name: &str,
) -> Result<Option<customer::Model>>
where
    C: ConnectionTrait,
{
    let wanted = Func::lower(Expr::val(name.trim()));
    Customer::find()
        .filter(customer::Column::OutletId.eq(outlet_id))
        .filter(Expr::expr(Func::lower(Expr::col(customer::Column::Name))).eq(wanted))
        .order_by_asc(customer::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a customer by name or creates one with zero balances.
pub async fn find_or_create_customer<C>(
    db: &C,
    outlet_id: i64,
    name: &str,
) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_customer_by_name(db, outlet_id, name).await? {
        return Ok(existing);
    }
    insert_customer(
        db,
        outlet_id,
        NewCustomer {
            name: name.to_string(),
            phone: None,
            notes: None,
        },
    )
    .await
}

async fn insert_customer<C>(db: &C, outlet_id: i64, input: NewCustomer) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Customer name cannot be empty"));
    }
    let created = customer::ActiveModel {
        outlet_id: Set(outlet_id),
        name: Set(name),
        phone: Set(input.phone),
        total_credit: Set(0.0),
        current_balance: Set(0.0),
        visit_count: Set(0),
        notes: Set(input.notes),
        ..Default::default()
    }
    .insert(db)
    .await?;
    tracing::info!(outlet_id, customer_id = created.id, "Customer created");
    Ok(created)
}

/// Creates a customer.
pub async fn create_customer(
    db: &DatabaseConnection,
    outlet_id: i64,
    input: NewCustomer,
) -> Result<customer::Model> {
    insert_customer(db, outlet_id, input).await
}

/// All customers of the outlet, by name.
pub async fn list_customers(
    db: &DatabaseConnection,
    outlet_id: i64,
) -> Result<Vec<customer::Model>> {
    Customer::find()
        .filter(customer::Column::OutletId.eq(outlet_id))
        .order_by_asc(customer::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Customers who owe money, largest balance first.
pub async fn credit_list(db: &DatabaseConnection, outlet_id: i64) -> Result<Vec<customer::Model>> {
    Customer::find()
        .filter(customer::Column::OutletId.eq(outlet_id))
        .filter(customer::Column::CurrentBalance.gt(0.0))
        .order_by_desc(customer::Column::CurrentBalance)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Balance column shifted by `amount` and rounded to cents in the same statement.
fn shifted(column: customer::Column, amount: f64) -> SimpleExpr {
    Func::round_with_precision(Expr::col(column).add(amount), 2).into()
}

async fn update_counters<C>(db: &C, customer_id: i64, visits: i32, credit: Option<Decimal>) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut update = Customer::update_many()
        .col_expr(
            customer::Column::VisitCount,
            Expr::col(customer::Column::VisitCount).add(visits),
        )
        .filter(customer::Column::Id.eq(customer_id));

    if let Some(amount) = credit {
        let amount = money::to_amount(amount);
        update = update
            .col_expr(
                customer::Column::CurrentBalance,
                shifted(customer::Column::CurrentBalance, amount),
            )
            .col_expr(
                customer::Column::TotalCredit,
                shifted(customer::Column::TotalCredit, amount),
            );
    }

    update.exec(db).await?;
    Ok(())
}

/// Counts a visit and, for credit sales, adds `credit` to the customer's debt.
pub async fn register_visit<C>(db: &C, customer_id: i64, credit: Option<Decimal>) -> Result<()>
where
    C: ConnectionTrait,
{
    update_counters(db, customer_id, 1, credit).await
}

/// Undoes [`register_visit`] for a voided sale.
pub async fn reverse_visit<C>(db: &C, customer_id: i64, credit: Option<Decimal>) -> Result<()>
where
    C: ConnectionTrait,
{
    update_counters(db, customer_id, -1, credit.map(|amount| -amount)).await
}

/// Records a payment against a customer's credit balance.
///
/// # Errors
/// Returns an error if:
/// - The amount is not a positive finite number
/// - The amount exceeds the outstanding balance
/// - The customer does not belong to the outlet
pub async fn record_credit_payment(
    db: &DatabaseConnection,
    outlet_id: i64,
    customer_id: i64,
    amount: f64,
    notes: Option<String>,
) -> Result<(credit_payment::Model, customer::Model)> {
    let amount = money::require_positive(amount)?;

    let txn = db.begin().await?;
    let customer = get_customer(&txn, outlet_id, customer_id).await?;
    let balance = money::dec(customer.current_balance);
    if amount > balance {
        return Err(Error::Overpayment {
            amount: money::to_amount(amount),
            balance: customer.current_balance,
        });
    }

    let payment = credit_payment::ActiveModel {
        outlet_id: Set(outlet_id),
        customer_id: Set(customer_id),
        amount_paid: Set(money::to_amount(amount)),
        notes: Set(notes.or_else(|| Some("Partial payment received".to_string()))),
        date: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut active: customer::ActiveModel = customer.into();
    active.current_balance = Set(money::to_amount(balance - amount));
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    tracing::info!(
        outlet_id,
        customer_id,
        amount = payment.amount_paid,
        remaining = updated.current_balance,
        "Credit payment recorded"
    );
    Ok((payment, updated))
}

/// Credit payments of a customer, newest first.
pub async fn credit_payments(
    db: &DatabaseConnection,
    outlet_id: i64,
    customer_id: i64,
) -> Result<Vec<credit_payment::Model>> {
    CreditPayment::find()
        .filter(credit_payment::Column::OutletId.eq(outlet_id))
        .filter(credit_payment::Column::CustomerId.eq(customer_id))
        .order_by_desc(credit_payment::Column::Date)
        .order_by_desc(credit_payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sales history and top products of a customer.
pub async fn customer_history(
    db: &DatabaseConnection,
    outlet_id: i64,
    customer_id: i64,
) -> Result<CustomerHistory> {
    let customer = get_customer(db, outlet_id, customer_id).await?;

    let sales = SaleTransaction::find()
        .filter(sale_transaction::Column::OutletId.eq(outlet_id))
        .filter(sale_transaction::Column::CustomerId.eq(customer_id))
        .order_by_desc(sale_transaction::Column::Date)
        .order_by_desc(sale_transaction::Column::Id)
        .all(db)
        .await?;

    let completed_ids: Vec<i64> = sales
        .iter()
        .filter(|s| s.status == SaleStatus::Completed)
        .map(|s| s.id)
        .collect();
    let items = if completed_ids.is_empty() {
        Vec::new()
    } else {
        SaleItem::find()
            .filter(sale_item::Column::SaleId.is_in(completed_ids))
            .all(db)
            .await?
    };
    let preferences = crate::core::report::top_products(
        items
            .iter()
            .filter(|i| i.product_id.is_some())
            .map(|i| (i.product_name.as_str(), i.quantity)),
        10,
    );

    Ok(CustomerHistory {
        customer,
        sales,
        preferences,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_find_by_name_is_case_insensitive() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let created = create_test_customer(&db, ctx.outlet_id(), "Aminath").await?;

        let found = find_customer_by_name(&db, ctx.outlet_id(), "  aMiNaTh ").await?;
        assert_eq!(found.unwrap().id, created.id);

        let again = find_or_create_customer(&db, ctx.outlet_id(), "AMINATH").await?;
        assert_eq!(again.id, created.id);
        assert_eq!(list_customers(&db, ctx.outlet_id()).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_visit_with_credit() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let customer = create_test_customer(&db, ctx.outlet_id(), "Ali").await?;

        register_visit(&db, customer.id, Some(Decimal::new(4550, 2))).await?;
        register_visit(&db, customer.id, None).await?;

        let reloaded = get_customer(&db, ctx.outlet_id(), customer.id).await?;
        assert_eq!(reloaded.visit_count, 2);
        assert_eq!(reloaded.current_balance, 45.5);
        assert_eq!(reloaded.total_credit, 45.5);
        Ok(())
    }

    #[tokio::test]
    async fn test_balances_stay_rounded_to_cents() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let customer = create_test_customer(&db, ctx.outlet_id(), "Ali").await?;

        register_visit(&db, customer.id, Some(Decimal::new(1, 1))).await?;
        register_visit(&db, customer.id, Some(Decimal::new(2, 1))).await?;
        let owing = get_customer(&db, ctx.outlet_id(), customer.id).await?;
        assert_eq!(owing.current_balance, 0.3);
        assert_eq!(owing.total_credit, 0.3);

        reverse_visit(&db, customer.id, Some(Decimal::new(1, 1))).await?;
        reverse_visit(&db, customer.id, Some(Decimal::new(2, 1))).await?;
        let settled = get_customer(&db, ctx.outlet_id(), customer.id).await?;
        assert_eq!(settled.current_balance, 0.0);
        assert_eq!(settled.total_credit, 0.0);
        assert_eq!(settled.visit_count, 0);
        assert!(credit_list(&db, ctx.outlet_id()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_non_ascii_names_match_themselves() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let created = create_test_customer(&db, ctx.outlet_id(), "Özil").await?;

        let exact = find_customer_by_name(&db, ctx.outlet_id(), "Özil").await?;
        assert_eq!(exact.unwrap().id, created.id);
        let shouted = find_customer_by_name(&db, ctx.outlet_id(), "ÖZIL").await?;
        assert_eq!(shouted.unwrap().id, created.id);

        find_or_create_customer(&db, ctx.outlet_id(), " Özil ").await?;
        assert_eq!(list_customers(&db, ctx.outlet_id()).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_credit_payment_reduces_balance() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let customer = create_test_customer(&db, ctx.outlet_id(), "Ali").await?;
        register_visit(&db, customer.id, Some(Decimal::from(100))).await?;

        let (payment, updated) =
            record_credit_payment(&db, ctx.outlet_id(), customer.id, 40.0, None).await?;
        assert_eq!(payment.amount_paid, 40.0);
        assert_eq!(payment.notes.as_deref(), Some("Partial payment received"));
        assert_eq!(updated.current_balance, 60.0);
        assert_eq!(updated.total_credit, 100.0);

        let payments = credit_payments(&db, ctx.outlet_id(), customer.id).await?;
        assert_eq!(payments.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_credit_payment_rejects_overpayment_and_zero() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let customer = create_test_customer(&db, ctx.outlet_id(), "Ali").await?;
        register_visit(&db, customer.id, Some(Decimal::from(20))).await?;

        let result = record_credit_payment(&db, ctx.outlet_id(), customer.id, 25.0, None).await;
        assert!(matches!(result, Err(Error::Overpayment { .. })));

        let result = record_credit_payment(&db, ctx.outlet_id(), customer.id, 0.0, None).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));

        let unchanged = get_customer(&db, ctx.outlet_id(), customer.id).await?;
        assert_eq!(unchanged.current_balance, 20.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_credit_list_only_debtors_sorted() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let small = create_test_customer(&db, ctx.outlet_id(), "Small").await?;
        let large = create_test_customer(&db, ctx.outlet_id(), "Large").await?;
        create_test_customer(&db, ctx.outlet_id(), "Clear").await?;
        register_visit(&db, small.id, Some(Decimal::from(5))).await?;
        register_visit(&db, large.id, Some(Decimal::from(50))).await?;

        let debtors = credit_list(&db, ctx.outlet_id()).await?;
        let names: Vec<&str> = debtors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Large", "Small"]);
        Ok(())
    }
}
