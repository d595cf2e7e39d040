//! Sale business logic - counter checkout, voiding and sales reporting.
//!
//! Room checkouts reuse [`insert_sale`] so both kinds of sale share the same
//! customer handling and item bookkeeping.

use crate::{
    core::{
        customer, inventory, money, outlet,
        period::day_bounds,
        product::get_product,
        report::{ProductQuantity, top_products},
        tenant::OutletContext,
    },
    entities::{
        InventoryAction, PaymentMethod, SaleItem, SaleSource, SaleStatus, SaleTransaction,
        customer as customer_entity, outlet as outlet_entity, sale_item, sale_transaction,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One line of a POS cart
#[derive(Debug, Clone, Deserialize)]
pub struct CartLine {
    /// Product sold
    pub product_id: i64,
    /// Units sold
    pub quantity: i32,
    /// Unit price override; the product's selling price when absent
    #[serde(default)]
    pub price: Option<f64>,
}

/// A counter sale as submitted by the POS
#[derive(Debug, Clone, Deserialize)]
pub struct SaleRequest {
    /// Cart lines
    pub items: Vec<CartLine>,
    /// Tender
    pub payment_method: PaymentMethod,
    /// Existing customer account
    #[serde(default)]
    pub customer_id: Option<i64>,
    /// Customer typed by name; matched case-insensitively or created
    #[serde(default)]
    pub customer_name: Option<String>,
}

/// A priced line ready to be stored as a sale item.
#[derive(Debug, Clone)]
pub struct PricedLine {
    /// Source product, `None` for service lines such as room time
    pub product_id: Option<i64>,
    /// Name printed on the receipt
    pub product_name: String,
    /// Units
    pub quantity: i32,
    /// Unit price
    pub price: Decimal,
}

impl PricedLine {
    fn total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A sale with its lines
#[derive(Debug, Clone, Serialize)]
pub struct SaleWithItems {
    /// The sale
    pub sale: sale_transaction::Model,
    /// Its lines
    pub items: Vec<sale_item::Model>,
}

/// Everything printed on a receipt
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    /// The sale
    pub sale: sale_transaction::Model,
    /// Its lines
    pub items: Vec<sale_item::Model>,
    /// Issuing outlet
    pub outlet: outlet_entity::Model,
    /// Tax rate in percent from the outlet settings
    pub tax_rate: f64,
}

/// Revenue per tender
#[derive(Debug, Clone, Serialize)]
pub struct PaymentTotal {
    /// Tender
    pub payment_method: PaymentMethod,
    /// Completed sales paid this way
    pub total: f64,
    /// Number of sales
    pub count: usize,
}

/// End-of-day overview
#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    /// Summarised day
    pub date: NaiveDate,
    /// Revenue of completed sales
    pub revenue: f64,
    /// Number of completed sales
    pub sale_count: usize,
    /// Revenue split by tender
    pub by_payment_method: Vec<PaymentTotal>,
    /// Top 10 products by units sold
    pub best_sellers: Vec<ProductQuantity>,
    /// Last 20 completed sales
    pub recent_sales: Vec<sale_transaction::Model>,
}

/// Stores a sale and its items, then updates the customer's visit count and credit.
///
/// Stock is not touched here; callers decide whether the lines move stock.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn insert_sale<C>(
    db: &C,
    outlet_id: i64,
    customer: Option<&customer_entity::Model>,
    customer_name: Option<String>,
    payment_method: PaymentMethod,
    source: SaleSource,
    lines: &[PricedLine],
    at: DateTime<Utc>,
) -> Result<SaleWithItems>
where
    C: ConnectionTrait,
{
    if payment_method == PaymentMethod::Credit && customer.is_none() {
        return Err(Error::validation("Credit sales require a customer"));
    }

    let total = money::round_money(lines.iter().map(PricedLine::total).sum());
    let sale = sale_transaction::ActiveModel {
        outlet_id: Set(outlet_id),
        customer_id: Set(customer.map(|c| c.id)),
        customer_name: Set(customer.map(|c| c.name.clone()).or(customer_name)),
        date: Set(at),
        total_amount: Set(money::to_amount(total)),
        payment_method: Set(payment_method),
        status: Set(SaleStatus::Completed),
        source: Set(source),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let item = sale_item::ActiveModel {
            sale_id: Set(sale.id),
            product_id: Set(line.product_id),
            product_name: Set(line.product_name.clone()),
            quantity: Set(line.quantity),
            price: Set(money::to_amount(line.price)),
            ..Default::default()
        }
        .insert(db)
        .await?;
        items.push(item);
    }

    if let Some(customer) = customer {
        let credit = (payment_method == PaymentMethod::Credit).then_some(total);
        customer::register_visit(db, customer.id, credit).await?;
    }

    Ok(SaleWithItems { sale, items })
}

/// Resolves the customer of a sale from an explicit ID or a typed name.
pub(crate) async fn resolve_customer<C>(
    db: &C,
    outlet_id: i64,
    customer_id: Option<i64>,
    customer_name: Option<&str>,
) -> Result<Option<customer_entity::Model>>
where
    C: ConnectionTrait,
{
    if let Some(id) = customer_id {
        return customer::get_customer(db, outlet_id, id).await.map(Some);
    }
    match customer_name.map(str::trim) {
        Some(name) if !name.is_empty() => customer::find_or_create_customer(db, outlet_id, name)
            .await
            .map(Some),
        _ => Ok(None),
    }
}

/// Records a counter sale.
///
/// # Errors
/// Returns an error if:
/// - The cart is empty or a line has a non-positive quantity
/// - A price override is negative
/// - A product does not belong to the outlet
/// - Credit is used without a customer
pub async fn submit_sale(
    db: &DatabaseConnection,
    outlet_id: i64,
    request: SaleRequest,
    at: DateTime<Utc>,
) -> Result<SaleWithItems> {
    if request.items.is_empty() {
        return Err(Error::validation("Cart is empty"));
    }
    if let Some(bad) = request.items.iter().find(|l| l.quantity <= 0) {
        return Err(Error::InvalidQuantity {
            quantity: bad.quantity,
        });
    }

    let txn = db.begin().await?;

    let mut lines = Vec::with_capacity(request.items.len());
    for line in &request.items {
        let product = get_product(&txn, outlet_id, line.product_id).await?;
        let price = match line.price {
            Some(price) => money::require_non_negative(price)?,
            None => money::dec(product.selling_price),
        };
        lines.push(PricedLine {
            product_id: Some(product.id),
            product_name: product.name,
            quantity: line.quantity,
            price,
        });
    }

    let customer = resolve_customer(
        &txn,
        outlet_id,
        request.customer_id,
        request.customer_name.as_deref(),
    )
    .await?;

    let recorded = insert_sale(
        &txn,
        outlet_id,
        customer.as_ref(),
        request.customer_name,
        request.payment_method,
        SaleSource::Counter,
        &lines,
        at,
    )
    .await?;

    let reference = format!("SALE-{}", recorded.sale.id);
    for line in &request.items {
        inventory::apply_stock_change(
            &txn,
            outlet_id,
            line.product_id,
            InventoryAction::Sale,
            -line.quantity,
            Some(reference.clone()),
            None,
        )
        .await?;
    }

    txn.commit().await?;
    tracing::info!(
        outlet_id,
        sale_id = recorded.sale.id,
        total = recorded.sale.total_amount,
        payment_method = ?recorded.sale.payment_method,
        "Sale completed"
    );
    Ok(recorded)
}

/// Retrieves a sale of the outlet.
pub async fn get_sale<C>(db: &C, outlet_id: i64, sale_id: i64) -> Result<sale_transaction::Model>
where
    C: ConnectionTrait,
{
    SaleTransaction::find_by_id(sale_id)
        .filter(sale_transaction::Column::OutletId.eq(outlet_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("sale", sale_id))
}

async fn sale_items<C>(db: &C, sale_id: i64) -> Result<Vec<sale_item::Model>>
where
    C: ConnectionTrait,
{
    SaleItem::find()
        .filter(sale_item::Column::SaleId.eq(sale_id))
        .order_by_asc(sale_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Voids a completed sale: restores stock of product lines and reverses credit.
pub async fn void_sale(
    db: &DatabaseConnection,
    ctx: &OutletContext,
    sale_id: i64,
) -> Result<sale_transaction::Model> {
    ctx.require_manager("void sales")?;
    let outlet_id = ctx.outlet_id();

    let txn = db.begin().await?;
    let sale = get_sale(&txn, outlet_id, sale_id).await?;
    if sale.status == SaleStatus::Voided {
        return Err(Error::InvalidState {
            entity: "sale",
            state: "Voided".to_string(),
            action: "void",
        });
    }

    let reference = format!("VOID-SALE-{sale_id}");
    for item in sale_items(&txn, sale_id).await? {
        let Some(product_id) = item.product_id else {
            continue;
        };
        inventory::apply_stock_change(
            &txn,
            outlet_id,
            product_id,
            InventoryAction::Return,
            item.quantity,
            Some(reference.clone()),
            None,
        )
        .await?;
    }

    if let Some(customer_id) = sale.customer_id {
        let credit = (sale.payment_method == PaymentMethod::Credit).then(|| money::dec(sale.total_amount));
        customer::reverse_visit(&txn, customer_id, credit).await?;
    }

    let mut active: sale_transaction::ActiveModel = sale.into();
    active.status = Set(SaleStatus::Voided);
    let voided = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(outlet_id, sale_id, user = %ctx.user.username, "Sale voided");
    Ok(voided)
}

/// Sale, lines, outlet and tax rate for printing.
pub async fn receipt(db: &DatabaseConnection, ctx: &OutletContext, sale_id: i64) -> Result<Receipt> {
    let sale = get_sale(db, ctx.outlet_id(), sale_id).await?;
    let items = sale_items(db, sale_id).await?;
    let settings = outlet::get_settings(db, ctx.outlet_id()).await?;
    Ok(Receipt {
        sale,
        items,
        outlet: ctx.outlet.clone(),
        tax_rate: settings.tax_rate,
    })
}

/// Sales of the outlet, newest first.
pub async fn sales_history(
    db: &DatabaseConnection,
    outlet_id: i64,
    limit: u64,
) -> Result<Vec<sale_transaction::Model>> {
    SaleTransaction::find()
        .filter(sale_transaction::Column::OutletId.eq(outlet_id))
        .order_by_desc(sale_transaction::Column::Date)
        .order_by_desc(sale_transaction::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Completed sales of the outlet within `[start, end)`, newest first.
pub(crate) async fn completed_sales_between<C>(
    db: &C,
    outlet_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<sale_transaction::Model>>
where
    C: ConnectionTrait,
{
    SaleTransaction::find()
        .filter(sale_transaction::Column::OutletId.eq(outlet_id))
        .filter(sale_transaction::Column::Status.eq(SaleStatus::Completed))
        .filter(sale_transaction::Column::Date.gte(start))
        .filter(sale_transaction::Column::Date.lt(end))
        .order_by_desc(sale_transaction::Column::Date)
        .order_by_desc(sale_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Items belonging to any of `sales`.
pub(crate) async fn items_of<C>(
    db: &C,
    sales: &[sale_transaction::Model],
) -> Result<Vec<sale_item::Model>>
where
    C: ConnectionTrait,
{
    if sales.is_empty() {
        return Ok(Vec::new());
    }
    SaleItem::find()
        .filter(sale_item::Column::SaleId.is_in(sales.iter().map(|s| s.id)))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Revenue, tender split, best sellers and recent sales for one day.
pub async fn daily_summary(
    db: &DatabaseConnection,
    outlet_id: i64,
    date: NaiveDate,
) -> Result<DailySummary> {
    let (start, end) = day_bounds(date);
    let sales = completed_sales_between(db, outlet_id, start, end).await?;
    let items = items_of(db, &sales).await?;

    let mut tenders: BTreeMap<&'static str, (PaymentMethod, Decimal, usize)> = BTreeMap::new();
    for sale in &sales {
        let key = match sale.payment_method {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Transfer => "Transfer",
            PaymentMethod::Credit => "Credit",
        };
        let entry = tenders
            .entry(key)
            .or_insert((sale.payment_method, Decimal::ZERO, 0));
        entry.1 += money::dec(sale.total_amount);
        entry.2 += 1;
    }

    let revenue = money::sum_amounts(sales.iter().map(|s| s.total_amount));
    let best_sellers = top_products(
        items
            .iter()
            .filter(|i| i.product_id.is_some())
            .map(|i| (i.product_name.as_str(), i.quantity)),
        10,
    );

    Ok(DailySummary {
        date,
        revenue: money::to_amount(revenue),
        sale_count: sales.len(),
        by_payment_method: tenders
            .into_values()
            .map(|(payment_method, total, count)| PaymentTotal {
                payment_method,
                total: money::to_amount(total),
                count,
            })
            .collect(),
        best_sellers,
        recent_sales: sales.into_iter().take(20).collect(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{core::product, test_utils::*};
    use chrono::TimeZone;

    fn cart(lines: &[(i64, i32)]) -> Vec<CartLine> {
        lines
            .iter()
            .map(|&(product_id, quantity)| CartLine {
                product_id,
                quantity,
                price: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_submit_sale_prices_and_decrements_stock() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let cola = create_test_product(&db, ctx.outlet_id(), "Cola", 2.5, 10).await?;
        let chips = create_test_product(&db, ctx.outlet_id(), "Chips", 1.2, 5).await?;

        let recorded = submit_sale(
            &db,
            ctx.outlet_id(),
            SaleRequest {
                items: cart(&[(cola.id, 3), (chips.id, 2)]),
                payment_method: PaymentMethod::Cash,
                customer_id: None,
                customer_name: None,
            },
            Utc::now(),
        )
        .await?;

        assert_eq!(recorded.sale.total_amount, 9.9);
        assert_eq!(recorded.sale.status, SaleStatus::Completed);
        assert_eq!(recorded.sale.source, SaleSource::Counter);
        assert_eq!(recorded.items.len(), 2);

        let cola_after = product::get_product(&db, ctx.outlet_id(), cola.id).await?;
        assert_eq!(cola_after.current_stock_level, 7);

        let logs = inventory::inventory_history(&db, ctx.outlet_id(), Some(cola.id), 10).await?;
        assert_eq!(logs[0].action, InventoryAction::Sale);
        let expected_reference = format!("SALE-{}", recorded.sale.id);
        assert_eq!(logs[0].reference.as_deref(), Some(expected_reference.as_str()));
        Ok(())
    }

    #[tokio::test]
    async fn test_price_override_is_used() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let beer = create_test_product(&db, ctx.outlet_id(), "Beer", 5.0, 10).await?;

        let recorded = submit_sale(
            &db,
            ctx.outlet_id(),
            SaleRequest {
                items: vec![CartLine {
                    product_id: beer.id,
                    quantity: 2,
                    price: Some(4.25),
                }],
                payment_method: PaymentMethod::Card,
                customer_id: None,
                customer_name: None,
            },
            Utc::now(),
        )
        .await?;
        assert_eq!(recorded.sale.total_amount, 8.5);
        assert_eq!(recorded.items[0].price, 4.25);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_cart_and_bad_quantity_rejected() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let beer = create_test_product(&db, ctx.outlet_id(), "Beer", 5.0, 10).await?;

        let empty = submit_sale(
            &db,
            ctx.outlet_id(),
            SaleRequest {
                items: vec![],
                payment_method: PaymentMethod::Cash,
                customer_id: None,
                customer_name: None,
            },
            Utc::now(),
        )
        .await;
        assert!(matches!(empty, Err(Error::Validation { .. })));

        let zero = submit_sale(
            &db,
            ctx.outlet_id(),
            SaleRequest {
                items: cart(&[(beer.id, 0)]),
                payment_method: PaymentMethod::Cash,
                customer_id: None,
                customer_name: None,
            },
            Utc::now(),
        )
        .await;
        assert!(matches!(zero, Err(Error::InvalidQuantity { quantity: 0 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_credit_sale_links_customer_by_name() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let beer = create_test_product(&db, ctx.outlet_id(), "Beer", 5.0, 10).await?;
        let existing = create_test_customer(&db, ctx.outlet_id(), "Hassan").await?;

        let recorded = submit_sale(
            &db,
            ctx.outlet_id(),
            SaleRequest {
                items: cart(&[(beer.id, 4)]),
                payment_method: PaymentMethod::Credit,
                customer_id: None,
                customer_name: Some("hassan".to_string()),
            },
            Utc::now(),
        )
        .await?;
        assert_eq!(recorded.sale.customer_id, Some(existing.id));

        let reloaded = customer::get_customer(&db, ctx.outlet_id(), existing.id).await?;
        assert_eq!(reloaded.visit_count, 1);
        assert_eq!(reloaded.current_balance, 20.0);
        assert_eq!(reloaded.total_credit, 20.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_credit_without_customer_rolls_back() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let beer = create_test_product(&db, ctx.outlet_id(), "Beer", 5.0, 10).await?;

        let result = submit_sale(
            &db,
            ctx.outlet_id(),
            SaleRequest {
                items: cart(&[(beer.id, 1)]),
                payment_method: PaymentMethod::Credit,
                customer_id: None,
                customer_name: Some("   ".to_string()),
            },
            Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert!(sales_history(&db, ctx.outlet_id(), 10).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_void_sale_restores_stock_and_credit() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let beer = create_test_product(&db, ctx.outlet_id(), "Beer", 5.0, 10).await?;
        let guest = create_test_customer(&db, ctx.outlet_id(), "Guest A").await?;

        let recorded = submit_sale(
            &db,
            ctx.outlet_id(),
            SaleRequest {
                items: cart(&[(beer.id, 2)]),
                payment_method: PaymentMethod::Credit,
                customer_id: Some(guest.id),
                customer_name: None,
            },
            Utc::now(),
        )
        .await?;

        let voided = void_sale(&db, &ctx, recorded.sale.id).await?;
        assert_eq!(voided.status, SaleStatus::Voided);

        let beer_after = product::get_product(&db, ctx.outlet_id(), beer.id).await?;
        assert_eq!(beer_after.current_stock_level, 10);
        let guest_after = customer::get_customer(&db, ctx.outlet_id(), guest.id).await?;
        assert_eq!(guest_after.current_balance, 0.0);
        assert_eq!(guest_after.total_credit, 0.0);
        assert_eq!(guest_after.visit_count, 0);

        let again = void_sale(&db, &ctx, recorded.sale.id).await;
        assert!(matches!(again, Err(Error::InvalidState { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_void_requires_manager() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let cashier_ctx = cashier_context(&db, &ctx).await?;
        let beer = create_test_product(&db, ctx.outlet_id(), "Beer", 5.0, 10).await?;
        let recorded = submit_sale(
            &db,
            ctx.outlet_id(),
            SaleRequest {
                items: cart(&[(beer.id, 1)]),
                payment_method: PaymentMethod::Cash,
                customer_id: None,
                customer_name: None,
            },
            Utc::now(),
        )
        .await?;

        let result = void_sale(&db, &cashier_ctx, recorded.sale.id).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_daily_summary_excludes_voided_and_other_days() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let beer = create_test_product(&db, ctx.outlet_id(), "Beer", 5.0, 100).await?;
        let chips = create_test_product(&db, ctx.outlet_id(), "Chips", 1.0, 100).await?;
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let noon = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let next_day = Utc.with_ymd_and_hms(2024, 3, 16, 0, 30, 0).unwrap();

        let sell = |items: Vec<CartLine>, method: PaymentMethod, at: DateTime<Utc>| {
            submit_sale(
                &db,
                ctx.outlet_id(),
                SaleRequest {
                    items,
                    payment_method: method,
                    customer_id: None,
                    customer_name: None,
                },
                at,
            )
        };
        sell(cart(&[(beer.id, 2)]), PaymentMethod::Cash, noon).await?;
        sell(cart(&[(chips.id, 5)]), PaymentMethod::Card, noon).await?;
        let voided = sell(cart(&[(beer.id, 10)]), PaymentMethod::Cash, noon).await?;
        void_sale(&db, &ctx, voided.sale.id).await?;
        sell(cart(&[(beer.id, 1)]), PaymentMethod::Cash, next_day).await?;

        let summary = daily_summary(&db, ctx.outlet_id(), day).await?;
        assert_eq!(summary.revenue, 15.0);
        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.by_payment_method.len(), 2);
        assert_eq!(summary.best_sellers[0].product_name, "Chips");
        assert_eq!(summary.best_sellers[0].quantity, 5);
        assert_eq!(summary.recent_sales.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_receipt_includes_tax_rate() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let beer = create_test_product(&db, ctx.outlet_id(), "Beer", 5.0, 10).await?;
        let recorded = submit_sale(
            &db,
            ctx.outlet_id(),
            SaleRequest {
                items: cart(&[(beer.id, 1)]),
                payment_method: PaymentMethod::Cash,
                customer_id: None,
                customer_name: None,
            },
            Utc::now(),
        )
        .await?;

        let printed = receipt(&db, &ctx, recorded.sale.id).await?;
        assert_eq!(printed.items.len(), 1);
        assert_eq!(printed.outlet.id, ctx.outlet_id());
        assert_eq!(printed.tax_rate, 0.0);
        Ok(())
    }
}
