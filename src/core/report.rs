//! Report generation business logic.
//!
//! This module provides the dashboard and the monthly financial summary. All
//! functions are framework-agnostic and return structured data that the HTTP
//! layer serializes as is.

use crate::{
    core::{
        booking::pending_count,
        expense::list_expenses,
        money,
        payroll::month_payrolls,
        period::{day_bounds, month_bounds},
        sale::{completed_sales_between, items_of},
    },
    entities::{
        PayrollStatus, Product, RoomOrder, RoomOrderItem, product, room_order, sale_transaction,
    },
    errors::Result,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, prelude::*};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Units sold of one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductQuantity {
    /// Product name as recorded on the line
    pub product_name: String,
    /// Units
    pub quantity: i64,
}

/// Number of products in a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    /// Category, `Uncategorized` when empty
    pub category: String,
    /// Products in it
    pub count: usize,
}

/// Front-page overview of an outlet.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// Revenue of today's completed sales
    pub today_revenue: f64,
    /// Number of today's completed sales
    pub today_sales: usize,
    /// Products in the catalogue
    pub product_count: usize,
    /// Products below the low-stock threshold
    pub low_stock_count: usize,
    /// Products per category
    pub categories: Vec<CategoryCount>,
    /// Five most recent completed sales today
    pub recent_sales: Vec<sale_transaction::Model>,
    /// Five most ordered room items
    pub hot_picks: Vec<ProductQuantity>,
    /// Booking requests awaiting approval
    pub pending_bookings: u64,
}

/// Profit and loss for one month.
#[derive(Debug, Clone, Serialize)]
pub struct FinancialSummary {
    /// Year
    pub year: i32,
    /// Month
    pub month: i32,
    /// Completed sales
    pub revenue: f64,
    /// Units sold times the product's cost price
    pub cost_of_goods_sold: f64,
    /// Recorded expenses
    pub expenses: f64,
    /// Net pay of approved and paid payrolls
    pub payroll_cost: f64,
    /// Revenue minus cost of goods sold
    pub gross_profit: f64,
    /// Gross profit minus expenses and payroll
    pub net_profit: f64,
}

/// Sums quantities per product name and keeps the `limit` largest.
///
/// Ties are broken by name so the ordering is stable.
pub fn top_products<'a, I>(lines: I, limit: usize) -> Vec<ProductQuantity>
where
    I: IntoIterator<Item = (&'a str, i32)>,
{
    let mut totals: HashMap<&str, i64> = HashMap::new();
    for (name, quantity) in lines {
        *totals.entry(name).or_default() += i64::from(quantity);
    }
    let mut ranked: Vec<ProductQuantity> = totals
        .into_iter()
        .map(|(name, quantity)| ProductQuantity {
            product_name: name.to_string(),
            quantity,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    ranked.truncate(limit);
    ranked
}

/// Builds the dashboard for `today`.
///
/// # Arguments
/// * `db` - Database connection
/// * `outlet_id` - Outlet to report on
/// * `today` - Day whose sales are counted
/// * `low_stock_threshold` - Products with less stock than this count as low
pub async fn dashboard(
    db: &DatabaseConnection,
    outlet_id: i64,
    today: NaiveDate,
    low_stock_threshold: i32,
) -> Result<Dashboard> {
    let (start, end) = day_bounds(today);
    let sales = completed_sales_between(db, outlet_id, start, end).await?;
    let today_revenue = money::to_amount(money::sum_amounts(sales.iter().map(|s| s.total_amount)));

    let products = Product::find()
        .filter(product::Column::OutletId.eq(outlet_id))
        .all(db)
        .await?;
    let low_stock_count = products
        .iter()
        .filter(|p| p.current_stock_level < low_stock_threshold)
        .count();

    let mut per_category: BTreeMap<String, usize> = BTreeMap::new();
    for product in &products {
        let category = product
            .category
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "Uncategorized".to_string());
        *per_category.entry(category).or_default() += 1;
    }

    let room_items = RoomOrderItem::find()
        .inner_join(RoomOrder)
        .filter(room_order::Column::OutletId.eq(outlet_id))
        .all(db)
        .await?;
    let hot_picks = top_products(
        room_items
            .iter()
            .map(|i| (i.product_name.as_str(), i.quantity)),
        5,
    );

    Ok(Dashboard {
        today_revenue,
        today_sales: sales.len(),
        product_count: products.len(),
        low_stock_count,
        categories: per_category
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect(),
        recent_sales: sales.into_iter().take(5).collect(),
        hot_picks,
        pending_bookings: pending_count(db, outlet_id).await?,
    })
}

/// Builds the profit and loss summary for a month.
///
/// Cost of goods uses each product's current cost price; lines without a
/// product (room time, adjustments) have no cost.
pub async fn financial_summary(
    db: &DatabaseConnection,
    outlet_id: i64,
    year: i32,
    month: i32,
) -> Result<FinancialSummary> {
    let (start, end) = month_bounds(year, month)?;
    let sales = completed_sales_between(db, outlet_id, start, end).await?;
    let revenue = money::sum_amounts(sales.iter().map(|s| s.total_amount));

    let items = items_of(db, &sales).await?;
    let costs: HashMap<i64, f64> = Product::find()
        .filter(product::Column::OutletId.eq(outlet_id))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.cost_price))
        .collect();
    let cogs: Decimal = items
        .iter()
        .filter_map(|item| {
            let cost = costs.get(&item.product_id?)?;
            Some(money::line_total(*cost, item.quantity))
        })
        .sum();
    let cogs = money::round_money(cogs);

    let expenses = list_expenses(db, outlet_id, year, month).await?;
    let expenses = money::sum_amounts(expenses.iter().map(|e| e.amount));

    let payroll_cost = money::sum_amounts(
        month_payrolls(db, outlet_id, year, month)
            .await?
            .iter()
            .filter(|p| matches!(p.status, PayrollStatus::Approved | PayrollStatus::Paid))
            .map(|p| p.net_pay),
    );

    let gross = revenue - cogs;
    let net = gross - expenses - payroll_cost;

    Ok(FinancialSummary {
        year,
        month,
        revenue: money::to_amount(revenue),
        cost_of_goods_sold: money::to_amount(cogs),
        expenses: money::to_amount(expenses),
        payroll_cost: money::to_amount(payroll_cost),
        gross_profit: money::to_amount(gross),
        net_profit: money::to_amount(net),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{
            booking::{NewBooking, submit_booking},
            expense::add_expense,
            kitchen::{OrderLine, place_room_order},
            payroll::{approve_payroll, calculate_payroll},
            product::{NewProduct, create_product},
            sale::{CartLine, SaleRequest, submit_sale},
            session::start_session,
        },
        entities::{PaymentMethod, PaymentType},
        test_utils::*,
    };
    use chrono::{NaiveTime, TimeZone, Utc};

    #[test]
    fn test_top_products_sums_and_ranks() {
        let lines = [("Cola", 2), ("Beer", 5), ("Cola", 4), ("Chips", 6)];
        let ranked = top_products(lines, 2);
        assert_eq!(
            ranked,
            vec![
                ProductQuantity {
                    product_name: "Chips".to_string(),
                    quantity: 6
                },
                ProductQuantity {
                    product_name: "Cola".to_string(),
                    quantity: 6
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_dashboard_counts() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let beer = create_test_product(&db, ctx.outlet_id(), "Beer", 5.0, 50).await?;
        create_test_product(&db, ctx.outlet_id(), "Olives", 3.0, 2).await?;
        let today = Utc::now();
        submit_sale(
            &db,
            ctx.outlet_id(),
            SaleRequest {
                items: vec![CartLine {
                    product_id: beer.id,
                    quantity: 3,
                    price: None,
                }],
                payment_method: PaymentMethod::Cash,
                customer_id: None,
                customer_name: None,
            },
            today,
        )
        .await?;

        let room = create_test_room(&db, ctx.outlet_id(), "Room", 100.0).await?;
        let session = start_session(&db, ctx.outlet_id(), room.id, None, 60, today).await?;
        place_room_order(
            &db,
            ctx.outlet_id(),
            session.id,
            &[OrderLine {
                product_id: beer.id,
                quantity: 2,
            }],
            today,
        )
        .await?;
        submit_booking(
            &db,
            ctx.outlet_id(),
            NewBooking {
                customer_name: "Zara".to_string(),
                phone_number: None,
                requested_date: today.date_naive(),
                requested_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
                duration_minutes: 60,
            },
            today,
        )
        .await?;

        let board = dashboard(&db, ctx.outlet_id(), today.date_naive(), 10).await?;
        assert_eq!(board.today_revenue, 15.0);
        assert_eq!(board.today_sales, 1);
        assert_eq!(board.product_count, 2);
        assert_eq!(board.low_stock_count, 1);
        assert_eq!(board.recent_sales.len(), 1);
        assert_eq!(board.hot_picks[0].product_name, "Beer");
        assert_eq!(board.hot_picks[0].quantity, 2);
        assert_eq!(board.pending_bookings, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_financial_summary() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let wine = create_product(
            &db,
            ctx.outlet_id(),
            NewProduct {
                name: "Wine".to_string(),
                sku: None,
                category: Some("Drinks".to_string()),
                cost_price: 4.0,
                selling_price: 10.0,
                current_stock_level: 100,
                is_favorite: false,
            },
        )
        .await?;
        let in_month = Utc.with_ymd_and_hms(2024, 8, 10, 19, 0, 0).unwrap();
        let next_month = Utc.with_ymd_and_hms(2024, 9, 1, 1, 0, 0).unwrap();
        for at in [in_month, next_month] {
            submit_sale(
                &db,
                ctx.outlet_id(),
                SaleRequest {
                    items: vec![CartLine {
                        product_id: wine.id,
                        quantity: 10,
                        price: None,
                    }],
                    payment_method: PaymentMethod::Card,
                    customer_id: None,
                    customer_name: None,
                },
                at,
            )
            .await?;
        }
        add_expense(&db, ctx.outlet_id(), "Rent", 20.0, in_month.date_naive()).await?;
        let staff = create_test_employee(&db, ctx.outlet_id(), "Staff", PaymentType::Permanent, 15.0, 0.0).await?;
        let payroll = calculate_payroll(&db, ctx.outlet_id(), staff.id, 2024, 8).await?;
        approve_payroll(&db, ctx.outlet_id(), payroll.id).await?;

        let summary = financial_summary(&db, ctx.outlet_id(), 2024, 8).await?;
        assert_eq!(summary.revenue, 100.0);
        assert_eq!(summary.cost_of_goods_sold, 40.0);
        assert_eq!(summary.gross_profit, 60.0);
        assert_eq!(summary.expenses, 20.0);
        assert_eq!(summary.payroll_cost, 15.0);
        assert_eq!(summary.net_profit, 25.0);
        Ok(())
    }
}
