//! Inventory business logic - every stock movement and its audit log.
//!
//! Stock levels are changed with a single atomic
//! `UPDATE products SET current_stock_level = current_stock_level + ?` and each
//! change writes an inventory log whose `previous_level`/`new_level` bracket
//! the change. Callers that already hold a database transaction pass it in so
//! the stock change commits or rolls back together with their own writes.

use crate::{
    core::product::get_product,
    entities::{InventoryAction, InventoryLog, Product, inventory_log, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Deserialize;

/// One line of a bulk stock delivery
#[derive(Debug, Clone, Deserialize)]
pub struct StockEntry {
    /// Product received
    pub product_id: i64,
    /// Units received, must be positive
    pub quantity: i32,
}

/// A manual stock movement
#[derive(Debug, Clone, Deserialize)]
pub struct StockAdjustment {
    /// Product to adjust
    pub product_id: i64,
    /// Reason for the movement
    pub action: InventoryAction,
    /// Signed change
    pub quantity_changed: i32,
    /// Document reference
    #[serde(default)]
    pub reference: Option<String>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Rejects changes whose sign contradicts the action.
fn validate_direction(action: InventoryAction, quantity_changed: i32) -> Result<()> {
    let valid = match action {
        InventoryAction::Purchase | InventoryAction::Return => quantity_changed > 0,
        InventoryAction::Sale | InventoryAction::Spoilage => quantity_changed < 0,
        InventoryAction::Adjustment | InventoryAction::Transfer => quantity_changed != 0,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidQuantity {
            quantity: quantity_changed,
        })
    }
}

/// Applies a signed stock change and logs it.
///
/// The product must belong to `outlet_id`. Stock may go negative; sales are
/// never blocked by a stale count.
pub async fn apply_stock_change<C>(
    db: &C,
    outlet_id: i64,
    product_id: i64,
    action: InventoryAction,
    quantity_changed: i32,
    reference: Option<String>,
    notes: Option<String>,
) -> Result<inventory_log::Model>
where
    C: ConnectionTrait,
{
    if quantity_changed == 0 {
        return Err(Error::InvalidQuantity { quantity: 0 });
    }

    let product = get_product(db, outlet_id, product_id).await?;
    let previous_level = product.current_stock_level;
    let new_level = previous_level
        .checked_add(quantity_changed)
        .ok_or(Error::InvalidQuantity {
            quantity: quantity_changed,
        })?;

    Product::update_many()
        .col_expr(
            product::Column::CurrentStockLevel,
            Expr::col(product::Column::CurrentStockLevel).add(quantity_changed),
        )
        .filter(product::Column::Id.eq(product_id))
        .exec(db)
        .await?;

    if new_level < 0 {
        tracing::warn!(
            outlet_id,
            product_id,
            new_level,
            "Stock level went negative"
        );
    }

    let log = inventory_log::ActiveModel {
        outlet_id: Set(outlet_id),
        product_id: Set(product_id),
        action: Set(action),
        quantity_changed: Set(quantity_changed),
        previous_level: Set(previous_level),
        new_level: Set(new_level),
        reference: Set(reference),
        notes: Set(notes),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::debug!(
        outlet_id,
        product_id,
        ?action,
        quantity_changed,
        previous_level,
        new_level,
        "Stock changed"
    );
    Ok(log)
}

/// Records a manual stock movement after validating its direction.
pub async fn adjust_stock(
    db: &DatabaseConnection,
    outlet_id: i64,
    adjustment: StockAdjustment,
) -> Result<inventory_log::Model> {
    validate_direction(adjustment.action, adjustment.quantity_changed)?;
    let txn = db.begin().await?;
    let log = apply_stock_change(
        &txn,
        outlet_id,
        adjustment.product_id,
        adjustment.action,
        adjustment.quantity_changed,
        adjustment.reference,
        adjustment.notes,
    )
    .await?;
    txn.commit().await?;
    Ok(log)
}

/// Adds received stock.
pub async fn receive_stock(
    db: &DatabaseConnection,
    outlet_id: i64,
    product_id: i64,
    quantity: i32,
    reference: Option<String>,
) -> Result<inventory_log::Model> {
    adjust_stock(
        db,
        outlet_id,
        StockAdjustment {
            product_id,
            action: InventoryAction::Purchase,
            quantity_changed: quantity,
            reference,
            notes: None,
        },
    )
    .await
}

/// Writes off `quantity` wasted units. The quantity is given as a positive number.
pub async fn log_spoilage(
    db: &DatabaseConnection,
    outlet_id: i64,
    product_id: i64,
    quantity: i32,
    notes: Option<String>,
) -> Result<inventory_log::Model> {
    if quantity <= 0 {
        return Err(Error::InvalidQuantity { quantity });
    }
    adjust_stock(
        db,
        outlet_id,
        StockAdjustment {
            product_id,
            action: InventoryAction::Spoilage,
            quantity_changed: -quantity,
            reference: None,
            notes,
        },
    )
    .await
}

/// Sets stock to a physically counted level. Returns `None` when nothing changed.
pub async fn set_counted_level(
    db: &DatabaseConnection,
    outlet_id: i64,
    product_id: i64,
    counted: i32,
    notes: Option<String>,
) -> Result<Option<inventory_log::Model>> {
    let txn = db.begin().await?;
    let product = get_product(&txn, outlet_id, product_id).await?;
    let delta = counted
        .checked_sub(product.current_stock_level)
        .ok_or(Error::InvalidQuantity { quantity: counted })?;
    if delta == 0 {
        return Ok(None);
    }
    let log = apply_stock_change(
        &txn,
        outlet_id,
        product_id,
        InventoryAction::Adjustment,
        delta,
        Some("Stock count".to_string()),
        notes,
    )
    .await?;
    txn.commit().await?;
    Ok(Some(log))
}

/// Receives a whole delivery in one transaction; any invalid line aborts all of it.
pub async fn bulk_stock_entry(
    db: &DatabaseConnection,
    outlet_id: i64,
    entries: &[StockEntry],
    reference: Option<String>,
) -> Result<Vec<inventory_log::Model>> {
    if entries.is_empty() {
        return Err(Error::validation("Bulk stock entry has no lines"));
    }
    if let Some(bad) = entries.iter().find(|e| e.quantity <= 0) {
        return Err(Error::InvalidQuantity {
            quantity: bad.quantity,
        });
    }

    let txn = db.begin().await?;
    let mut logs = Vec::with_capacity(entries.len());
    for entry in entries {
        let log = apply_stock_change(
            &txn,
            outlet_id,
            entry.product_id,
            InventoryAction::Purchase,
            entry.quantity,
            reference.clone(),
            None,
        )
        .await?;
        logs.push(log);
    }
    txn.commit().await?;

    tracing::info!(outlet_id, lines = logs.len(), "Bulk stock entry recorded");
    Ok(logs)
}

/// Inventory logs of the outlet, newest first, optionally for one product.
pub async fn inventory_history(
    db: &DatabaseConnection,
    outlet_id: i64,
    product_id: Option<i64>,
    limit: u64,
) -> Result<Vec<inventory_log::Model>> {
    let mut query = InventoryLog::find().filter(inventory_log::Column::OutletId.eq(outlet_id));
    if let Some(product_id) = product_id {
        query = query.filter(inventory_log::Column::ProductId.eq(product_id));
    }
    query
        .order_by_desc(inventory_log::Column::CreatedAt)
        .order_by_desc(inventory_log::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}
