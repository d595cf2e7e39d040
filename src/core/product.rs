//! Product business logic - the outlet's sellable catalogue.
//!
//! This module provides functions for creating, retrieving, updating and
//! browsing products. Stock levels are never written here directly after
//! creation; all stock movement goes through [`crate::core::inventory`] so it
//! is logged.

use crate::{
    core::{inventory, money},
    entities::{InventoryAction, Product, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

/// Input for a new product
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    /// Name, unique within the outlet
    pub name: String,
    /// Optional SKU
    #[serde(default)]
    pub sku: Option<String>,
    /// Optional category
    #[serde(default)]
    pub category: Option<String>,
    /// Purchase cost per unit
    #[serde(default)]
    pub cost_price: f64,
    /// Sale price per unit
    pub selling_price: f64,
    /// Opening stock; logged as an adjustment when non-zero
    #[serde(default)]
    pub current_stock_level: i32,
    /// Pin to the POS favourites strip
    #[serde(default)]
    pub is_favorite: bool,
}

/// Partial update for a product; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    /// New name
    pub name: Option<String>,
    /// New SKU
    pub sku: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New cost price
    pub cost_price: Option<f64>,
    /// New selling price
    pub selling_price: Option<f64>,
}

/// Everything the POS screen needs in one response
#[derive(Debug, Clone, Serialize)]
pub struct PosCatalog {
    /// All products, by name
    pub products: Vec<product::Model>,
    /// Distinct non-empty categories, sorted
    pub categories: Vec<String>,
    /// Favourite products, by name
    pub favorites: Vec<product::Model>,
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Product name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

/// Retrieves all products of an outlet, ordered alphabetically by name.
pub async fn list_products(db: &DatabaseConnection, outlet_id: i64) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::OutletId.eq(outlet_id))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one product, failing if it does not belong to the outlet.
pub async fn get_product<C>(db: &C, outlet_id: i64, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .filter(product::Column::OutletId.eq(outlet_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))
}

/// Finds a product by exact name within the outlet.
pub async fn get_product_by_name<C>(
    db: &C,
    outlet_id: i64,
    name: &str,
) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::OutletId.eq(outlet_id))
        .filter(product::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a product, performing input validation.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - A product with the same name already exists in the outlet
/// - A price is negative or not finite
/// - The database insert fails
pub async fn create_product(
    db: &DatabaseConnection,
    outlet_id: i64,
    input: NewProduct,
) -> Result<product::Model> {
    let name = validate_name(&input.name)?;
    let cost_price = money::require_non_negative(input.cost_price)?;
    let selling_price = money::require_non_negative(input.selling_price)?;

    let txn = db.begin().await?;

    if get_product_by_name(&txn, outlet_id, &name).await?.is_some() {
        return Err(Error::Conflict {
            message: format!("Product '{name}' already exists"),
        });
    }

    let created = product::ActiveModel {
        outlet_id: Set(outlet_id),
        name: Set(name),
        sku: Set(input.sku.filter(|s| !s.trim().is_empty())),
        category: Set(input.category.filter(|c| !c.trim().is_empty())),
        cost_price: Set(money::to_amount(cost_price)),
        selling_price: Set(money::to_amount(selling_price)),
        current_stock_level: Set(0),
        is_favorite: Set(input.is_favorite),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let created = if input.current_stock_level == 0 {
        created
    } else {
        inventory::apply_stock_change(
            &txn,
            outlet_id,
            created.id,
            InventoryAction::Adjustment,
            input.current_stock_level,
            None,
            Some("Opening stock".to_string()),
        )
        .await?;
        get_product(&txn, outlet_id, created.id).await?
    };

    txn.commit().await?;
    tracing::info!(outlet_id, product_id = created.id, name = %created.name, "Product created");
    Ok(created)
}

/// Updates catalogue fields of a product.
pub async fn update_product(
    db: &DatabaseConnection,
    outlet_id: i64,
    product_id: i64,
    update: ProductUpdate,
) -> Result<product::Model> {
    let existing = get_product(db, outlet_id, product_id).await?;
    let mut active: product::ActiveModel = existing.clone().into();

    if let Some(name) = update.name {
        let name = validate_name(&name)?;
        if name != existing.name && get_product_by_name(db, outlet_id, &name).await?.is_some() {
            return Err(Error::Conflict {
                message: format!("Product '{name}' already exists"),
            });
        }
        active.name = Set(name);
    }
    if let Some(sku) = update.sku {
        active.sku = Set(Some(sku).filter(|s| !s.trim().is_empty()));
    }
    if let Some(category) = update.category {
        active.category = Set(Some(category).filter(|c| !c.trim().is_empty()));
    }
    if let Some(cost) = update.cost_price {
        active.cost_price = Set(money::to_amount(money::require_non_negative(cost)?));
    }
    if let Some(price) = update.selling_price {
        active.selling_price = Set(money::to_amount(money::require_non_negative(price)?));
    }

    active.update(db).await.map_err(Into::into)
}

/// Flips the favourite flag and returns the updated product.
pub async fn toggle_favorite(
    db: &DatabaseConnection,
    outlet_id: i64,
    product_id: i64,
) -> Result<product::Model> {
    let existing = get_product(db, outlet_id, product_id).await?;
    let flipped = !existing.is_favorite;
    let mut active: product::ActiveModel = existing.into();
    active.is_favorite = Set(flipped);
    active.update(db).await.map_err(Into::into)
}

/// Products, categories and favourites for the POS screen.
pub async fn pos_catalog(db: &DatabaseConnection, outlet_id: i64) -> Result<PosCatalog> {
    let products = list_products(db, outlet_id).await?;

    let mut categories: Vec<String> = products
        .iter()
        .filter_map(|p| p.category.clone())
        .filter(|c| !c.trim().is_empty())
        .collect();
    categories.sort();
    categories.dedup();

    let favorites = products.iter().filter(|p| p.is_favorite).cloned().collect();

    Ok(PosCatalog {
        products,
        categories,
        favorites,
    })
}

/// Products with fewer than `threshold` units, lowest stock first.
pub async fn low_stock(
    db: &DatabaseConnection,
    outlet_id: i64,
    threshold: i32,
) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::OutletId.eq(outlet_id))
        .filter(product::Column::CurrentStockLevel.lt(threshold))
        .order_by_asc(product::Column::CurrentStockLevel)
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::{InventoryLog, inventory_log};
    use crate::test_utils::*;

    fn new_product(name: &str, price: f64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            sku: None,
            category: Some("Drinks".to_string()),
            cost_price: 1.0,
            selling_price: price,
            current_stock_level: 0,
            is_favorite: false,
        }
    }

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;

        let result = create_product(&db, ctx.outlet_id(), new_product("   ", 10.0)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_product(&db, ctx.outlet_id(), new_product("Cola", -10.0)).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount }) if amount == -10.0));

        let result = create_product(&db, ctx.outlet_id(), new_product("Cola", f64::NAN)).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));

        assert!(list_products(&db, ctx.outlet_id()).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_with_opening_stock_logs_adjustment() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let mut input = new_product("Cola", 2.5);
        input.current_stock_level = 24;

        let product = create_product(&db, ctx.outlet_id(), input).await?;
        assert_eq!(product.current_stock_level, 24);
        assert_eq!(product.selling_price, 2.5);

        let logs = InventoryLog::find()
            .filter(inventory_log::Column::ProductId.eq(product.id))
            .all(&db)
            .await?;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, InventoryAction::Adjustment);
        assert_eq!(logs[0].previous_level, 0);
        assert_eq!(logs[0].new_level, 24);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_name_in_same_outlet_conflicts() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        create_product(&db, ctx.outlet_id(), new_product("Cola", 2.5)).await?;

        let result = create_product(&db, ctx.outlet_id(), new_product(" Cola ", 3.0)).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_products_are_outlet_scoped() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let other = create_test_outlet(&db, "Other", ctx.user.id).await?;
        let foreign = create_test_product(&db, other.id, "Foreign", 5.0, 10).await?;
        create_test_product(&db, ctx.outlet_id(), "Local", 5.0, 10).await?;

        let listed = list_products(&db, ctx.outlet_id()).await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Local");

        let result = get_product(&db, ctx.outlet_id(), foreign.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_favorite_flips_flag() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let product = create_test_product(&db, ctx.outlet_id(), "Fries", 4.0, 10).await?;

        let toggled = toggle_favorite(&db, ctx.outlet_id(), product.id).await?;
        assert!(toggled.is_favorite);
        let toggled = toggle_favorite(&db, ctx.outlet_id(), product.id).await?;
        assert!(!toggled.is_favorite);
        Ok(())
    }

    #[tokio::test]
    async fn test_pos_catalog_categories_are_distinct_and_sorted() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let outlet_id = ctx.outlet_id();
        let mut snack = new_product("Chips", 3.0);
        snack.category = Some("Snacks".to_string());
        snack.is_favorite = true;
        create_product(&db, outlet_id, snack).await?;
        create_product(&db, outlet_id, new_product("Cola", 2.5)).await?;
        create_product(&db, outlet_id, new_product("Water", 1.0)).await?;
        let mut uncategorised = new_product("Mystery", 1.0);
        uncategorised.category = Some(String::new());
        create_product(&db, outlet_id, uncategorised).await?;

        let catalog = pos_catalog(&db, outlet_id).await?;
        assert_eq!(catalog.products.len(), 4);
        assert_eq!(catalog.categories, vec!["Drinks".to_string(), "Snacks".to_string()]);
        assert_eq!(catalog.favorites.len(), 1);
        assert_eq!(catalog.favorites[0].name, "Chips");
        Ok(())
    }

    #[tokio::test]
    async fn test_low_stock_orders_by_level() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let outlet_id = ctx.outlet_id();
        create_test_product(&db, outlet_id, "Plenty", 1.0, 50).await?;
        create_test_product(&db, outlet_id, "Few", 1.0, 3).await?;
        create_test_product(&db, outlet_id, "Almost", 1.0, 9).await?;
        create_test_product(&db, outlet_id, "Exactly", 1.0, 10).await?;

        let low = low_stock(&db, outlet_id, 10).await?;
        let names: Vec<&str> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Few", "Almost"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_changes_prices() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let product = create_test_product(&db, ctx.outlet_id(), "Tea", 2.0, 10).await?;

        let updated = update_product(
            &db,
            ctx.outlet_id(),
            product.id,
            ProductUpdate {
                selling_price: Some(2.75),
                category: Some("Hot Drinks".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.selling_price, 2.75);
        assert_eq!(updated.category.as_deref(), Some("Hot Drinks"));
        assert_eq!(updated.current_stock_level, 10);
        Ok(())
    }
}
