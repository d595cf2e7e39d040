//! CSV import and export of the product catalogue.
//!
//! The import reads POS item exports whose price and stock columns carry the
//! store name, e.g. `Price [Chillo]` and `In stock [Chillo]`. Products are
//! upserted by name; stock differences become logged adjustments.

use crate::{
    core::{inventory, money, product::get_product_by_name},
    entities::{InventoryAction, outlet, product},
    errors::{Error, Result},
};
use csv::StringRecord;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;

/// Category given to rows without one
pub const DEFAULT_CATEGORY: &str = "General";

const EXPORT_HEADER: [&str; 6] = ["Name", "SKU", "Category", "Cost Price", "Selling Price", "In Stock"];

/// Outcome of an import
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    /// New products
    pub created: usize,
    /// Existing products overwritten
    pub updated: usize,
    /// Rows ignored
    pub skipped: usize,
    /// Why rows were skipped, with 1-based data row numbers
    pub errors: Vec<String>,
}

/// A parsed catalogue row
#[derive(Debug, Clone, PartialEq)]
struct CatalogRow {
    name: String,
    sku: Option<String>,
    category: String,
    cost_price: f64,
    selling_price: f64,
    stock: i32,
}

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    name: usize,
    sku: Option<usize>,
    category: Option<usize>,
    cost: Option<usize>,
    price: Option<usize>,
    stock: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, outlet_name: &str) -> Result<Self> {
        let exact = |wanted: &str| headers.iter().position(|h| h.trim() == wanted);
        let prefixed = |prefix: &str| headers.iter().position(|h| h.trim().starts_with(prefix));

        let name = exact("Name")
            .ok_or_else(|| Error::validation("CSV has no Name column"))?;
        Ok(Self {
            name,
            sku: exact("SKU"),
            category: exact("Category"),
            cost: exact("Cost"),
            price: exact(&format!("Price [{outlet_name}]")).or_else(|| prefixed("Price")),
            stock: exact(&format!("In stock [{outlet_name}]")).or_else(|| prefixed("In stock")),
        })
    }
}

fn field<'r>(record: &'r StringRecord, index: Option<usize>) -> Option<&'r str> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_number(record: &StringRecord, index: Option<usize>, column: &str) -> std::result::Result<f64, String> {
    match field(record, index) {
        None => Ok(0.0),
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid {column} '{raw}'")),
    }
}

/// Parses one data row. `Ok(None)` means the row has no name and is ignored.
fn parse_row(record: &StringRecord, columns: Columns) -> std::result::Result<Option<CatalogRow>, String> {
    let Some(name) = field(record, Some(columns.name)) else {
        return Ok(None);
    };
    let cost_price = parse_number(record, columns.cost, "cost")?;
    let selling_price = parse_number(record, columns.price, "price")?;
    let stock = parse_number(record, columns.stock, "stock")?.trunc();
    if cost_price < 0.0 || selling_price < 0.0 {
        return Err("negative price".to_string());
    }
    if stock < f64::from(i32::MIN) || stock > f64::from(i32::MAX) {
        return Err(format!("stock {stock} out of range"));
    }

    // Range checked above
    #[allow(clippy::cast_possible_truncation)]
    let stock = stock as i32;

    Ok(Some(CatalogRow {
        name: name.to_string(),
        sku: field(record, columns.sku).map(str::to_string),
        category: field(record, columns.category)
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string(),
        cost_price,
        selling_price,
        stock,
    }))
}

async fn upsert_row<C>(db: &C, outlet_id: i64, row: CatalogRow) -> Result<bool>
where
    C: ConnectionTrait,
{
    let cost_price = money::to_amount(money::dec(row.cost_price));
    let selling_price = money::to_amount(money::dec(row.selling_price));

    if let Some(existing) = get_product_by_name(db, outlet_id, &row.name).await? {
        let delta = row
            .stock
            .checked_sub(existing.current_stock_level)
            .ok_or(Error::InvalidQuantity { quantity: row.stock })?;
        let product_id = existing.id;
        let mut active: product::ActiveModel = existing.into();
        active.sku = Set(row.sku);
        active.category = Set(Some(row.category));
        active.cost_price = Set(cost_price);
        active.selling_price = Set(selling_price);
        active.update(db).await?;
        if delta != 0 {
            inventory::apply_stock_change(
                db,
                outlet_id,
                product_id,
                InventoryAction::Adjustment,
                delta,
                Some("CSV import".to_string()),
                None,
            )
            .await?;
        }
        return Ok(false);
    }

    let created = product::ActiveModel {
        outlet_id: Set(outlet_id),
        name: Set(row.name),
        sku: Set(row.sku),
        category: Set(Some(row.category)),
        cost_price: Set(cost_price),
        selling_price: Set(selling_price),
        current_stock_level: Set(0),
        is_favorite: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await?;
    if row.stock != 0 {
        inventory::apply_stock_change(
            db,
            outlet_id,
            created.id,
            InventoryAction::Adjustment,
            row.stock,
            Some("CSV import".to_string()),
            Some("Opening stock".to_string()),
        )
        .await?;
    }
    Ok(true)
}

/// Imports a catalogue CSV into `outlet`.
///
/// Rows that fail to parse are skipped and reported; a malformed header or a
/// database failure aborts the whole import.
pub async fn import_products<R>(
    db: &DatabaseConnection,
    outlet: &outlet::Model,
    reader: R,
) -> Result<ImportSummary>
where
    R: std::io::Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let columns = Columns::resolve(csv_reader.headers()?, &outlet.name)?;

    let mut summary = ImportSummary::default();
    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let line = index + 1;
        match record.map_err(|e| e.to_string()).and_then(|r| parse_row(&r, columns)) {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => summary.skipped += 1,
            Err(reason) => {
                tracing::warn!(outlet_id = outlet.id, line, %reason, "Skipping CSV row");
                summary.skipped += 1;
                summary.errors.push(format!("row {line}: {reason}"));
            }
        }
    }

    let txn = db.begin().await?;
    for row in rows {
        if upsert_row(&txn, outlet.id, row).await? {
            summary.created += 1;
        } else {
            summary.updated += 1;
        }
    }
    txn.commit().await?;

    tracing::info!(
        outlet_id = outlet.id,
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        "Catalogue imported"
    );
    Ok(summary)
}

/// File name offered for an outlet's export.
#[must_use]
pub fn export_filename(outlet: &outlet::Model) -> String {
    format!("{}_inventory.csv", outlet.name)
}

/// Writes every product of the outlet as CSV.
pub async fn export_products(db: &DatabaseConnection, outlet_id: i64) -> Result<Vec<u8>> {
    let products = product::Entity::find()
        .filter(product::Column::OutletId.eq(outlet_id))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;
    for p in &products {
        writer.write_record([
            p.name.clone(),
            p.sku.clone().unwrap_or_default(),
            p.category.clone().unwrap_or_default(),
            format!("{:.2}", p.cost_price),
            format!("{:.2}", p.selling_price),
            p.current_stock_level.to_string(),
        ])?;
    }
    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{core::product::list_products, test_utils::*};

    const LOYVERSE: &str = "\
Handle,SKU,Name,Category,Cost,Price [Main Store],In stock [Main Store]
cola,10001,Cola,Drinks,1.10,2.50,24
chips,10002,Chips,,0.40,1.20,7.9
,10003,,Snacks,1,1,1
bad,10004,Broken,Snacks,abc,1,1
";

    #[tokio::test]
    async fn test_import_creates_and_reports() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;

        let summary = import_products(&db, &ctx.outlet, LOYVERSE.as_bytes()).await?;
        assert_eq!(summary.created, 2);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].starts_with("row 4"));

        let products = list_products(&db, ctx.outlet_id()).await?;
        let chips = products.iter().find(|p| p.name == "Chips").unwrap();
        assert_eq!(chips.category.as_deref(), Some(DEFAULT_CATEGORY));
        assert_eq!(chips.current_stock_level, 7);
        assert_eq!(chips.selling_price, 1.2);
        Ok(())
    }

    #[tokio::test]
    async fn test_reimport_updates_by_name_and_logs_stock() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        import_products(&db, &ctx.outlet, LOYVERSE.as_bytes()).await?;

        let second = "Name,Cost,Price [Other],In stock [Other]\nCola,1.20,2.75,30\n";
        let summary = import_products(&db, &ctx.outlet, second.as_bytes()).await?;
        assert_eq!(summary.created, 0);
        assert_eq!(summary.updated, 1);

        let cola = get_product_by_name(&db, ctx.outlet_id(), "Cola").await?.unwrap();
        assert_eq!(cola.selling_price, 2.75);
        assert_eq!(cola.current_stock_level, 30);

        let logs = inventory::inventory_history(&db, ctx.outlet_id(), Some(cola.id), 10).await?;
        assert_eq!(logs[0].quantity_changed, 6);
        assert_eq!(logs[0].reference.as_deref(), Some("CSV import"));
        Ok(())
    }

    #[tokio::test]
    async fn test_reimport_stock_overflow_rolls_back() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let first = "Name,Price [Other],In stock [Other]\nIce,1.00,-10\n";
        import_products(&db, &ctx.outlet, first.as_bytes()).await?;

        let second = "Name,Price [Other],In stock [Other]\nIce,1.50,2147483647\n";
        let result = import_products(&db, &ctx.outlet, second.as_bytes()).await;
        assert!(matches!(result, Err(Error::InvalidQuantity { .. })));

        let ice = get_product_by_name(&db, ctx.outlet_id(), "Ice").await?.unwrap();
        assert_eq!(ice.current_stock_level, -10);
        assert_eq!(ice.selling_price, 1.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_name_column_is_fatal() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let result = import_products(&db, &ctx.outlet, "SKU,Cost\n1,2\n".as_bytes()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_export_writes_header_and_rows() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        create_test_product(&db, ctx.outlet_id(), "Tea", 2.0, 5).await?;

        let bytes = export_products(&db, ctx.outlet_id()).await?;
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Name,SKU,Category,Cost Price,Selling Price,In Stock"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("Tea,"));
        assert!(row.ends_with(",2.00,5"));
        assert_eq!(export_filename(&ctx.outlet), format!("{}_inventory.csv", ctx.outlet.name));
        Ok(())
    }
}
