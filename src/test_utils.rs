//! Shared test utilities for the venue manager.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        customer::{self, NewCustomer},
        employee::{self, NewEmployee},
        product::{self, NewProduct},
        room::{self, NewRoom},
        tenant::{self, OutletContext},
    },
    entities::{self, PaymentType},
    errors::Result,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing_subscriber::EnvFilter;

/// Installs a tracing subscriber that writes through the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Inserts a user.
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    is_superuser: bool,
) -> Result<entities::user::Model> {
    entities::user::ActiveModel {
        username: Set(username.to_string()),
        is_superuser: Set(is_superuser),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts an outlet owned by `owner_id`.
pub async fn create_test_outlet(
    db: &DatabaseConnection,
    name: &str,
    owner_id: i64,
) -> Result<entities::outlet::Model> {
    entities::outlet::ActiveModel {
        name: Set(name.to_string()),
        owner_id: Set(owner_id),
        location: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a room with capacity 4.
pub async fn create_test_room(
    db: &DatabaseConnection,
    outlet_id: i64,
    name: &str,
    price_per_hour: f64,
) -> Result<entities::room::Model> {
    room::create_room(
        db,
        outlet_id,
        NewRoom {
            name: name.to_string(),
            capacity: 4,
            price_per_hour,
        },
    )
    .await
}

/// Creates a product with no SKU, no category and zero cost.
pub async fn create_test_product(
    db: &DatabaseConnection,
    outlet_id: i64,
    name: &str,
    selling_price: f64,
    stock: i32,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        outlet_id,
        NewProduct {
            name: name.to_string(),
            sku: None,
            category: None,
            cost_price: 0.0,
            selling_price,
            current_stock_level: stock,
            is_favorite: false,
        },
    )
    .await
}

/// Creates a customer with zero balances.
pub async fn create_test_customer(
    db: &DatabaseConnection,
    outlet_id: i64,
    name: &str,
) -> Result<entities::customer::Model> {
    customer::create_customer(
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

/// Creates an employee with the given pay scheme.
pub async fn create_test_employee(
    db: &DatabaseConnection,
    outlet_id: i64,
    name: &str,
    payment_type: PaymentType,
    base_salary: f64,
    commission_rate: f64,
) -> Result<entities::employee::Model> {
    employee::create_employee(
        db,
        outlet_id,
        NewEmployee {
            name: name.to_string(),
            role: "Staff".to_string(),
            user_id: None,
            phone: None,
            email: None,
            payment_type,
            base_salary,
            commission_rate,
            date_joined: None,
        },
    )
    .await
}

/// Creates a permanent employee linked to a login.
pub async fn create_linked_employee(
    db: &DatabaseConnection,
    outlet_id: i64,
    user_id: i64,
    name: &str,
) -> Result<entities::employee::Model> {
    employee::create_employee(
        db,
        outlet_id,
        NewEmployee {
            name: name.to_string(),
            role: "Cashier".to_string(),
            user_id: Some(user_id),
            phone: None,
            email: None,
            payment_type: PaymentType::Permanent,
            base_salary: 0.0,
            commission_rate: 0.0,
            date_joined: None,
        },
    )
    .await
}

/// Sets up a database with one outlet, "Main Store", and its owner.
/// Returns (db, owner context); the owner is a manager of the outlet.
pub async fn setup_outlet() -> Result<(DatabaseConnection, OutletContext)> {
    let db = setup_test_db().await?;
    let owner = create_test_user(&db, "owner", false).await?;
    let outlet = create_test_outlet(&db, "Main Store", owner.id).await?;
    let ctx = tenant::build_context(&db, owner, Some(outlet.id)).await?;
    Ok((db, ctx))
}

/// Context of a non-manager cashier employed at the outlet of `ctx`.
pub async fn cashier_context(db: &DatabaseConnection, ctx: &OutletContext) -> Result<OutletContext> {
    let user = create_test_user(db, "cashier", false).await?;
    create_linked_employee(db, ctx.outlet_id(), user.id, "Cashier").await?;
    tenant::build_context(db, user, Some(ctx.outlet_id())).await
}
