//! Outlet business logic - tenants and their per-outlet settings.

use crate::{
    entities::{Outlet, OutletSetting, User, outlet, outlet_setting, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;

/// Input for a new outlet
#[derive(Debug, Clone, Deserialize)]
pub struct NewOutlet {
    /// Store name
    pub name: String,
    /// Owner; defaults to the creating user
    #[serde(default)]
    pub owner_id: Option<i64>,
    /// Address or description
    #[serde(default)]
    pub location: Option<String>,
}

/// Partial update for outlet settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    /// Where booking notifications go
    #[serde(default)]
    pub notification_email: Option<String>,
    /// Tax rate in percent
    #[serde(default)]
    pub tax_rate: Option<f64>,
}

/// Looks up an outlet by exact name.
pub async fn get_outlet_by_name(db: &DatabaseConnection, name: &str) -> Result<outlet::Model> {
    Outlet::find()
        .filter(outlet::Column::Name.eq(name))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("outlet", name))
}

/// Outlets visible to `user`: all for superusers, owned ones otherwise.
pub async fn list_outlets(db: &DatabaseConnection, user: &user::Model) -> Result<Vec<outlet::Model>> {
    let mut query = Outlet::find();
    if !user.is_superuser {
        query = query.filter(outlet::Column::OwnerId.eq(user.id));
    }
    query
        .order_by_asc(outlet::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates an outlet. Only superusers may create outlets.
pub async fn create_outlet(
    db: &DatabaseConnection,
    user: &user::Model,
    input: NewOutlet,
) -> Result<outlet::Model> {
    if !user.is_superuser {
        return Err(Error::forbidden("Only superusers can create outlets"));
    }
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Outlet name cannot be empty"));
    }
    let owner_id = input.owner_id.unwrap_or(user.id);
    if User::find_by_id(owner_id).one(db).await?.is_none() {
        return Err(Error::not_found("user", owner_id));
    }

    let created = outlet::ActiveModel {
        name: Set(name),
        owner_id: Set(owner_id),
        location: Set(input.location),
        ..Default::default()
    }
    .insert(db)
    .await?;
    tracing::info!(outlet_id = created.id, name = %created.name, owner_id, "Outlet created");
    Ok(created)
}

/// Settings of the outlet; a default row is created on first read.
pub async fn get_settings<C>(db: &C, outlet_id: i64) -> Result<outlet_setting::Model>
where
    C: ConnectionTrait,
{
    let existing = OutletSetting::find()
        .filter(outlet_setting::Column::OutletId.eq(outlet_id))
        .one(db)
        .await?;
    if let Some(settings) = existing {
        return Ok(settings);
    }

    tracing::debug!(outlet_id, "Creating default outlet settings");
    outlet_setting::ActiveModel {
        outlet_id: Set(outlet_id),
        notification_email: Set(None),
        tax_rate: Set(0.0),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Updates notification email and tax rate.
///
/// # Errors
/// Returns an error if the tax rate is outside 0..=100.
pub async fn update_settings(
    db: &DatabaseConnection,
    outlet_id: i64,
    update: SettingsUpdate,
) -> Result<outlet_setting::Model> {
    let settings = get_settings(db, outlet_id).await?;
    let mut active: outlet_setting::ActiveModel = settings.into();

    if let Some(rate) = update.tax_rate {
        if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
            return Err(Error::validation(format!(
                "Tax rate must be between 0 and 100, got {rate}"
            )));
        }
        active.tax_rate = Set(rate);
    }
    if let Some(email) = update.notification_email {
        let email = email.trim().to_string();
        active.notification_email = Set((!email.is_empty()).then_some(email));
    }

    let updated = active.update(db).await?;
    tracing::info!(outlet_id, tax_rate = updated.tax_rate, "Outlet settings updated");
    Ok(updated)
}
