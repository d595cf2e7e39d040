//! Seeding of users, outlets and rooms declared in config.toml.
//!
//! Seeding only ever inserts: records that already exist (matched by
//! username, outlet name, or room name within the outlet) are left untouched,
//! so running it on every startup is safe.

use super::settings::{AppConfig, OutletSeed};
use crate::{
    entities::{Outlet, Room, User, outlet, room, user},
    errors::{Error, Result},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// What seeding inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Users created
    pub users: usize,
    /// Outlets created
    pub outlets: usize,
    /// Rooms created
    pub rooms: usize,
}

async fn find_user(db: &DatabaseConnection, username: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn seed_outlet(db: &DatabaseConnection, seed: &OutletSeed, summary: &mut SeedSummary) -> Result<()> {
    let owner = find_user(db, &seed.owner).await?.ok_or_else(|| Error::Config {
        message: format!("Outlet '{}' names unknown owner '{}'", seed.name, seed.owner),
    })?;

    let existing = Outlet::find()
        .filter(outlet::Column::Name.eq(&seed.name))
        .one(db)
        .await?;
    let outlet = match existing {
        Some(outlet) => outlet,
        None => {
            summary.outlets += 1;
            outlet::ActiveModel {
                name: Set(seed.name.clone()),
                owner_id: Set(owner.id),
                location: Set(seed.location.clone()),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    for room_seed in &seed.rooms {
        let exists = Room::find()
            .filter(room::Column::OutletId.eq(outlet.id))
            .filter(room::Column::Name.eq(&room_seed.name))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }
        room::ActiveModel {
            outlet_id: Set(outlet.id),
            name: Set(room_seed.name.clone()),
            capacity: Set(room_seed.capacity),
            price_per_hour: Set(room_seed.price_per_hour),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;
        summary.rooms += 1;
    }
    Ok(())
}

/// Inserts the users, outlets and rooms from `config` that do not exist yet.
///
/// # Errors
/// Returns an error if an outlet names an owner that is neither seeded nor
/// already present, or if a database write fails.
pub async fn seed_from_config(db: &DatabaseConnection, config: &AppConfig) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for seed in &config.users {
        if find_user(db, &seed.username).await?.is_none() {
            user::ActiveModel {
                username: Set(seed.username.clone()),
                is_superuser: Set(seed.is_superuser),
                ..Default::default()
            }
            .insert(db)
            .await?;
            summary.users += 1;
        }
    }

    for seed in &config.outlets {
        seed_outlet(db, seed, &mut summary).await?;
    }

    tracing::info!(
        users = summary.users,
        outlets = summary.outlets,
        rooms = summary.rooms,
        "Seed data applied"
    );
    Ok(summary)
}
