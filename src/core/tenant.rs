//! Tenant resolution - maps an authenticated user to the outlet they act on.
//!
//! Every other core module takes an `outlet_id` and filters by it, so a
//! record belonging to another outlet is indistinguishable from a missing one.

use crate::{
    entities::{Employee, Outlet, Room, User, employee, outlet, room, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, prelude::*};

/// The user making a request and the outlet the request is scoped to.
#[derive(Debug, Clone)]
pub struct OutletContext {
    /// Acting user
    pub user: user::Model,
    /// Resolved outlet
    pub outlet: outlet::Model,
}

impl OutletContext {
    /// ID of the resolved outlet.
    #[must_use]
    pub const fn outlet_id(&self) -> i64 {
        self.outlet.id
    }

    /// Managers may override prices and void sales or kitchen orders.
    #[must_use]
    pub fn is_manager(&self) -> bool {
        self.user.is_superuser || self.outlet.owner_id == self.user.id
    }

    /// Fails with [`Error::Forbidden`] unless the user is a manager.
    pub fn require_manager(&self, action: &str) -> Result<()> {
        if self.is_manager() {
            Ok(())
        } else {
            Err(Error::forbidden(format!("Only managers can {action}")))
        }
    }
}

/// Looks up a user by ID.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Looks up a user by username.
pub async fn get_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Picks the default outlet for `user`.
///
/// - Superusers get the first outlet that has rooms, else the first outlet.
/// - Users linked to an employee get that employee's outlet.
/// - Owners get their first outlet.
/// - Anyone else gets `None`.
pub async fn resolve_outlet(
    db: &DatabaseConnection,
    user: &user::Model,
) -> Result<Option<outlet::Model>> {
    if user.is_superuser {
        let with_rooms = Room::find()
            .order_by_asc(room::Column::OutletId)
            .one(db)
            .await?;
        if let Some(room) = with_rooms {
            return Outlet::find_by_id(room.outlet_id)
                .one(db)
                .await
                .map_err(Into::into);
        }
        return Outlet::find()
            .order_by_asc(outlet::Column::Id)
            .one(db)
            .await
            .map_err(Into::into);
    }

    let employee = Employee::find()
        .filter(employee::Column::UserId.eq(user.id))
        .order_by_asc(employee::Column::Id)
        .one(db)
        .await?;
    if let Some(employee) = employee {
        return Outlet::find_by_id(employee.outlet_id)
            .one(db)
            .await
            .map_err(Into::into);
    }

    Outlet::find()
        .filter(outlet::Column::OwnerId.eq(user.id))
        .order_by_asc(outlet::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Whether `user` may act on `outlet`: superusers, the owner, and employees of it.
pub async fn can_access(
    db: &DatabaseConnection,
    user: &user::Model,
    outlet: &outlet::Model,
) -> Result<bool> {
    if user.is_superuser || outlet.owner_id == user.id {
        return Ok(true);
    }
    let linked = Employee::find()
        .filter(employee::Column::UserId.eq(user.id))
        .filter(employee::Column::OutletId.eq(outlet.id))
        .one(db)
        .await?;
    Ok(linked.is_some())
}

/// Builds the request context for `user`.
///
/// With `requested_outlet` the user must be allowed to access that outlet;
/// otherwise the default from [`resolve_outlet`] is used.
pub async fn build_context(
    db: &DatabaseConnection,
    user: user::Model,
    requested_outlet: Option<i64>,
) -> Result<OutletContext> {
    let outlet = match requested_outlet {
        Some(outlet_id) => {
            let outlet = Outlet::find_by_id(outlet_id)
                .one(db)
                .await?
                .ok_or_else(|| Error::not_found("outlet", outlet_id))?;
            if !can_access(db, &user, &outlet).await? {
                return Err(Error::forbidden(format!(
                    "User {} cannot access outlet {}",
                    user.username, outlet.name
                )));
            }
            outlet
        }
        None => resolve_outlet(db, &user).await?.ok_or_else(|| {
            Error::forbidden(format!("User {} is not assigned to an outlet", user.username))
        })?,
    };

    tracing::trace!(user = %user.username, outlet_id = outlet.id, "Resolved outlet context");
    Ok(OutletContext { user, outlet })
}
