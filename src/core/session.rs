//! Room session business logic - the room clock, billing and checkout.
//!
//! A session occupies its room while `Active` or `Paused`. Charges stay at
//! zero until checkout, when the bill is computed once and frozen on the
//! session and on the sale it produces.
//!
//! Billing:
//! - billable minutes = (end - start) - paused minutes, where a pause still
//!   open at the billing instant counts as paused
//! - room charge = rate * max(booked, minimum) / 60
//! - extra time = rate * max(0, billable - booked) / 60
//! - total = room + extra time + food and drink, rounded to 2 dp

use crate::{
    core::{
        money,
        room::get_room,
        sale::{self, PricedLine},
        tenant::OutletContext,
    },
    entities::{
        PaymentMethod, RoomOrder, RoomOrderItem, RoomSession, SaleSource, SessionStatus,
        room_order, room_order_item, room_session, sale_transaction,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

/// Customer name used when none is given
pub const DEFAULT_CUSTOMER: &str = "Guest";

/// A live or final bill
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionBill {
    /// Minutes on the clock, pauses excluded
    pub billable_minutes: i64,
    /// Minutes booked up front
    pub booked_minutes: i64,
    /// Hourly rate of the room
    pub price_per_hour: f64,
    /// Charge for the booked time
    pub room_charge: f64,
    /// Charge for time beyond the booking
    pub extra_time_charge: f64,
    /// Room orders
    pub food_beverage_charge: f64,
    /// Sum of the three charges
    pub total_charge: f64,
}

/// How a session is settled
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    /// Tender
    pub payment_method: PaymentMethod,
    /// Amount actually charged when a manager overrides the bill
    #[serde(default)]
    pub final_amount: Option<f64>,
}

/// Result of a checkout
#[derive(Debug, Clone, Serialize)]
pub struct Checkout {
    /// The completed session
    pub session: room_session::Model,
    /// The sale recording the payment
    pub sale: sale_transaction::Model,
    /// The computed bill before any override
    pub bill: SessionBill,
}

/// Minutes the session has been billable as of `at`.
#[must_use]
pub fn billable_minutes(session: &room_session::Model, at: DateTime<Utc>) -> i64 {
    let end = session.end_time.unwrap_or(at);
    let elapsed = (end - session.start_time).num_minutes();
    let open_pause = session
        .paused_at
        .map_or(0, |paused_at| (end - paused_at).num_minutes().max(0));
    (elapsed - i64::from(session.paused_minutes) - open_pause).max(0)
}

/// Computes the bill for a session without touching the database.
#[must_use]
pub fn compute_bill(
    session: &room_session::Model,
    price_per_hour: f64,
    minimum_minutes: i64,
    food_total: Decimal,
    at: DateTime<Utc>,
) -> SessionBill {
    let rate = money::dec(price_per_hour);
    let sixty = Decimal::from(60);
    let booked = i64::from(session.booked_minutes);
    let billable = billable_minutes(session, at);

    let room = money::round_money(rate * Decimal::from(booked.max(minimum_minutes)) / sixty);
    let extra = money::round_money(rate * Decimal::from((billable - booked).max(0)) / sixty);
    let food = money::round_money(food_total);
    let total = money::round_money(room + extra + food);

    SessionBill {
        billable_minutes: billable,
        booked_minutes: booked,
        price_per_hour,
        room_charge: money::to_amount(room),
        extra_time_charge: money::to_amount(extra),
        food_beverage_charge: money::to_amount(food),
        total_charge: money::to_amount(total),
    }
}

/// Retrieves a session of the outlet.
pub async fn get_session<C>(db: &C, outlet_id: i64, session_id: i64) -> Result<room_session::Model>
where
    C: ConnectionTrait,
{
    RoomSession::find_by_id(session_id)
        .filter(room_session::Column::OutletId.eq(outlet_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("session", session_id))
}

/// The session currently occupying `room_id`, if any.
pub async fn open_session_for_room<C>(db: &C, room_id: i64) -> Result<Option<room_session::Model>>
where
    C: ConnectionTrait,
{
    RoomSession::find()
        .filter(room_session::Column::RoomId.eq(room_id))
        .filter(room_session::Column::Status.is_in([SessionStatus::Active, SessionStatus::Paused]))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Open sessions of the outlet, oldest first.
pub async fn open_sessions(db: &DatabaseConnection, outlet_id: i64) -> Result<Vec<room_session::Model>> {
    RoomSession::find()
        .filter(room_session::Column::OutletId.eq(outlet_id))
        .filter(room_session::Column::Status.is_in([SessionStatus::Active, SessionStatus::Paused]))
        .order_by_asc(room_session::Column::StartTime)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Orders placed in a session, oldest first.
pub async fn session_orders<C>(db: &C, session_id: i64) -> Result<Vec<room_order::Model>>
where
    C: ConnectionTrait,
{
    RoomOrder::find()
        .filter(room_order::Column::SessionId.eq(session_id))
        .order_by_asc(room_order::Column::CreatedAt)
        .order_by_asc(room_order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

fn invalid_state(session: &room_session::Model, action: &'static str) -> Error {
    Error::InvalidState {
        entity: "session",
        state: format!("{:?}", session.status),
        action,
    }
}

fn require_open(session: &room_session::Model, action: &'static str) -> Result<()> {
    if session.status.is_open() {
        Ok(())
    } else {
        Err(invalid_state(session, action))
    }
}

/// Starts a session in a free room.
pub(crate) async fn start_session_in<C>(
    db: &C,
    outlet_id: i64,
    room_id: i64,
    customer_name: Option<&str>,
    booked_minutes: i32,
    at: DateTime<Utc>,
) -> Result<room_session::Model>
where
    C: ConnectionTrait,
{
    if booked_minutes <= 0 {
        return Err(Error::InvalidQuantity {
            quantity: booked_minutes,
        });
    }
    let room = get_room(db, outlet_id, room_id).await?;
    if !room.is_active {
        return Err(Error::InvalidState {
            entity: "room",
            state: "Inactive".to_string(),
            action: "start a session in",
        });
    }
    if let Some(occupying) = open_session_for_room(db, room_id).await? {
        return Err(Error::Conflict {
            message: format!("{} is occupied by session {}", room.name, occupying.id),
        });
    }

    let customer_name = customer_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_CUSTOMER)
        .to_string();

    let session = room_session::ActiveModel {
        outlet_id: Set(outlet_id),
        room_id: Set(room_id),
        customer_name: Set(customer_name),
        customer_id: Set(None),
        start_time: Set(at),
        booked_minutes: Set(booked_minutes),
        paused_at: Set(None),
        paused_minutes: Set(0),
        end_time: Set(None),
        status: Set(SessionStatus::Active),
        room_charge: Set(0.0),
        extra_time_charge: Set(0.0),
        food_beverage_charge: Set(0.0),
        total_charge: Set(0.0),
        sale_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(
        outlet_id,
        room_id,
        session_id = session.id,
        booked_minutes,
        "Session started"
    );
    Ok(session)
}

/// Starts a session in a free room. A missing name becomes `Guest`.
///
/// # Errors
/// Returns an error if:
/// - `booked_minutes` is not positive
/// - The room does not belong to the outlet or is inactive
/// - The room already has an open session
pub async fn start_session(
    db: &DatabaseConnection,
    outlet_id: i64,
    room_id: i64,
    customer_name: Option<&str>,
    booked_minutes: i32,
    at: DateTime<Utc>,
) -> Result<room_session::Model> {
    let txn = db.begin().await?;
    let session = start_session_in(&txn, outlet_id, room_id, customer_name, booked_minutes, at).await?;
    txn.commit().await?;
    Ok(session)
}

/// Stops the clock.
pub async fn pause_session(
    db: &DatabaseConnection,
    outlet_id: i64,
    session_id: i64,
    at: DateTime<Utc>,
) -> Result<room_session::Model> {
    let session = get_session(db, outlet_id, session_id).await?;
    if session.status != SessionStatus::Active {
        return Err(invalid_state(&session, "pause"));
    }
    let mut active: room_session::ActiveModel = session.into();
    active.status = Set(SessionStatus::Paused);
    active.paused_at = Set(Some(at));
    let updated = active.update(db).await?;
    tracing::info!(outlet_id, session_id, "Session paused");
    Ok(updated)
}

/// Restarts the clock and adds the pause to `paused_minutes`.
pub async fn resume_session(
    db: &DatabaseConnection,
    outlet_id: i64,
    session_id: i64,
    at: DateTime<Utc>,
) -> Result<room_session::Model> {
    let session = get_session(db, outlet_id, session_id).await?;
    if session.status != SessionStatus::Paused {
        return Err(invalid_state(&session, "resume"));
    }
    let paused_for = session
        .paused_at
        .map_or(0, |paused_at| (at - paused_at).num_minutes().max(0));
    let total_paused = i64::from(session.paused_minutes) + paused_for;

    let mut active: room_session::ActiveModel = session.into();
    active.status = Set(SessionStatus::Active);
    active.paused_at = Set(None);
    active.paused_minutes = Set(i32::try_from(total_paused)?);
    let updated = active.update(db).await?;
    tracing::info!(outlet_id, session_id, paused_for, "Session resumed");
    Ok(updated)
}

/// Books additional minutes.
pub async fn extend_session(
    db: &DatabaseConnection,
    outlet_id: i64,
    session_id: i64,
    minutes: i32,
) -> Result<room_session::Model> {
    if minutes <= 0 {
        return Err(Error::InvalidQuantity { quantity: minutes });
    }
    let session = get_session(db, outlet_id, session_id).await?;
    require_open(&session, "extend")?;

    let booked = session.booked_minutes.checked_add(minutes).ok_or(Error::InvalidQuantity { quantity: minutes })?;
    let mut active: room_session::ActiveModel = session.into();
    active.booked_minutes = Set(booked);
    let updated = active.update(db).await?;
    tracing::info!(outlet_id, session_id, minutes, booked, "Session extended");
    Ok(updated)
}

async fn bill_in<C>(
    db: &C,
    session: &room_session::Model,
    minimum_minutes: i64,
    at: DateTime<Utc>,
) -> Result<SessionBill>
where
    C: ConnectionTrait,
{
    let room = get_room(db, session.outlet_id, session.room_id).await?;
    let orders = session_orders(db, session.id).await?;
    let food = money::sum_amounts(orders.iter().map(|o| o.total_price));
    Ok(compute_bill(session, room.price_per_hour, minimum_minutes, food, at))
}

/// The bill as it would be if the session were checked out at `at`.
pub async fn session_bill(
    db: &DatabaseConnection,
    outlet_id: i64,
    session_id: i64,
    minimum_minutes: i64,
    at: DateTime<Utc>,
) -> Result<SessionBill> {
    let session = get_session(db, outlet_id, session_id).await?;
    bill_in(db, &session, minimum_minutes, at).await
}

/// Bills the session, records the sale and frees the room.
///
/// Food and drink lines were already taken from stock when ordered, so the
/// sale created here does not move stock again.
///
/// # Errors
/// Returns an error if:
/// - The session is not open
/// - `final_amount` differs from the bill and the user is not a manager
/// - Credit is used for a guest without a customer account
pub async fn checkout_session(
    db: &DatabaseConnection,
    ctx: &OutletContext,
    session_id: i64,
    request: CheckoutRequest,
    minimum_minutes: i64,
    at: DateTime<Utc>,
) -> Result<Checkout> {
    let outlet_id = ctx.outlet_id();
    let txn = db.begin().await?;

    let session = get_session(&txn, outlet_id, session_id).await?;
    require_open(&session, "check out")?;
    let bill = bill_in(&txn, &session, minimum_minutes, at).await?;
    let computed_total = money::dec(bill.total_charge);

    let final_total = match request.final_amount {
        Some(amount) => {
            let amount = money::round_money(money::require_non_negative(amount)?);
            if amount != computed_total {
                ctx.require_manager("override the session total")?;
                tracing::warn!(
                    outlet_id,
                    session_id,
                    computed = bill.total_charge,
                    charged = money::to_amount(amount),
                    user = %ctx.user.username,
                    "Session total overridden"
                );
            }
            amount
        }
        None => computed_total,
    };

    let mut lines = vec![PricedLine {
        product_id: None,
        product_name: "Room charge".to_string(),
        quantity: 1,
        price: money::dec(bill.room_charge),
    }];
    if bill.extra_time_charge > 0.0 {
        lines.push(PricedLine {
            product_id: None,
            product_name: "Extra time".to_string(),
            quantity: 1,
            price: money::dec(bill.extra_time_charge),
        });
    }
    let orders = session_orders(&txn, session.id).await?;
    if !orders.is_empty() {
        let items = RoomOrderItem::find()
            .filter(room_order_item::Column::OrderId.is_in(orders.iter().map(|o| o.id)))
            .order_by_asc(room_order_item::Column::Id)
            .all(&txn)
            .await?;
        lines.extend(items.into_iter().map(|item| PricedLine {
            product_id: Some(item.product_id),
            product_name: item.product_name,
            quantity: item.quantity,
            price: money::dec(item.price),
        }));
    }
    if final_total != computed_total {
        lines.push(PricedLine {
            product_id: None,
            product_name: "Manager adjustment".to_string(),
            quantity: 1,
            price: final_total - computed_total,
        });
    }

    let customer = if session.customer_name.eq_ignore_ascii_case(DEFAULT_CUSTOMER) {
        None
    } else {
        sale::resolve_customer(&txn, outlet_id, None, Some(&session.customer_name)).await?
    };

    let recorded = sale::insert_sale(
        &txn,
        outlet_id,
        customer.as_ref(),
        Some(session.customer_name.clone()),
        request.payment_method,
        SaleSource::RoomSession,
        &lines,
        at,
    )
    .await?;

    let open_pause = session.paused_at;
    let closed_pauses = i64::from(session.paused_minutes);
    let mut active: room_session::ActiveModel = session.into();
    if let Some(paused_at) = open_pause {
        let paused_for = (at - paused_at).num_minutes().max(0);
        active.paused_minutes = Set(i32::try_from(closed_pauses + paused_for)?);
        active.paused_at = Set(None);
    }
    active.customer_id = Set(customer.as_ref().map(|c| c.id));
    active.end_time = Set(Some(at));
    active.status = Set(SessionStatus::Completed);
    active.room_charge = Set(bill.room_charge);
    active.extra_time_charge = Set(bill.extra_time_charge);
    active.food_beverage_charge = Set(bill.food_beverage_charge);
    // Overrides live on the sale's adjustment line; the session keeps the computed bill
    active.total_charge = Set(bill.total_charge);
    active.sale_id = Set(Some(recorded.sale.id));
    let completed = active.update(&txn).await?;

    txn.commit().await?;
    tracing::info!(
        outlet_id,
        session_id,
        sale_id = recorded.sale.id,
        total = completed.total_charge,
        charged = recorded.sale.total_amount,
        "Session checked out"
    );
    Ok(Checkout {
        session: completed,
        sale: recorded.sale,
        bill,
    })
}

/// Cancels a session that has no room orders.
pub async fn cancel_session(
    db: &DatabaseConnection,
    outlet_id: i64,
    session_id: i64,
    at: DateTime<Utc>,
) -> Result<room_session::Model> {
    let txn = db.begin().await?;
    let session = get_session(&txn, outlet_id, session_id).await?;
    require_open(&session, "cancel")?;
    if !session_orders(&txn, session_id).await?.is_empty() {
        return Err(Error::Conflict {
            message: format!("Session {session_id} has room orders; check it out instead"),
        });
    }

    let mut active: room_session::ActiveModel = session.into();
    active.status = Set(SessionStatus::Cancelled);
    active.paused_at = Set(None);
    active.end_time = Set(Some(at));
    let cancelled = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(outlet_id, session_id, "Session cancelled");
    Ok(cancelled)
}
