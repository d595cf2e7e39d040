//! Booking business logic - room requests made by guests ahead of time.

use crate::{
    core::session::start_session_in,
    entities::{BookingRequest, BookingStatus, Outlet, booking_request, room_session},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

/// A booking request as submitted by a guest
#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    /// Guest name
    pub customer_name: String,
    /// Contact phone
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Day of the visit
    pub requested_date: NaiveDate,
    /// Arrival time
    pub requested_time: NaiveTime,
    /// Minutes wanted
    #[serde(default = "default_duration")]
    pub duration_minutes: i32,
}

const fn default_duration() -> i32 {
    60
}

/// Result of approving a booking
#[derive(Debug, Clone, Serialize)]
pub struct ApprovedBooking {
    /// The approved booking
    pub booking: booking_request::Model,
    /// Session started for it, when a room was given
    pub session: Option<room_session::Model>,
}

/// Records a pending booking request for the outlet.
///
/// # Errors
/// Returns an error if:
/// - The outlet does not exist
/// - The name is blank
/// - The duration is not positive
pub async fn submit_booking(
    db: &DatabaseConnection,
    outlet_id: i64,
    input: NewBooking,
    now: DateTime<Utc>,
) -> Result<booking_request::Model> {
    let name = input.customer_name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Name is required"));
    }
    if input.duration_minutes <= 0 {
        return Err(Error::InvalidQuantity {
            quantity: input.duration_minutes,
        });
    }
    if Outlet::find_by_id(outlet_id).one(db).await?.is_none() {
        return Err(Error::not_found("outlet", outlet_id));
    }

    let booking = booking_request::ActiveModel {
        outlet_id: Set(outlet_id),
        customer_name: Set(name),
        phone_number: Set(input.phone_number.filter(|p| !p.trim().is_empty())),
        requested_date: Set(input.requested_date),
        requested_time: Set(input.requested_time),
        duration_minutes: Set(input.duration_minutes),
        status: Set(BookingStatus::Pending),
        session_id: Set(None),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(outlet_id, booking_id = booking.id, "Booking requested");
    Ok(booking)
}

async fn get_booking<C>(db: &C, outlet_id: i64, booking_id: i64) -> Result<booking_request::Model>
where
    C: ConnectionTrait,
{
    BookingRequest::find_by_id(booking_id)
        .filter(booking_request::Column::OutletId.eq(outlet_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("booking", booking_id))
}

fn require_pending(booking: &booking_request::Model, action: &'static str) -> Result<()> {
    if booking.status == BookingStatus::Pending {
        Ok(())
    } else {
        Err(Error::InvalidState {
            entity: "booking",
            state: format!("{:?}", booking.status),
            action,
        })
    }
}

/// Pending bookings, soonest first.
pub async fn pending_bookings(
    db: &DatabaseConnection,
    outlet_id: i64,
) -> Result<Vec<booking_request::Model>> {
    BookingRequest::find()
        .filter(booking_request::Column::OutletId.eq(outlet_id))
        .filter(booking_request::Column::Status.eq(BookingStatus::Pending))
        .order_by_asc(booking_request::Column::RequestedDate)
        .order_by_asc(booking_request::Column::RequestedTime)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of pending bookings.
pub async fn pending_count<C>(db: &C, outlet_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    BookingRequest::find()
        .filter(booking_request::Column::OutletId.eq(outlet_id))
        .filter(booking_request::Column::Status.eq(BookingStatus::Pending))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Approves a pending booking, optionally starting its session in `room_id`.
pub async fn approve_booking(
    db: &DatabaseConnection,
    outlet_id: i64,
    booking_id: i64,
    room_id: Option<i64>,
    at: DateTime<Utc>,
) -> Result<ApprovedBooking> {
    let txn = db.begin().await?;
    let booking = get_booking(&txn, outlet_id, booking_id).await?;
    require_pending(&booking, "approve")?;

    let session = match room_id {
        Some(room_id) => Some(
            start_session_in(
                &txn,
                outlet_id,
                room_id,
                Some(&booking.customer_name),
                booking.duration_minutes,
                at,
            )
            .await?,
        ),
        None => None,
    };

    let mut active: booking_request::ActiveModel = booking.into();
    active.status = Set(BookingStatus::Approved);
    active.session_id = Set(session.as_ref().map(|s| s.id));
    let booking = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(outlet_id, booking_id, session_id = ?booking.session_id, "Booking approved");
    Ok(ApprovedBooking { booking, session })
}

/// Cancels a pending booking.
pub async fn cancel_booking(
    db: &DatabaseConnection,
    outlet_id: i64,
    booking_id: i64,
) -> Result<booking_request::Model> {
    let booking = get_booking(db, outlet_id, booking_id).await?;
    require_pending(&booking, "cancel")?;
    let mut active: booking_request::ActiveModel = booking.into();
    active.status = Set(BookingStatus::Cancelled);
    let cancelled = active.update(db).await?;
    tracing::info!(outlet_id, booking_id, "Booking cancelled");
    Ok(cancelled)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{entities::SessionStatus, test_utils::*};

    fn request(name: &str) -> NewBooking {
        NewBooking {
            customer_name: name.to_string(),
            phone_number: Some("7771234".to_string()),
            requested_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            requested_time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            duration_minutes: 120,
        }
    }

    #[tokio::test]
    async fn test_submit_and_list_pending() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let booking = submit_booking(&db, ctx.outlet_id(), request("Aisha"), Utc::now()).await?;
        assert_eq!(booking.status, BookingStatus::Pending);

        assert_eq!(pending_bookings(&db, ctx.outlet_id()).await?.len(), 1);
        assert_eq!(pending_count(&db, ctx.outlet_id()).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_validates_input() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let blank = submit_booking(&db, ctx.outlet_id(), request(" "), Utc::now()).await;
        assert!(matches!(blank, Err(Error::Validation { .. })));

        let mut zero = request("Aisha");
        zero.duration_minutes = 0;
        let result = submit_booking(&db, ctx.outlet_id(), zero, Utc::now()).await;
        assert!(matches!(result, Err(Error::InvalidQuantity { .. })));

        let missing = submit_booking(&db, 9999, request("Aisha"), Utc::now()).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_approve_starts_session() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let room = create_test_room(&db, ctx.outlet_id(), "Room 1", 100.0).await?;
        let booking = submit_booking(&db, ctx.outlet_id(), request("Aisha"), Utc::now()).await?;

        let approved = approve_booking(&db, ctx.outlet_id(), booking.id, Some(room.id), Utc::now()).await?;
        let session = approved.session.unwrap();
        assert_eq!(session.booked_minutes, 120);
        assert_eq!(session.customer_name, "Aisha");
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(approved.booking.session_id, Some(session.id));

        let again = cancel_booking(&db, ctx.outlet_id(), booking.id).await;
        assert!(matches!(again, Err(Error::InvalidState { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_approve_into_busy_room_rolls_back() -> Result<()> {
        let (db, ctx) = setup_outlet().await?;
        let room = create_test_room(&db, ctx.outlet_id(), "Room 1", 100.0).await?;
        crate::core::session::start_session(&db, ctx.outlet_id(), room.id, None, 60, Utc::now()).await?;
        let booking = submit_booking(&db, ctx.outlet_id(), request("Aisha"), Utc::now()).await?;

        let result = approve_booking(&db, ctx.outlet_id(), booking.id, Some(room.id), Utc::now()).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));
        assert_eq!(pending_count(&db, ctx.outlet_id()).await?, 1);

        let cancelled = cancel_booking(&db, ctx.outlet_id(), booking.id).await?;
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        Ok(())
    }
}
