//! Booking request entity - a room reservation submitted from the public form.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Booking review state
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum BookingStatus {
    /// Awaiting staff review
    #[sea_orm(string_value = "Pending")]
    Pending,
    /// Accepted
    #[sea_orm(string_value = "Approved")]
    Approved,
    /// Rejected or withdrawn
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

/// Booking request database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking_requests")]
pub struct Model {
    /// Unique identifier for the booking
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Outlet being booked
    pub outlet_id: i64,
    /// Guest name
    pub customer_name: String,
    /// Contact phone
    pub phone_number: Option<String>,
    /// Requested day
    pub requested_date: Date,
    /// Requested start time
    pub requested_time: Time,
    /// Requested length
    pub duration_minutes: i32,
    /// Review state
    pub status: BookingStatus,
    /// Session started from this booking on approval
    pub session_id: Option<i64>,
    /// Submission time
    pub created_at: DateTimeUtc,
}

/// `BookingRequest` has no navigable relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
