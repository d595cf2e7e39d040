//! Unified error types and result handling.
//!
//! Core operations return [`Error`]; the HTTP layer maps each variant onto a
//! status code in [`crate::api::error`].

use thiserror::Error;

/// Application error type shared by every layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Input failed a business validation rule
    #[error("Validation error: {message}")]
    Validation {
        /// What went wrong
        message: String,
    },

    /// A monetary amount was zero, negative, or not finite where that is not allowed
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A quantity was zero or negative where that is not allowed
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: i32,
    },

    /// A record does not exist (or belongs to another outlet)
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity name, e.g. `"product"`
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// A state transition is not allowed from the record's current state
    #[error("Cannot {action} {entity} in state {state}")]
    InvalidState {
        /// Entity name, e.g. `"session"`
        entity: &'static str,
        /// Current state of the record
        state: String,
        /// Attempted action
        action: &'static str,
    },

    /// The record already exists
    #[error("Conflict: {message}")]
    Conflict {
        /// What collided
        message: String,
    },

    /// A customer tried to pay more than they owe
    #[error("Payment of {amount} exceeds outstanding balance {balance}")]
    Overpayment {
        /// Amount offered
        amount: f64,
        /// Outstanding balance
        balance: f64,
    },

    /// The caller has no identity
    #[error("Authentication required")]
    Unauthenticated,

    /// The caller is not allowed to perform the operation
    #[error("Permission denied: {message}")]
    Forbidden {
        /// Why access was denied
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parse or write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Integer conversion overflow
    #[error("Numeric conversion error: {0}")]
    NumericConversion(#[from] std::num::TryFromIntError),
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
