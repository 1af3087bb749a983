//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`UnknownOperation`] thrown when an operation id is not in the journal.
//! - [`KeyNotFound`] thrown when an account (or any other item) is not found.
//! - [`Reconciliation`] thrown when grouped report totals drift from the
//!   ungrouped total.
//!
//!  [`UnknownOperation`]: EngineError::UnknownOperation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Reconciliation`]: EngineError::Reconciliation
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Account \"{0}\" is archived")]
    AccountArchived(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Reconciliation failed: {0}")]
    Reconciliation(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// A sum or product that no longer fits in a decimal.
    pub(crate) fn amount_too_large() -> Self {
        Self::InvalidAmount("amount too large".to_string())
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::UnknownOperation(a), Self::UnknownOperation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidCurrency(a), Self::InvalidCurrency(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::InvalidOperation(a), Self::InvalidOperation(b)) => a == b,
            (Self::AccountArchived(a), Self::AccountArchived(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::Reconciliation(a), Self::Reconciliation(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
