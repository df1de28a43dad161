//! Result and error types for the core library

use rust_decimal::Decimal;
use thiserror::Error;

/// Core library error type
///
/// One variant per domain failure, each with a stable human-readable
/// message. Store and IO failures are carried separately so callers can
/// tell an ordinary rejection from an infrastructure outage.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid amount: must be a positive number")]
    InvalidAmount,

    #[error("Interest rate must be between 0 and 100")]
    InvalidRate,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Account {0} is blocked")]
    AccountBlocked(String),

    #[error("No active loan found")]
    NoActiveLoan,

    #[error("Repayment exceeds the remaining loan amount")]
    OverRepayment,

    #[error("Loan amount exceeds the maximum limit of {limit}")]
    LoanLimitExceeded { limit: Decimal },

    #[error("Identifier already in use: {0}")]
    DuplicateIdentifier(String),

    #[error("Invalid account number or password")]
    InvalidCredentials,

    #[error("Admin credentials are already provisioned")]
    AlreadyProvisioned,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store unavailable: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// True for failures of the store itself rather than domain rejections
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Io(_))
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::Store(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
