use thiserror::Error;

use crate::domain::{AccountId, Cents, format_cents};
use crate::storage::StoreError;

/// Every way a ledger operation can fail.
///
/// Validation and business outcomes each get their own variant so callers can
/// match on them directly. Store faults are kept whole in `Storage`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Cannot transfer money to the same account")]
    SelfTransfer,

    #[error("Invalid amount {}: must be greater than zero", format_cents(*.0))]
    InvalidAmount(Cents),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Invalid balance {}: must be greater than zero", format_cents(*.0))]
    InvalidBalance(Cents),

    #[error("Allowed currency list cannot be empty")]
    EmptyCurrencyList,

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Currency mismatch between accounts: {from_currency} vs {to_currency}")]
    CurrencyMismatch {
        from_currency: String,
        to_currency: String,
    },

    #[error("Insufficient funds on account {account_id}: required {}", format_cents(*.required))]
    InsufficientFunds { account_id: AccountId, required: Cents },

    #[error(transparent)]
    Storage(StoreError),
}

/// How an error should be reported to whoever called the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is invalid; retrying it unchanged cannot succeed.
    Validation,
    /// The request is valid but a ledger rule blocks it.
    Business,
    /// The store failed while serving the request.
    Storage,
    /// The store connection is unusable; a reconnect may help.
    Connection,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::SelfTransfer
            | AppError::InvalidAmount(_)
            | AppError::UnsupportedCurrency(_)
            | AppError::InvalidBalance(_)
            | AppError::EmptyCurrencyList => ErrorKind::Validation,
            AppError::AccountNotFound(_)
            | AppError::CurrencyMismatch { .. }
            | AppError::InsufficientFunds { .. } => ErrorKind::Business,
            AppError::Storage(err) if err.is_connection_failure() => ErrorKind::Connection,
            AppError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn is_connection_failure(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound(id) => AppError::AccountNotFound(id),
            StoreError::InsufficientFunds { account_id, amount } => AppError::InsufficientFunds {
                account_id,
                required: amount,
            },
            fault => AppError::Storage(fault),
        }
    }
}
