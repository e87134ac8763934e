use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{AccountId, Cents};

/// Primary SQLite result codes that mean the database file or the connection
/// to it is unusable.
const SQLITE_IOERR: i32 = 10;
const SQLITE_CANTOPEN: i32 = 14;
const SQLITE_NOTADB: i32 = 26;

/// SQLSTATE class for connection exceptions ("08000", "08006", ...).
const SQLSTATE_CONNECTION_CLASS: &str = "08";

/// Failures of the ledger store.
///
/// `AccountNotFound` and `InsufficientFunds` are business outcomes and are
/// returned as-is so callers can match on them. Everything else is a fault
/// that carries the name of the operation it happened in plus the original
/// driver error.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("not enough money on account {account_id} to move {amount} cents")]
    InsufficientFunds { account_id: AccountId, amount: Cents },

    #[error("connection failure during {operation}: {source}")]
    BadConnection {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation} failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation} returned a malformed row: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to read init script {}: {source}", .path.display())]
    InitScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Classify a driver error raised while running `operation`.
    pub fn from_sqlx(operation: &'static str, source: sqlx::Error) -> Self {
        if is_connection_fault(&source) {
            tracing::error!(operation, error = %source, "database connection failure");
            return StoreError::BadConnection { operation, source };
        }

        match source {
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::TypeNotFound { .. }
            | sqlx::Error::Decode(_) => StoreError::Decode {
                operation,
                source: source.into(),
            },
            source => StoreError::Query { operation, source },
        }
    }

    /// True when the connection itself is unusable. This is the one class
    /// of failure an outer reconnect policy should act on.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, StoreError::BadConnection { .. })
    }

    /// True for outcomes that are business results rather than faults.
    pub fn is_business_outcome(&self) -> bool {
        matches!(
            self,
            StoreError::AccountNotFound(_) | StoreError::InsufficientFunds { .. }
        )
    }

    /// Name of the store operation that failed, when the error is a fault.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            StoreError::BadConnection { operation, .. }
            | StoreError::Query { operation, .. }
            | StoreError::Decode { operation, .. } => Some(operation),
            _ => None,
        }
    }
}

fn is_connection_fault(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db.code().is_some_and(|code| is_connection_code(&code)),
        _ => false,
    }
}

/// SQLite reports extended result codes; the primary code is the low byte.
fn is_connection_code(code: &str) -> bool {
    if code.starts_with(SQLSTATE_CONNECTION_CLASS) {
        return true;
    }
    match code.parse::<i32>() {
        Ok(extended) => matches!(
            extended & 0xff,
            SQLITE_IOERR | SQLITE_CANTOPEN | SQLITE_NOTADB
        ),
        Err(_) => false,
    }
}
