use std::future::Future;

use crate::domain::{Account, Cents, Payment};

use super::StoreError;

/// Storage contract the services are written against.
///
/// Each operation runs in its own all-or-nothing transaction: nothing it
/// writes becomes visible unless the whole operation succeeds.
pub trait LedgerStore: Send + Sync {
    /// Insert a new account and return the stored record.
    fn create_account(
        &self,
        name: &str,
        currency: &str,
        balance: Cents,
    ) -> impl Future<Output = Result<Account, StoreError>> + Send;

    /// Fetch an account by id, failing with `AccountNotFound` if absent.
    fn assert_account(&self, id: &str)
    -> impl Future<Output = Result<Account, StoreError>> + Send;

    /// All accounts, oldest first.
    fn list_accounts(&self) -> impl Future<Output = Result<Vec<Account>, StoreError>> + Send;

    /// Move `amount` from `source` to `destination` if `source` can cover it,
    /// recording both legs. Returns the outgoing leg.
    fn execute_transfer(
        &self,
        source: &str,
        destination: &str,
        amount: Cents,
    ) -> impl Future<Output = Result<Payment, StoreError>> + Send;

    /// All payment legs in insertion order.
    fn list_payments(&self) -> impl Future<Output = Result<Vec<Payment>, StoreError>> + Send;
}

impl<T: LedgerStore> LedgerStore for std::sync::Arc<T> {
    fn create_account(
        &self,
        name: &str,
        currency: &str,
        balance: Cents,
    ) -> impl Future<Output = Result<Account, StoreError>> + Send {
        (**self).create_account(name, currency, balance)
    }

    fn assert_account(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Account, StoreError>> + Send {
        (**self).assert_account(id)
    }

    fn list_accounts(&self) -> impl Future<Output = Result<Vec<Account>, StoreError>> + Send {
        (**self).list_accounts()
    }

    fn execute_transfer(
        &self,
        source: &str,
        destination: &str,
        amount: Cents,
    ) -> impl Future<Output = Result<Payment, StoreError>> + Send {
        (**self).execute_transfer(source, destination, amount)
    }

    fn list_payments(&self) -> impl Future<Output = Result<Vec<Payment>, StoreError>> + Send {
        (**self).list_payments()
    }
}
