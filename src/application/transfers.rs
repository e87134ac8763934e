use tracing::{debug, info};

use crate::domain::{Account, Cents, Payment};
use crate::storage::LedgerStore;

use super::AppError;

/// Moves money between accounts.
///
/// All business rules are checked before the store is asked to move any
/// money; the balance check itself happens inside the store's transfer so it
/// cannot race with another transfer out of the same account.
pub struct TransferService<S> {
    store: S,
}

impl<S: LedgerStore> TransferService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Transfer `amount` from `source_id` to `destination_id`.
    ///
    /// Checks, first failure wins: distinct accounts, positive amount, source
    /// exists, destination exists, same currency. Returns the outgoing leg.
    pub async fn transfer_money(
        &self,
        source_id: &str,
        destination_id: &str,
        amount: Cents,
    ) -> Result<Payment, AppError> {
        if source_id == destination_id {
            return Err(AppError::SelfTransfer);
        }
        if amount <= 0 {
            return Err(AppError::InvalidAmount(amount));
        }

        let source = self.resolve(source_id).await?;
        let destination = self.resolve(destination_id).await?;

        if source.currency != destination.currency {
            debug!(
                source = %source.id,
                destination = %destination.id,
                "transfer rejected: currency mismatch"
            );
            return Err(AppError::CurrencyMismatch {
                from_currency: source.currency,
                to_currency: destination.currency,
            });
        }

        let payment = self
            .store
            .execute_transfer(&source.id, &destination.id, amount)
            .await?;

        info!(
            payment_id = %payment.id,
            source = %source.id,
            destination = %destination.id,
            amount,
            "money transferred"
        );
        Ok(payment)
    }

    /// All payment legs recorded so far.
    pub async fn list_payments(&self) -> Result<Vec<Payment>, AppError> {
        Ok(self.store.list_payments().await?)
    }

    async fn resolve(&self, id: &str) -> Result<Account, AppError> {
        Ok(self.store.assert_account(id).await?)
    }
}
