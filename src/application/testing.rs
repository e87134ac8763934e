//! In-memory store double for service-level tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;

use crate::domain::{Account, Cents, Direction, Payment};
use crate::storage::{LedgerStore, StoreError};

#[derive(Default)]
pub struct StubStore {
    accounts: Mutex<HashMap<String, Account>>,
    payments: Mutex<Vec<Payment>>,
    lookups: AtomicUsize,
    transfers: Mutex<Vec<(String, String, Cents)>>,
}

impl StubStore {
    pub fn with_accounts(accounts: &[(&str, &str, Cents)]) -> Self {
        let store = Self::default();
        {
            let mut map = store.accounts.lock().unwrap();
            for (id, currency, balance) in accounts {
                map.insert(
                    id.to_string(),
                    Account {
                        id: id.to_string(),
                        name: format!("{id} account"),
                        currency: currency.to_string(),
                        balance: *balance,
                        created_at: Utc::now(),
                    },
                );
            }
        }
        store
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn transfers(&self) -> Vec<(String, String, Cents)> {
        self.transfers.lock().unwrap().clone()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }
}

impl LedgerStore for StubStore {
    async fn create_account(
        &self,
        name: &str,
        currency: &str,
        balance: Cents,
    ) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = Account {
            id: format!("stub-{}", accounts.len() + 1),
            name: name.to_string(),
            currency: currency.to_string(),
            balance,
            created_at: Utc::now(),
        };
        accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn assert_account(&self, id: &str) -> Result<Account, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.accounts
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::AccountNotFound(id.to_string()))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<_> = self.accounts.lock().unwrap().values().cloned().collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(accounts)
    }

    async fn execute_transfer(
        &self,
        source: &str,
        destination: &str,
        amount: Cents,
    ) -> Result<Payment, StoreError> {
        self.transfers
            .lock()
            .unwrap()
            .push((source.to_string(), destination.to_string(), amount));

        let mut accounts = self.accounts.lock().unwrap();
        let from = accounts
            .get_mut(source)
            .ok_or_else(|| StoreError::AccountNotFound(source.to_string()))?;
        if from.balance < amount {
            return Err(StoreError::InsufficientFunds {
                account_id: source.to_string(),
                amount,
            });
        }
        from.balance -= amount;
        if let Some(to) = accounts.get_mut(destination) {
            to.balance += amount;
        }

        let mut payments = self.payments.lock().unwrap();
        let outgoing = Payment {
            id: format!("pay-{}", payments.len() + 1),
            account: source.to_string(),
            account_to: destination.to_string(),
            amount,
            direction: Direction::Outgoing,
            created_at: Utc::now(),
        };
        let incoming = Payment {
            id: format!("pay-{}", payments.len() + 2),
            account: destination.to_string(),
            account_to: source.to_string(),
            direction: Direction::Incoming,
            ..outgoing.clone()
        };
        payments.push(outgoing.clone());
        payments.push(incoming);
        Ok(outgoing)
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, StoreError> {
        Ok(self.payments.lock().unwrap().clone())
    }
}
