use crate::config::{AccountConfig, LedgerConfig};
use crate::domain::{Account, Cents, Payment};
use crate::storage::{LedgerStore, Repository};

use super::{AccountService, AppError, TransferService};

/// Application service providing the ledger's operations.
/// This is the primary interface for any client (CLI, API, etc.).
pub struct LedgerService<S = Repository> {
    accounts: AccountService<S>,
    transfers: TransferService<S>,
}

impl LedgerService<Repository> {
    /// Open (creating if needed) the database, apply the schema and build the service.
    pub async fn init(config: &LedgerConfig) -> Result<Self, AppError> {
        let store = config.store.clone().with_create_if_missing(true);
        let repo = Repository::init(&store).await?;
        Self::new(&config.accounts, repo)
    }

    /// Connect to an existing database.
    pub async fn connect(config: &LedgerConfig) -> Result<Self, AppError> {
        let repo = Repository::connect(&config.store).await?;
        Self::new(&config.accounts, repo)
    }
}

impl<S: LedgerStore + Clone> LedgerService<S> {
    pub fn new(config: &AccountConfig, store: S) -> Result<Self, AppError> {
        Ok(Self {
            accounts: AccountService::new(config, store.clone())?,
            transfers: TransferService::new(store),
        })
    }
}

impl<S: LedgerStore> LedgerService<S> {
    pub fn accounts(&self) -> &AccountService<S> {
        &self.accounts
    }

    pub fn transfers(&self) -> &TransferService<S> {
        &self.transfers
    }

    pub async fn create_account(
        &self,
        name: &str,
        currency: &str,
        balance: Cents,
    ) -> Result<Account, AppError> {
        self.accounts.create(name, currency, balance).await
    }

    pub async fn get_account(&self, id: &str) -> Result<Account, AppError> {
        self.accounts.get(id).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        self.accounts.list().await
    }

    pub async fn transfer_money(
        &self,
        source_id: &str,
        destination_id: &str,
        amount: Cents,
    ) -> Result<Payment, AppError> {
        self.transfers
            .transfer_money(source_id, destination_id, amount)
            .await
    }

    pub async fn list_payments(&self) -> Result<Vec<Payment>, AppError> {
        self.transfers.list_payments().await
    }
}
