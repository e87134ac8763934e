use tracing::{debug, info};

use crate::config::AccountConfig;
use crate::domain::{Account, Cents};
use crate::storage::LedgerStore;

use super::AppError;

/// Opens and lists accounts.
///
/// The currency allow-list is fixed at construction time and normalized to
/// lower case. A requested currency is compared against it as given, so
/// `"USD"` is not accepted when `"usd"` is allowed.
pub struct AccountService<S> {
    store: S,
    currencies: Vec<String>,
}

impl<S: LedgerStore> AccountService<S> {
    /// Create the service. Fails with `EmptyCurrencyList` when the
    /// configuration allows no currency at all.
    pub fn new(config: &AccountConfig, store: S) -> Result<Self, AppError> {
        let currencies = normalize_currencies(&config.allowed_currencies)?;
        Ok(Self { store, currencies })
    }

    pub fn allowed_currencies(&self) -> &[String] {
        &self.currencies
    }

    pub fn is_supported(&self, currency: &str) -> bool {
        self.currencies.iter().any(|allowed| allowed == currency)
    }

    /// Open an account with an initial positive balance.
    pub async fn create(
        &self,
        name: &str,
        currency: &str,
        balance: Cents,
    ) -> Result<Account, AppError> {
        if !self.is_supported(currency) {
            debug!(currency, "account rejected: unsupported currency");
            return Err(AppError::UnsupportedCurrency(currency.to_string()));
        }
        if balance <= 0 {
            debug!(balance, "account rejected: non-positive balance");
            return Err(AppError::InvalidBalance(balance));
        }

        let account = self.store.create_account(name, currency, balance).await?;
        info!(account_id = %account.id, currency, balance, "account opened");
        Ok(account)
    }

    /// Look up a single account.
    pub async fn get(&self, id: &str) -> Result<Account, AppError> {
        Ok(self.store.assert_account(id).await?)
    }

    /// All accounts, oldest first.
    pub async fn list(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.store.list_accounts().await?)
    }
}

/// Lower-case, trim and drop blank entries. Fails if nothing is left.
pub fn normalize_currencies(currencies: &[String]) -> Result<Vec<String>, AppError> {
    let normalized: Vec<String> = currencies
        .iter()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();

    if normalized.is_empty() {
        return Err(AppError::EmptyCurrencyList);
    }
    Ok(normalized)
}
