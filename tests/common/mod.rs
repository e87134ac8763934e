// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use purse::config::{AccountConfig, LedgerConfig, StoreConfig};
use purse::domain::{Account, Cents};
use purse::application::LedgerService;
use tempfile::TempDir;

/// Currencies every test service accepts.
pub const CURRENCIES: [&str; 2] = ["usd", "eur"];

/// Configuration pointing at a database file inside `dir`.
pub fn test_config(dir: &TempDir) -> LedgerConfig {
    let db_path = dir.path().join("test.db");
    LedgerConfig {
        store: StoreConfig::for_path(db_path.to_str().unwrap()),
        accounts: AccountConfig::new(CURRENCIES),
    }
}

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = LedgerService::init(&test_config(&temp_dir)).await?;
    Ok((service, temp_dir))
}

/// Open an account with the given currency and balance (in cents).
pub async fn open_account(
    service: &LedgerService,
    name: &str,
    currency: &str,
    balance: Cents,
) -> Result<Account> {
    Ok(service.create_account(name, currency, balance).await?)
}

/// Current balance of an account, read back from the store.
pub async fn balance_of(service: &LedgerService, id: &str) -> Result<Cents> {
    Ok(service.get_account(id).await?.balance)
}
