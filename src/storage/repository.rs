use std::str::FromStr;

use anyhow::{Context, Result as AnyResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::domain::{Account, Cents, Direction, Payment};

use super::{LedgerStore, MIGRATION_001_INITIAL, StoreError};

const ACCOUNT_COLUMNS: &str = "id, name, currency, balance, created_at";
const PAYMENT_COLUMNS: &str = "id, account, account_to, amount, direction, created_at";

/// Map a driver error onto a `StoreError` tagged with the failing operation.
fn fault(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |source| StoreError::from_sqlx(operation, source)
}

fn malformed(operation: &'static str) -> impl FnOnce(anyhow::Error) -> StoreError {
    move |source| StoreError::Decode { operation, source }
}

/// Repository persisting accounts and payment legs in SQLite.
///
/// Every public operation runs inside its own transaction. Dropping a
/// `sqlx::Transaction` without committing rolls it back, so an early return
/// through `?` never leaves a partial write behind.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a connection pool sized and timed according to `config`.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let config = config.clone().normalized();

        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(fault("parse_database_url"))?
            .create_if_missing(config.create_if_missing)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .max_lifetime(config.max_lifetime)
            .idle_timeout(config.idle_timeout)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(fault("connect"))?;

        debug!(
            database_url = %config.database_url,
            max_connections = config.max_connections,
            "connected to ledger database"
        );
        Ok(Self::new(pool))
    }

    /// Apply the built-in schema. Safe to run repeatedly.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .map_err(fault("migrate"))?;
        Ok(())
    }

    /// Run a user-supplied SQL script inside a single transaction.
    pub async fn run_script(&self, script: &str) -> Result<(), StoreError> {
        const OP: &str = "run_script";
        let mut tx = self.begin(OP).await?;
        sqlx::query(script)
            .execute(&mut *tx)
            .await
            .map_err(fault(OP))?;
        Self::commit(tx, OP).await
    }

    /// Connect, apply the schema and run the configured init script, if any.
    pub async fn init(config: &StoreConfig) -> Result<Self, StoreError> {
        let repo = Self::connect(config).await?;
        repo.migrate().await?;

        if let Some(path) = &config.init_script {
            let script = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| StoreError::InitScript {
                    path: path.clone(),
                    source,
                })?;
            repo.run_script(&script).await?;
            info!(path = %path.display(), "applied init script");
        }

        Ok(repo)
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn begin(&self, operation: &'static str) -> Result<Transaction<'static, Sqlite>, StoreError> {
        self.pool.begin().await.map_err(fault(operation))
    }

    async fn commit(tx: Transaction<'static, Sqlite>, operation: &'static str) -> Result<(), StoreError> {
        tx.commit().await.map_err(fault(operation))
    }

    // ========================
    // Account operations
    // ========================

    /// Insert a new account and return it as stored (with the database-assigned timestamp).
    pub async fn create_account(
        &self,
        name: &str,
        currency: &str,
        balance: Cents,
    ) -> Result<Account, StoreError> {
        const OP: &str = "create_account";
        let id = Uuid::new_v4().to_string();
        let mut tx = self.begin(OP).await?;

        sqlx::query("INSERT INTO accounts (id, name, currency, balance) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(currency)
            .bind(balance)
            .execute(&mut *tx)
            .await
            .map_err(fault(OP))?;

        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"
        ))
        .bind(&id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(fault(OP))?
        .ok_or_else(|| StoreError::AccountNotFound(id.clone()))?;
        let account = Self::row_to_account(&row).map_err(malformed(OP))?;

        Self::commit(tx, OP).await?;
        debug!(account_id = %account.id, currency = %account.currency, "account created");
        Ok(account)
    }

    /// Get an account by ID, failing with `AccountNotFound` if it does not exist.
    pub async fn assert_account(&self, id: &str) -> Result<Account, StoreError> {
        const OP: &str = "assert_account";
        let mut tx = self.begin(OP).await?;

        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(fault(OP))?
        .ok_or_else(|| StoreError::AccountNotFound(id.to_string()))?;
        let account = Self::row_to_account(&row).map_err(malformed(OP))?;

        Self::commit(tx, OP).await?;
        Ok(account)
    }

    /// List all accounts ordered by creation time (insertion order breaks ties).
    pub async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        const OP: &str = "list_accounts";
        let mut tx = self.begin(OP).await?;

        let rows = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at, rowid"
        ))
        .fetch_all(&mut *tx)
        .await
        .map_err(fault(OP))?;
        let accounts = rows
            .iter()
            .map(Self::row_to_account)
            .collect::<AnyResult<Vec<_>>>()
            .map_err(malformed(OP))?;

        Self::commit(tx, OP).await?;
        Ok(accounts)
    }

    fn row_to_account(row: &SqliteRow) -> AnyResult<Account> {
        let created_at: String = row.try_get("created_at")?;

        Ok(Account {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            currency: row.try_get("currency")?,
            balance: row.try_get("balance")?,
            created_at: parse_timestamp(&created_at).context("Invalid account created_at")?,
        })
    }

    // ========================
    // Transfer operations
    // ========================

    /// Move `amount` from `source` to `destination` and record both legs.
    ///
    /// The debit is a single conditional update (`balance >= amount`), so two
    /// concurrent transfers out of the same account can never both see a
    /// balance that only covers one of them. If the debit touches no row the
    /// transaction is rolled back and `InsufficientFunds` is returned.
    pub async fn execute_transfer(
        &self,
        source: &str,
        destination: &str,
        amount: Cents,
    ) -> Result<Payment, StoreError> {
        const OP: &str = "execute_transfer";
        let mut tx = self.begin(OP).await?;

        let debited = sqlx::query(
            "UPDATE accounts SET balance = balance - ? WHERE id = ? AND balance >= ?",
        )
        .bind(amount)
        .bind(source)
        .bind(amount)
        .execute(&mut *tx)
        .await
        .map_err(fault(OP))?;

        if debited.rows_affected() == 0 {
            tx.rollback().await.map_err(fault(OP))?;
            debug!(account_id = source, amount, "transfer rejected: not enough money");
            return Err(StoreError::InsufficientFunds {
                account_id: source.to_string(),
                amount,
            });
        }

        let credited = sqlx::query("UPDATE accounts SET balance = balance + ? WHERE id = ?")
            .bind(amount)
            .bind(destination)
            .execute(&mut *tx)
            .await
            .map_err(fault(OP))?;

        // The debit above must not survive without its credit.
        if credited.rows_affected() == 0 {
            tx.rollback().await.map_err(fault(OP))?;
            return Err(StoreError::AccountNotFound(destination.to_string()));
        }

        let outgoing_id = Uuid::new_v4().to_string();
        let incoming_id = Uuid::new_v4().to_string();
        let insert = "INSERT INTO payments (id, account, account_to, amount, direction) VALUES (?, ?, ?, ?, ?)";

        sqlx::query(insert)
            .bind(&outgoing_id)
            .bind(source)
            .bind(destination)
            .bind(amount)
            .bind(Direction::Outgoing.as_str())
            .execute(&mut *tx)
            .await
            .map_err(fault(OP))?;

        sqlx::query(insert)
            .bind(&incoming_id)
            .bind(destination)
            .bind(source)
            .bind(amount)
            .bind(Direction::Incoming.as_str())
            .execute(&mut *tx)
            .await
            .map_err(fault(OP))?;

        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?"
        ))
        .bind(&outgoing_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(fault(OP))?;
        let payment = Self::row_to_payment(&row).map_err(malformed(OP))?;

        Self::commit(tx, OP).await?;
        debug!(
            payment_id = %payment.id,
            source,
            destination,
            amount,
            "transfer committed"
        );
        Ok(payment)
    }

    /// List every payment leg in insertion order.
    pub async fn list_payments(&self) -> Result<Vec<Payment>, StoreError> {
        const OP: &str = "list_payments";
        let mut tx = self.begin(OP).await?;

        let rows = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY rowid"
        ))
        .fetch_all(&mut *tx)
        .await
        .map_err(fault(OP))?;
        let payments = rows
            .iter()
            .map(Self::row_to_payment)
            .collect::<AnyResult<Vec<_>>>()
            .map_err(malformed(OP))?;

        Self::commit(tx, OP).await?;
        Ok(payments)
    }

    fn row_to_payment(row: &SqliteRow) -> AnyResult<Payment> {
        let direction: String = row.try_get("direction")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Payment {
            id: row.try_get("id")?,
            account: row.try_get("account")?,
            account_to: row.try_get("account_to")?,
            amount: row.try_get("amount")?,
            direction: direction.parse::<Direction>().map_err(anyhow::Error::msg)?,
            created_at: parse_timestamp(&created_at).context("Invalid payment created_at")?,
        })
    }
}

fn parse_timestamp(value: &str) -> AnyResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("not an RFC 3339 timestamp: {value}"))?
        .with_timezone(&Utc))
}

impl LedgerStore for Repository {
    async fn create_account(
        &self,
        name: &str,
        currency: &str,
        balance: Cents,
    ) -> Result<Account, StoreError> {
        Repository::create_account(self, name, currency, balance).await
    }

    async fn assert_account(&self, id: &str) -> Result<Account, StoreError> {
        Repository::assert_account(self, id).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        Repository::list_accounts(self).await
    }

    async fn execute_transfer(
        &self,
        source: &str,
        destination: &str,
        amount: Cents,
    ) -> Result<Payment, StoreError> {
        Repository::execute_transfer(self, source, destination, amount).await
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, StoreError> {
        Repository::list_payments(self).await
    }
}
