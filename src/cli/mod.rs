use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;

use crate::application::{AppError, ErrorKind, LedgerService};
use crate::config::{AccountConfig, LedgerConfig, StoreConfig};
use crate::domain::{Account, ParseCentsError, Payment, format_cents, parse_cents};

/// Purse - transactional money ledger
#[derive(Parser)]
#[command(name = "purse")]
#[command(about = "Accounts, balance-checked transfers and double-entry payment records")]
#[command(version)]
pub struct Cli {
    /// Database file path or sqlite: URL
    #[arg(short, long, env = "PURSE_DATABASE_URL", default_value = "purse.db")]
    pub database: String,

    /// Currencies accounts may be opened in (comma separated)
    #[arg(
        long = "allowed-currency",
        env = "PURSE_ALLOWED_CURRENCIES",
        value_delimiter = ','
    )]
    pub allowed_currencies: Vec<String>,

    /// Maximum number of pooled database connections
    #[arg(long, env = "PURSE_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// Connections kept open while idle
    #[arg(long, env = "PURSE_MIN_CONNECTIONS", default_value_t = 0)]
    pub min_connections: u32,

    /// Maximum lifetime of a pooled connection, in seconds
    #[arg(
        long = "connection-lifetime",
        env = "PURSE_CONNECTION_LIFETIME_SECS",
        default_value_t = 60
    )]
    pub connection_lifetime_secs: u64,

    /// SQL script to run once after the schema is created (init only)
    #[arg(long, env = "PURSE_INIT_SCRIPT")]
    pub init_script: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Transfer money between two accounts
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        amount: String,

        /// Source account ID
        #[arg(long)]
        from: String,

        /// Destination account ID
        #[arg(long)]
        to: String,
    },

    /// List payment records
    Payments {
        /// Only show legs booked against this account
        #[arg(long)]
        account: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account
    Create {
        /// Display name
        name: String,

        /// Currency code (must be in the allow-list)
        #[arg(short, long)]
        currency: String,

        /// Opening balance (e.g., "100.00")
        #[arg(short, long)]
        balance: String,
    },

    /// List all accounts
    List,

    /// Show a single account
    Show {
        /// Account ID
        id: String,
    },
}

impl Cli {
    fn database_url(&self) -> String {
        if self.database.starts_with("sqlite:") {
            self.database.clone()
        } else {
            format!("sqlite:{}", self.database)
        }
    }

    pub fn config(&self) -> LedgerConfig {
        let mut store = StoreConfig::new(self.database_url());
        store.max_connections = self.max_connections;
        store.min_connections = self.min_connections;
        store.max_lifetime = Duration::from_secs(self.connection_lifetime_secs);
        store.init_script = self.init_script.clone();

        LedgerConfig {
            store: store.normalized(),
            accounts: AccountConfig::new(self.allowed_currencies.iter().cloned()),
        }
    }

    /// Run the command and translate the outcome into a process exit code.
    pub async fn run(self) -> ExitCode {
        let format = self.format;
        match self.execute().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                report_error(format, &err);
                ExitCode::from(exit_code(&err))
            }
        }
    }

    async fn execute(self) -> Result<()> {
        let config = self.config();
        let format = self.format;

        match self.command {
            Commands::Init => {
                LedgerService::init(&config).await?;
                match format {
                    OutputFormat::Table => println!("Database initialized: {}", self.database),
                    OutputFormat::Json => print_json(&json!({ "database": self.database }))?,
                }
            }

            Commands::Account(account_cmd) => {
                let service = LedgerService::connect(&config).await?;
                run_account_command(&service, account_cmd, format).await?;
            }

            Commands::Transfer { amount, from, to } => {
                let service = LedgerService::connect(&config).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                let payment = service.transfer_money(&from, &to, amount_cents).await?;

                match format {
                    OutputFormat::Table => println!(
                        "Transferred {} {} -> {} ({})",
                        format_cents(payment.amount),
                        payment.account,
                        payment.account_to,
                        payment.id
                    ),
                    OutputFormat::Json => print_json(&payment)?,
                }
            }

            Commands::Payments { account } => {
                let service = LedgerService::connect(&config).await?;
                let mut payments = service.list_payments().await?;
                if let Some(account) = &account {
                    payments.retain(|p| &p.account == account);
                }

                match format {
                    OutputFormat::Table => print_payments(&payments),
                    OutputFormat::Json => print_json(&payments)?,
                }
            }
        }

        Ok(())
    }
}

async fn run_account_command(
    service: &LedgerService,
    cmd: AccountCommands,
    format: OutputFormat,
) -> Result<()> {
    match cmd {
        AccountCommands::Create {
            name,
            currency,
            balance,
        } => {
            let balance_cents =
                parse_cents(&balance).context("Invalid balance format. Use '100.00' or '100'")?;
            let account = service
                .create_account(&name, &currency, balance_cents)
                .await?;

            match format {
                OutputFormat::Table => println!(
                    "Created account: {} ({}, {} {})",
                    account.name,
                    account.id,
                    format_cents(account.balance),
                    account.currency
                ),
                OutputFormat::Json => print_json(&account)?,
            }
        }

        AccountCommands::List => {
            let accounts = service.list_accounts().await?;
            match format {
                OutputFormat::Table => print_accounts(&accounts),
                OutputFormat::Json => print_json(&accounts)?,
            }
        }

        AccountCommands::Show { id } => {
            let account = service.get_account(&id).await?;
            match format {
                OutputFormat::Table => {
                    println!("Account: {}", account.name);
                    println!("  ID:       {}", account.id);
                    println!("  Currency: {}", account.currency);
                    println!("  Balance:  {}", format_cents(account.balance));
                    println!(
                        "  Created:  {}",
                        account.created_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
                OutputFormat::Json => print_json(&account)?,
            }
        }
    }

    Ok(())
}

fn print_accounts(accounts: &[Account]) {
    if accounts.is_empty() {
        println!("No accounts found.");
        return;
    }

    println!(
        "{:<36}  {:<20} {:<8} {:>14}",
        "ID", "NAME", "CURRENCY", "BALANCE"
    );
    println!("{}", "-".repeat(82));
    for account in accounts {
        println!(
            "{:<36}  {:<20} {:<8} {:>14}",
            account.id,
            truncate(&account.name, 20),
            account.currency,
            format_cents(account.balance)
        );
    }
}

fn print_payments(payments: &[Payment]) {
    if payments.is_empty() {
        println!("No payments found.");
        return;
    }

    println!(
        "{:<20} {:<36}  {:<36}  {:<8} {:>12}",
        "DATE", "ACCOUNT", "COUNTERPARTY", "DIR", "AMOUNT"
    );
    println!("{}", "-".repeat(118));
    for payment in payments {
        println!(
            "{:<20} {:<36}  {:<36}  {:<8} {:>12}",
            payment.created_at.format("%Y-%m-%d %H:%M:%S"),
            payment.account,
            payment.account_to,
            payment.direction,
            format_cents(payment.signed_amount())
        );
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Responses are wrapped as `{"result": ...}`, failures as `{"error": "..."}`.
fn print_json<T: Serialize + ?Sized>(result: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(&json!({ "result": result }))?;
    println!("{body}");
    Ok(())
}

fn report_error(format: OutputFormat, err: &anyhow::Error) {
    match format {
        OutputFormat::Table => eprintln!("Error: {err:#}"),
        OutputFormat::Json => println!("{}", json!({ "error": format!("{err:#}") })),
    }
}

/// Map an error onto the exit code policy: 2 invalid request, 3 refused by a
/// ledger rule, 4 database unreachable, 1 anything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ParseCentsError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<AppError>().map(AppError::kind) {
        Some(ErrorKind::Validation) => 2,
        Some(ErrorKind::Business) => 3,
        Some(ErrorKind::Connection) => 4,
        Some(ErrorKind::Storage) | None => 1,
    }
}
