use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_CONNECTION_LIFETIME: Duration = Duration::from_secs(60);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub store: StoreConfig,
    pub accounts: AccountConfig,
}

/// Connection and pool settings for the ledger store.
///
/// Zero-valued pool sizes and durations fall back to the defaults above.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite URL, e.g. `sqlite:purse.db`
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
    /// How long a writer waits on a locked database before giving up
    pub busy_timeout: Duration,
    /// Extra SQL run once after the built-in schema
    pub init_script: Option<PathBuf>,
    pub create_if_missing: bool,
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: 0,
            max_lifetime: DEFAULT_CONNECTION_LIFETIME,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            init_script: None,
            create_if_missing: false,
        }
    }

    /// Configuration for a database file on disk.
    pub fn for_path(path: &str) -> Self {
        Self::new(format!("sqlite:{}", path))
    }

    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn with_init_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.init_script = Some(path.into());
        self
    }

    /// Replace zero values with defaults.
    pub fn normalized(mut self) -> Self {
        if self.max_connections == 0 {
            self.max_connections = DEFAULT_MAX_CONNECTIONS;
        }
        if self.min_connections > self.max_connections {
            self.min_connections = self.max_connections;
        }
        if self.max_lifetime.is_zero() {
            self.max_lifetime = DEFAULT_CONNECTION_LIFETIME;
        }
        if self.idle_timeout.is_zero() {
            self.idle_timeout = DEFAULT_IDLE_TIMEOUT;
        }
        if self.acquire_timeout.is_zero() {
            self.acquire_timeout = DEFAULT_ACQUIRE_TIMEOUT;
        }
        if self.busy_timeout.is_zero() {
            self.busy_timeout = DEFAULT_BUSY_TIMEOUT;
        }
        self
    }
}

/// Account rules.
#[derive(Debug, Clone, Default)]
pub struct AccountConfig {
    /// Currencies accounts may be opened in. Normalized to lower case by
    /// the account service.
    pub allowed_currencies: Vec<String>,
}

impl AccountConfig {
    pub fn new<I, S>(currencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_currencies: currencies.into_iter().map(Into::into).collect(),
        }
    }
}
