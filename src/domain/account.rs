use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Cents;

/// Opaque account identifier, assigned by the store at creation.
pub type AccountId = String;

/// A balance-holding account. The balance never goes below zero and only
/// changes through a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    /// Lower-cased currency code from the allow-list
    pub currency: String,
    /// Balance in cents
    pub balance: Cents,
    pub created_at: DateTime<Utc>,
}
