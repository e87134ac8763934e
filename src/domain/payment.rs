use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Cents};

pub type PaymentId = String;

/// Which side of a transfer a payment leg records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Booked against the source account (balance decreased)
    Outgoing,
    /// Booked against the destination account (balance increased)
    Incoming,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outgoing => "outgoing",
            Direction::Incoming => "incoming",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outgoing" => Ok(Direction::Outgoing),
            "incoming" => Ok(Direction::Incoming),
            other => Err(format!("invalid payment direction: {other}")),
        }
    }
}

/// One leg of a transfer. A transfer always writes two legs with the same
/// amount in the same transaction: an outgoing leg booked against the source
/// and an incoming leg booked against the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    /// Account this leg is booked against
    #[serde(rename = "account_from")]
    pub account: AccountId,
    /// Counterparty account
    pub account_to: AccountId,
    /// Amount in cents (always positive)
    pub amount: Cents,
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn is_outgoing(&self) -> bool {
        self.direction == Direction::Outgoing
    }

    /// Signed effect of this leg on the balance of `self.account`.
    pub fn signed_amount(&self) -> Cents {
        match self.direction {
            Direction::Outgoing => -self.amount,
            Direction::Incoming => self.amount,
        }
    }
}
