// Application layer: business rules in front of the ledger store.

mod accounts;
pub mod error;
mod service;
mod transfers;

#[cfg(test)]
mod testing;

pub use accounts::*;
pub use error::*;
pub use service::*;
pub use transfers::*;
