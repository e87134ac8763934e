mod error;
mod repository;
mod store;

pub use error::*;
pub use repository::*;
pub use store::*;

/// SQL migration for the initial schema (accounts + payments)
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
