mod repository;

pub use repository::*;

/// SQL migration for parties, invoices and cash flows
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
