//! Repository layer for ledger store operations.
//!
//! This module provides the `Repository` struct for all store operations.
//! Methods are organized across submodules by entity:
//! - `accounts.rs` - account listing, reads, and balance writes
//! - `positions.rs` - position reads and upserts
//! - `adjustments.rs` - idempotency markers and the per-account adjustment
//!   transaction

mod accounts;
mod adjustments;
mod positions;

use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePool;
use std::str::FromStr;
use tracing::warn;

/// Repository for ledger store operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }
}

/// Canonical decimal text for storage: normalized, no exponent notation.
pub(crate) fn decimal_to_db(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Parse a stored decimal, falling back to zero on corrupt data.
pub(crate) fn decimal_from_db(raw: &str, column: &str) -> Decimal {
    Decimal::from_str(raw).unwrap_or_else(|_| {
        warn!("Unparseable decimal in column {}: {:?}", column, raw);
        Decimal::ZERO
    })
}
