//! Position entity: one holding within one account.

use crate::domain::{AccountId, InstrumentCode, Market};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One holding within one account.
///
/// Invariant: `available <= volume`, and `avg_price > 0` unless the position
/// is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub account_id: AccountId,
    pub code: InstrumentCode,
    pub market: Market,
    /// Total shares held.
    pub volume: i64,
    /// Non-frozen shares sellable today.
    pub available: i64,
    /// Average cost per share.
    pub avg_price: Decimal,
    /// Display name of the instrument, when the ledger has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
