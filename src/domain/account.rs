//! Account entity: one simulated portfolio.

use crate::domain::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One simulated portfolio as persisted in the ledger store.
///
/// Invariant: `assets` stays close to `available + market_value`; a small
/// drift from unrealized P&L timing is tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    /// Total assets.
    pub assets: Decimal,
    /// Available (uncommitted) cash.
    pub available: Decimal,
    /// Market value of all holdings.
    pub market_value: Decimal,
    /// Initial paid-in capital.
    pub capital: Decimal,
    /// Fixed trading cost rate.
    pub cost_rate: Decimal,
    /// Stamp tax rate.
    pub tax_rate: Decimal,
    /// Slippage tolerance.
    pub slip_point: Decimal,
}
