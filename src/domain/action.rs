//! Corporate-action records as delivered by the market-data provider.

use crate::domain::{InstrumentCode, Market, TradeDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Provider category of a corporate action.
///
/// Only ex-rights/ex-dividend events (wire category 1) carry computable
/// adjustments; every other category is representable but ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ActionCategory {
    /// Ex-rights / ex-dividend event.
    ExRightsExDividend,
    /// Any other provider category, carried through untouched.
    Other(i64),
}

impl ActionCategory {
    /// Provider wire code for this category.
    pub fn wire_code(&self) -> i64 {
        match self {
            ActionCategory::ExRightsExDividend => 1,
            ActionCategory::Other(code) => *code,
        }
    }
}

impl From<i64> for ActionCategory {
    fn from(code: i64) -> Self {
        match code {
            1 => ActionCategory::ExRightsExDividend,
            other => ActionCategory::Other(other),
        }
    }
}

impl From<ActionCategory> for i64 {
    fn from(category: ActionCategory) -> Self {
        category.wire_code()
    }
}

/// One dated corporate action for one instrument.
///
/// Read-only: fetched per run, never mutated or persisted by this engine.
/// Ratios are expressed per 10 shares held, as the provider quotes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorporateActionRecord {
    pub code: InstrumentCode,
    pub market: Market,
    /// Effective date components as the provider sends them. Not validated
    /// at the wire boundary; see [`CorporateActionRecord::effective_date`].
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub category: ActionCategory,
    /// Bonus shares granted per 10 held.
    pub stock_ratio: Decimal,
    /// Cash granted per 10 held.
    pub cash_ratio: Decimal,
    /// Rights-issue shares offered per 10 held.
    pub rights_ratio: Decimal,
    /// Rights-issue subscription price.
    pub rights_price: Decimal,
}

impl CorporateActionRecord {
    /// The date this action takes effect, or `None` when the provider sent
    /// an impossible calendar date.
    pub fn effective_date(&self) -> Option<TradeDate> {
        TradeDate::from_ymd(self.year, self.month, self.day)
    }

    /// True when this record grants bonus shares or cash.
    pub fn has_computable_adjustment(&self) -> bool {
        !self.stock_ratio.is_zero() || !self.cash_ratio.is_zero()
    }

    /// True when this record only describes a rights issue.
    pub fn is_rights_only(&self) -> bool {
        !self.rights_ratio.is_zero()
            && !self.rights_price.is_zero()
            && !self.has_computable_adjustment()
    }
}
