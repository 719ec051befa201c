//! Trade dates in the provider's compact `YYYYMMDD` representation.

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A calendar trading date.
///
/// The market-data provider identifies corporate-action effective dates by a
/// compact `YYYYMMDD` string; the ledger and reports use ISO dates. Both
/// views are available from the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradeDate(pub NaiveDate);

impl TradeDate {
    /// Build a TradeDate from calendar components.
    ///
    /// Returns `None` for impossible dates (month 13, February 30, ...).
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(TradeDate)
    }

    /// Parse the provider's compact `YYYYMMDD` form.
    pub fn parse_compact(s: &str) -> Result<Self, TradeDateParseError> {
        NaiveDate::parse_from_str(s, "%Y%m%d")
            .map(TradeDate)
            .map_err(|_| TradeDateParseError(s.to_string()))
    }

    /// Format as the provider's compact `YYYYMMDD` form.
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// The default as-of date for a batch run: yesterday, local time.
    ///
    /// The scheduler fires strictly after market close, so the adjustments
    /// effective on the previous trading day are the ones to settle.
    pub fn yesterday() -> Self {
        TradeDate(Local::now().date_naive() - Duration::days(1))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl fmt::Display for TradeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.compact())
    }
}

/// Error for a string that is not a valid `YYYYMMDD` date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid trade date: {0}")]
pub struct TradeDateParseError(pub String);
