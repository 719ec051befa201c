//! Market identifiers and their external code mappings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Trading venue an instrument is listed on.
///
/// The market-data provider addresses venues by a numeric wire code while
/// the ledger stores a two-letter string code. Both mappings are total in
/// both directions so no ad hoc lookup table can drift out of sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    /// Shanghai Stock Exchange.
    #[serde(rename = "SH")]
    Shanghai,
    /// Shenzhen Stock Exchange.
    #[serde(rename = "SZ")]
    Shenzhen,
}

impl Market {
    /// Numeric code used by the market-data provider.
    pub fn wire_code(&self) -> u8 {
        match self {
            Market::Shanghai => 1,
            Market::Shenzhen => 0,
        }
    }

    /// Reverse of [`Market::wire_code`].
    pub fn from_wire_code(code: u8) -> Option<Market> {
        match code {
            1 => Some(Market::Shanghai),
            0 => Some(Market::Shenzhen),
            _ => None,
        }
    }

    /// Two-letter code as stored in the ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Shanghai => "SH",
            Market::Shenzhen => "SZ",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Market {
    type Err = MarketParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SH" => Ok(Market::Shanghai),
            "SZ" => Ok(Market::Shenzhen),
            other => Err(MarketParseError(other.to_string())),
        }
    }
}

/// Error for an unrecognized market string code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown market code: {0}")]
pub struct MarketParseError(pub String);
