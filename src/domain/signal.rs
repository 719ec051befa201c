//! Adjustment signals: audit records of applied corporate actions.

use crate::domain::{InstrumentCode, Market, TradeDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of ledger adjustment a signal describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Bonus shares granted (ex-rights).
    StockAdjustment,
    /// Cash dividend paid out (ex-dividend).
    CashAdjustment,
}

impl SignalKind {
    /// Downstream wire code for this signal kind.
    pub fn wire_code(&self) -> i64 {
        match self {
            SignalKind::StockAdjustment => 220010,
            SignalKind::CashAdjustment => 221007,
        }
    }
}

/// Audit record of one applied adjustment.
///
/// Produced by the calculator, logged by the batch, never persisted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentSignal {
    pub code: InstrumentCode,
    pub market: Market,
    pub trade_date: TradeDate,
    pub kind: SignalKind,
    /// Bonus shares for stock adjustments, cash units for cash adjustments.
    pub effect: i64,
    /// Transaction price; corporate actions trade at zero.
    pub price: Decimal,
    /// Tax withheld; always zero in this model.
    pub tax: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AdjustmentSignal {
    pub fn new(
        code: InstrumentCode,
        market: Market,
        trade_date: TradeDate,
        kind: SignalKind,
        effect: i64,
        name: Option<String>,
    ) -> Self {
        AdjustmentSignal {
            code,
            market,
            trade_date,
            kind,
            effect,
            price: Decimal::ZERO,
            tax: Decimal::ZERO,
            name,
        }
    }
}
