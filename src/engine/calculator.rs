//! Corporate-action arithmetic for one position.

use crate::domain::{
    Account, AdjustmentSignal, CorporateActionRecord, Position, SignalKind, TradeDate,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

/// Result of applying one corporate action to one position.
///
/// New values, not mutations: callers decide what to persist, and the input
/// account/position remain untouched for comparison or rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustment {
    pub position: Position,
    pub account: Account,
    pub signals: Vec<AdjustmentSignal>,
}

/// Apply one corporate-action record to a position and its account.
///
/// Steps run in a fixed order; the cash dividend is computed on the volume
/// the stock dividend has already adjusted, which matches how the exchange
/// settles a combined ex-rights/ex-dividend date. Share and cash bonus
/// counts truncate toward zero; prices stay in decimal arithmetic.
///
/// Carries no idempotency guard of its own: applying the same record twice
/// compounds. The batch layer checks the applied-adjustment marker first.
pub fn adjust(
    account: &Account,
    position: &Position,
    record: &CorporateActionRecord,
    trade_date: TradeDate,
) -> Adjustment {
    let mut position = position.clone();
    let mut account = account.clone();
    let mut signals = Vec::new();

    // Stock dividend: bonus shares per 10 held, available immediately.
    if !record.stock_ratio.is_zero() {
        let bonus_shares = per_ten_held(position.volume, record.stock_ratio);
        position.volume += bonus_shares;
        position.available = position.volume;
        position.avg_price =
            position.avg_price / (Decimal::ONE + record.stock_ratio / Decimal::TEN);

        signals.push(AdjustmentSignal::new(
            position.code.clone(),
            position.market,
            trade_date,
            SignalKind::StockAdjustment,
            bonus_shares,
            position.name.clone(),
        ));
    }

    // Cash dividend: cash per 10 held, on the already-adjusted volume.
    if !record.cash_ratio.is_zero() {
        let bonus = per_ten_held(position.volume, record.cash_ratio);
        account.available += Decimal::from(bonus);
        account.market_value -= Decimal::from(bonus);
        position.avg_price -= record.cash_ratio / Decimal::TEN;

        signals.push(AdjustmentSignal::new(
            position.code.clone(),
            position.market,
            trade_date,
            SignalKind::CashAdjustment,
            bonus,
            position.name.clone(),
        ));
    }

    // Rights issues (rights_ratio/rights_price) are deliberately left
    // uncomputed; operators review them from the detection audit trail.

    if position.volume > 0 && position.avg_price <= Decimal::ZERO {
        warn!(
            "Cost basis of {}.{} fell to {} after adjustment",
            position.code, position.market, position.avg_price
        );
    }

    Adjustment {
        position,
        account,
        signals,
    }
}

/// `floor(volume * ratio / 10)` for a per-10-shares ratio.
fn per_ten_held(volume: i64, ratio: Decimal) -> i64 {
    let granted = (Decimal::from(volume) * ratio / Decimal::TEN).trunc();
    granted.to_i64().unwrap_or_else(|| {
        warn!("Bonus count {} does not fit in i64; granting nothing", granted);
        0
    })
}
