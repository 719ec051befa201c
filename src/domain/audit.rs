//! Applied-adjustment markers: the idempotency guard for batch re-runs.

use crate::domain::{AccountId, InstrumentCode, Market, TradeDate};
use serde::{Deserialize, Serialize};

/// Marker recording that one corporate action has been applied to one
/// account's position.
///
/// Persisted inside the same transaction as the adjustment itself and
/// checked before calculation, so re-running a batch for the same date can
/// never double-apply an adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentMarker {
    /// Stable unique identifier derived from the identity fields.
    pub event_key: String,
    pub account_id: AccountId,
    pub code: InstrumentCode,
    pub market: Market,
    pub effective_date: TradeDate,
}

impl AdjustmentMarker {
    /// Create a marker and compute its `event_key`.
    pub fn new(
        account_id: AccountId,
        code: InstrumentCode,
        market: Market,
        effective_date: TradeDate,
    ) -> Self {
        let event_key = Self::compute_event_key(&account_id, &code, market, effective_date);
        AdjustmentMarker {
            event_key,
            account_id,
            code,
            market,
            effective_date,
        }
    }

    /// Compute a stable unique key for (account, instrument, effective date).
    ///
    /// SHA-256 over length-prefixed fields, truncated to 128 bits. The
    /// birthday bound leaves ~2^64 collision resistance, far beyond any
    /// realistic marker count.
    pub fn compute_event_key(
        account_id: &AccountId,
        code: &InstrumentCode,
        market: Market,
        effective_date: TradeDate,
    ) -> String {
        use sha2::{Digest, Sha256};

        fn hash_var(hasher: &mut Sha256, data: &str) {
            hasher.update((data.len() as u32).to_le_bytes());
            hasher.update(data.as_bytes());
        }

        let mut hasher = Sha256::new();
        hash_var(&mut hasher, account_id.as_str());
        hash_var(&mut hasher, code.as_str());
        hasher.update([market.wire_code()]);
        hash_var(&mut hasher, &effective_date.compact());

        let hash = hasher.finalize();
        hex::encode(&hash[..16])
    }
}
