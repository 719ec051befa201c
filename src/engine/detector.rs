//! Detection of positions affected by a corporate action on a date.

use crate::datasource::RecordSource;
use crate::domain::{ActionCategory, CorporateActionRecord, InstrumentCode, Position, TradeDate};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Outcome of one detection pass over a set of positions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Detection {
    /// Instruments with an ex-rights/ex-dividend record effective on the
    /// as-of date. Rights-only records stay in this mapping for audit even
    /// though the calculator will not touch them.
    pub records: HashMap<InstrumentCode, CorporateActionRecord>,
    /// Lookups that failed and were skipped; distinguishes "no action today"
    /// from a data outage.
    pub failed_lookups: usize,
    /// Matching-category records skipped for an impossible calendar date.
    pub malformed_records: usize,
}

impl Detection {
    /// True when no position is affected.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Finds which held positions cross a corporate-action effective date.
pub struct EventDetector {
    source: Arc<dyn RecordSource>,
    as_of: TradeDate,
}

impl EventDetector {
    pub fn new(source: Arc<dyn RecordSource>, as_of: TradeDate) -> Self {
        Self { source, as_of }
    }

    /// Detect affected instruments among `positions`.
    ///
    /// Lookups run concurrently but results merge in position iteration
    /// order, so when instruments repeat the last matching record wins
    /// deterministically for identical inputs. A failed lookup skips that
    /// instrument and is counted, never fatal.
    pub async fn detect(&self, positions: &[Position]) -> Detection {
        let lookups = positions.iter().map(|position| {
            self.source
                .fetch_corporate_actions(position.market, position.code.as_str())
        });
        let results = join_all(lookups).await;

        let mut detection = Detection::default();
        for (position, result) in positions.iter().zip(results) {
            let records = match result {
                Ok(records) => records,
                Err(e) => {
                    warn!(
                        "Corporate-action lookup failed for {}.{}: {}",
                        position.code, position.market, e
                    );
                    detection.failed_lookups += 1;
                    continue;
                }
            };

            for record in records {
                if record.category != ActionCategory::ExRightsExDividend {
                    continue;
                }
                match record.effective_date() {
                    Some(date) if date == self.as_of => {
                        detection.records.insert(position.code.clone(), record);
                    }
                    Some(_) => {}
                    None => {
                        warn!(
                            "Skipping corporate-action record for {}.{} with impossible date {:04}-{:02}-{:02}",
                            record.code, record.market, record.year, record.month, record.day
                        );
                        detection.malformed_records += 1;
                    }
                }
            }
        }

        detection
    }

    /// True iff any position has a matching record. Side-effect free.
    pub async fn is_affected(&self, positions: &[Position]) -> bool {
        !self.detect(positions).await.is_empty()
    }
}
