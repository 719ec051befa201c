//! Mock record source for testing without network calls.

use super::{RecordSource, RecordSourceError};
use crate::domain::{CorporateActionRecord, Market};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock record source that returns predefined corporate-action records.
///
/// Individual instruments can be marked as failing to exercise the
/// skip-and-count handling of unavailable lookups.
#[derive(Debug, Clone, Default)]
pub struct MockRecordSource {
    records: Vec<CorporateActionRecord>,
    failing: HashSet<(u8, String)>,
    fetch_count: Arc<AtomicUsize>,
}

impl MockRecordSource {
    /// Create a new mock record source with no records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to the mock record source.
    pub fn with_record(mut self, record: CorporateActionRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Add multiple records to the mock record source.
    pub fn with_records(mut self, records: Vec<CorporateActionRecord>) -> Self {
        self.records.extend(records);
        self
    }

    /// Make lookups for one instrument fail with a network error.
    pub fn with_failure(mut self, market: Market, code: &str) -> Self {
        self.failing.insert((market.wire_code(), code.to_string()));
        self
    }

    /// Number of fetches served so far, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for MockRecordSource {
    async fn fetch_corporate_actions(
        &self,
        market: Market,
        code: &str,
    ) -> Result<Vec<CorporateActionRecord>, RecordSourceError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&(market.wire_code(), code.to_string())) {
            return Err(RecordSourceError::NetworkError(format!(
                "mock failure for {}.{}",
                code, market
            )));
        }

        Ok(self
            .records
            .iter()
            .filter(|r| r.market == market && r.code.as_str() == code)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActionCategory, InstrumentCode};
    use rust_decimal::Decimal;

    fn make_record(code: &str, market: Market) -> CorporateActionRecord {
        CorporateActionRecord {
            code: InstrumentCode::new(code),
            market,
            year: 2020,
            month: 8,
            day: 17,
            category: ActionCategory::ExRightsExDividend,
            stock_ratio: Decimal::from(3),
            cash_ratio: Decimal::ZERO,
            rights_ratio: Decimal::ZERO,
            rights_price: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn test_mock_returns_matching_records() {
        let record = make_record("600372", Market::Shanghai);
        let mock = MockRecordSource::new().with_record(record.clone());
        let records = mock
            .fetch_corporate_actions(Market::Shanghai, "600372")
            .await
            .unwrap();
        assert_eq!(records, vec![record]);
    }

    #[tokio::test]
    async fn test_mock_filters_by_market_and_code() {
        let mock = MockRecordSource::new().with_record(make_record("600372", Market::Shanghai));
        let records = mock
            .fetch_corporate_actions(Market::Shenzhen, "600372")
            .await
            .unwrap();
        assert!(records.is_empty());

        let records = mock
            .fetch_corporate_actions(Market::Shanghai, "600519")
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let mock = MockRecordSource::new()
            .with_record(make_record("600372", Market::Shanghai))
            .with_failure(Market::Shanghai, "600372");
        let result = mock.fetch_corporate_actions(Market::Shanghai, "600372").await;
        assert!(matches!(result, Err(RecordSourceError::NetworkError(_))));
        assert_eq!(mock.fetch_count(), 1);
    }
}
