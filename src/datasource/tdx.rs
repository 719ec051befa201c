//! HTTP client for the market-data gateway's corporate-action endpoint.

use super::{RecordSource, RecordSourceError};
use crate::domain::{ActionCategory, CorporateActionRecord, InstrumentCode, Market};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Record source backed by the TDX quote gateway's JSON API.
#[derive(Debug, Clone)]
pub struct TdxRecordSource {
    client: Client,
    base_url: String,
}

impl TdxRecordSource {
    /// Create a new record source against the given gateway base URL.
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn post_query(
        &self,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, RecordSourceError> {
        let url = format!("{}/query", self.base_url);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .post(&url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(RecordSourceError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(RecordSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(RecordSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(RecordSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response.json::<serde_json::Value>().await.map_err(|e| {
                backoff::Error::permanent(RecordSourceError::ParseError(e.to_string()))
            })
        })
        .await
    }
}

#[async_trait]
impl RecordSource for TdxRecordSource {
    async fn fetch_corporate_actions(
        &self,
        market: Market,
        code: &str,
    ) -> Result<Vec<CorporateActionRecord>, RecordSourceError> {
        debug!("Fetching corporate actions for market={}, code={}", market, code);

        let payload = serde_json::json!({
            "type": "xdxrInfo",
            "market": market.wire_code(),
            "code": code,
        });

        let response = self.post_query(payload).await?;

        let records_json = response
            .as_array()
            .ok_or_else(|| RecordSourceError::ParseError("Expected array response".to_string()))?;

        let mut records = Vec::new();
        for record_json in records_json {
            match parse_record(record_json, market, code) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Failed to parse corporate-action record: {}", e);
                }
            }
        }

        Ok(records)
    }
}

fn parse_record(
    record_json: &serde_json::Value,
    market: Market,
    code: &str,
) -> Result<CorporateActionRecord, RecordSourceError> {
    let year = record_json
        .get("year")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| RecordSourceError::ParseError("Missing year field".to_string()))?;

    let month = record_json
        .get("month")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| RecordSourceError::ParseError("Missing month field".to_string()))?;

    let day = record_json
        .get("day")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| RecordSourceError::ParseError("Missing day field".to_string()))?;

    let category = record_json
        .get("category")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| RecordSourceError::ParseError("Missing category field".to_string()))?;

    // Ratio fields are absent or null on records where they do not apply.
    let stock_ratio = ratio_field(record_json, "songzhuangu")?;
    let cash_ratio = ratio_field(record_json, "fenhong")?;
    let rights_ratio = ratio_field(record_json, "peigu")?;
    let rights_price = ratio_field(record_json, "peigujia")?;

    Ok(CorporateActionRecord {
        code: InstrumentCode::new(code),
        market,
        year: year as i32,
        month: month as u32,
        day: day as u32,
        category: ActionCategory::from(category),
        stock_ratio,
        cash_ratio,
        rights_ratio,
        rights_price,
    })
}

/// Read an optional numeric ratio field, defaulting to zero when absent.
///
/// JSON numbers are re-parsed from their literal text so fractional ratios
/// survive without a float round-trip.
fn ratio_field(record_json: &serde_json::Value, key: &str) -> Result<Decimal, RecordSourceError> {
    match record_json.get(key) {
        None => Ok(Decimal::ZERO),
        Some(serde_json::Value::Null) => Ok(Decimal::ZERO),
        Some(value @ serde_json::Value::Number(_)) => Decimal::from_str(&value.to_string())
            .map_err(|e| RecordSourceError::ParseError(format!("Invalid {}: {}", key, e))),
        Some(serde_json::Value::String(s)) => Decimal::from_str(s)
            .map_err(|e| RecordSourceError::ParseError(format!("Invalid {}: {}", key, e))),
        Some(_) => Err(RecordSourceError::ParseError(format!(
            "Invalid {}: expected number",
            key
        ))),
    }
}
