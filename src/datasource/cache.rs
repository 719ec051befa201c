//! Per-run memoization and lookup throttling over a record source.

use super::{RecordSource, RecordSourceError};
use crate::domain::{CorporateActionRecord, Market};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tracing::debug;

/// Caching decorator for a [`RecordSource`], scoped to one batch run.
///
/// The same instrument recurs across many accounts' positions, so successful
/// lookups are memoized by (market, code) for the lifetime of the cache.
/// Failed lookups are not cached: a later retry within the run may succeed.
/// Upstream concurrency is bounded by a semaphore so a large ledger cannot
/// stampede the provider.
#[derive(Debug)]
pub struct SessionCache {
    inner: Arc<dyn RecordSource>,
    entries: Mutex<HashMap<(Market, String), Arc<Vec<CorporateActionRecord>>>>,
    limiter: Semaphore,
}

impl SessionCache {
    /// Wrap a record source, allowing at most `max_concurrent_lookups`
    /// simultaneous upstream fetches.
    pub fn new(inner: Arc<dyn RecordSource>, max_concurrent_lookups: usize) -> Self {
        SessionCache {
            inner,
            entries: Mutex::new(HashMap::new()),
            limiter: Semaphore::new(max_concurrent_lookups.max(1)),
        }
    }
}

#[async_trait]
impl RecordSource for SessionCache {
    async fn fetch_corporate_actions(
        &self,
        market: Market,
        code: &str,
    ) -> Result<Vec<CorporateActionRecord>, RecordSourceError> {
        let key = (market, code.to_string());

        if let Some(cached) = self.entries.lock().await.get(&key) {
            return Ok(cached.as_ref().clone());
        }

        let permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| RecordSourceError::Other(e.to_string()))?;

        // Another task may have completed the same lookup while this one
        // waited for a permit.
        if let Some(cached) = self.entries.lock().await.get(&key) {
            return Ok(cached.as_ref().clone());
        }

        let result = self.inner.fetch_corporate_actions(market, code).await;
        drop(permit);

        match result {
            Ok(records) => {
                debug!(
                    "Cached {} corporate-action record(s) for {}.{}",
                    records.len(),
                    code,
                    market
                );
                self.entries
                    .lock()
                    .await
                    .insert(key, Arc::new(records.clone()));
                Ok(records)
            }
            Err(e) => Err(e),
        }
    }
}
