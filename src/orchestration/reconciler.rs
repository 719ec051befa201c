//! Daily batch reconciliation of corporate actions across all accounts.

use crate::datasource::RecordSource;
use crate::db::Repository;
use crate::domain::{Account, AccountId, AdjustmentMarker, Position, TradeDate};
use crate::engine::{adjust, EventDetector};
use backoff::ExponentialBackoff;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Per-account failure surfaced in the run report.
#[derive(Debug, Clone, Serialize)]
pub struct AccountFailure {
    pub account_id: AccountId,
    pub error: String,
}

/// Completion report for one batch run.
///
/// The counters separate "nothing to do" from "could not do it": a day with
/// zero adjustments and zero failed lookups is quiet; zero adjustments with
/// many failed lookups is a data outage.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub as_of: TradeDate,
    pub accounts_processed: usize,
    pub accounts_adjusted: usize,
    pub accounts_failed: Vec<AccountFailure>,
    pub adjustments_applied: usize,
    /// Skipped because an identical adjustment was applied by an earlier run.
    pub adjustments_skipped_applied: usize,
    /// Skipped because the record carries no computable ratios
    /// (rights issues and empty records).
    pub adjustments_skipped_unsupported: usize,
    pub signals_emitted: usize,
    pub failed_lookups: usize,
    pub malformed_records: usize,
}

impl RunReport {
    fn new(as_of: TradeDate) -> Self {
        RunReport {
            run_id: Uuid::new_v4(),
            as_of,
            accounts_processed: 0,
            accounts_adjusted: 0,
            accounts_failed: Vec::new(),
            adjustments_applied: 0,
            adjustments_skipped_applied: 0,
            adjustments_skipped_unsupported: 0,
            signals_emitted: 0,
            failed_lookups: 0,
            malformed_records: 0,
        }
    }

    /// True when at least one account could not be processed.
    pub fn has_failures(&self) -> bool {
        !self.accounts_failed.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("account {0} listed but not found")]
    AccountMissing(AccountId),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Default)]
struct AccountOutcome {
    adjusted: bool,
    applied: usize,
    skipped_applied: usize,
    skipped_unsupported: usize,
    signals: usize,
    failed_lookups: usize,
    malformed_records: usize,
}

/// Orchestrates one reconciliation pass: detection, calculation, and
/// persistence for every account in the store.
pub struct BatchReconciler {
    repo: Arc<Repository>,
    source: Arc<dyn RecordSource>,
    account_concurrency: usize,
    persist_retry_max: Duration,
}

impl BatchReconciler {
    pub fn new(
        repo: Arc<Repository>,
        source: Arc<dyn RecordSource>,
        account_concurrency: usize,
        persist_retry_max: Duration,
    ) -> Self {
        Self {
            repo,
            source,
            account_concurrency,
            persist_retry_max,
        }
    }

    /// Run one pass for `as_of`.
    ///
    /// Accounts are processed with bounded concurrency; within one account
    /// detection, calculation, and persistence stay sequential so a single
    /// account document never has two writers. A failing account lands in
    /// the report and never aborts the rest of the batch. Only a failure to
    /// list accounts at all is returned as an error.
    pub async fn run(&self, as_of: TradeDate) -> Result<RunReport, sqlx::Error> {
        let mut report = RunReport::new(as_of);
        let account_ids = self.repo.list_account_ids().await?;

        info!(
            "Reconciliation run {} for {} over {} account(s)",
            report.run_id,
            as_of,
            account_ids.len()
        );

        let detector = EventDetector::new(self.source.clone(), as_of);
        let detector = &detector;

        let results: Vec<(AccountId, Result<AccountOutcome, ReconcileError>)> =
            stream::iter(account_ids)
                .map(|account_id| async move {
                    let outcome = self.process_account(detector, &account_id, as_of).await;
                    (account_id, outcome)
                })
                .buffer_unordered(self.account_concurrency.max(1))
                .collect()
                .await;

        for (account_id, result) in results {
            report.accounts_processed += 1;
            match result {
                Ok(outcome) => {
                    if outcome.adjusted {
                        report.accounts_adjusted += 1;
                    }
                    report.adjustments_applied += outcome.applied;
                    report.adjustments_skipped_applied += outcome.skipped_applied;
                    report.adjustments_skipped_unsupported += outcome.skipped_unsupported;
                    report.signals_emitted += outcome.signals;
                    report.failed_lookups += outcome.failed_lookups;
                    report.malformed_records += outcome.malformed_records;
                }
                Err(e) => {
                    warn!("Account {} failed: {}", account_id, e);
                    report.accounts_failed.push(AccountFailure {
                        account_id,
                        error: e.to_string(),
                    });
                }
            }
        }
        report
            .accounts_failed
            .sort_by(|a, b| a.account_id.cmp(&b.account_id));

        info!(
            "Run {} complete: {} account(s) adjusted, {} failed, {} lookup(s) unavailable",
            report.run_id,
            report.accounts_adjusted,
            report.accounts_failed.len(),
            report.failed_lookups
        );
        Ok(report)
    }

    async fn process_account(
        &self,
        detector: &EventDetector,
        account_id: &AccountId,
        as_of: TradeDate,
    ) -> Result<AccountOutcome, ReconcileError> {
        let mut outcome = AccountOutcome::default();

        let positions = self.repo.list_positions(account_id).await?;
        let detection = detector.detect(&positions).await;
        outcome.failed_lookups = detection.failed_lookups;
        outcome.malformed_records = detection.malformed_records;

        if detection.is_empty() {
            return Ok(outcome);
        }

        let account = self
            .repo
            .get_account(account_id)
            .await?
            .ok_or_else(|| ReconcileError::AccountMissing(account_id.clone()))?;

        let mut current_account = account;
        let mut updated_positions: Vec<Position> = Vec::new();
        let mut markers: Vec<AdjustmentMarker> = Vec::new();

        for position in &positions {
            let Some(record) = detection.records.get(&position.code) else {
                continue;
            };

            if !record.has_computable_adjustment() {
                info!(
                    "No computable ratios on {}.{} for {}; left for manual review",
                    position.code, position.market, as_of
                );
                outcome.skipped_unsupported += 1;
                continue;
            }

            let marker = AdjustmentMarker::new(
                account_id.clone(),
                position.code.clone(),
                position.market,
                as_of,
            );
            if self.repo.adjustment_applied(&marker.event_key).await? {
                info!(
                    "Adjustment for {}.{} on {} already applied; skipping",
                    position.code, position.market, as_of
                );
                outcome.skipped_applied += 1;
                continue;
            }

            let adjustment = adjust(&current_account, position, record, as_of);
            for signal in &adjustment.signals {
                match serde_json::to_string(signal) {
                    Ok(json) => info!("Adjustment signal: {}", json),
                    Err(e) => warn!("Unserializable adjustment signal: {}", e),
                }
            }
            outcome.signals += adjustment.signals.len();
            outcome.applied += 1;

            current_account = adjustment.account;
            updated_positions.push(adjustment.position);
            markers.push(marker);
        }

        if updated_positions.is_empty() {
            return Ok(outcome);
        }

        self.persist_with_retry(&current_account, &updated_positions, &markers)
            .await?;
        outcome.adjusted = true;
        Ok(outcome)
    }

    /// Persist one account's adjustment, retrying transient store errors
    /// with exponential backoff bounded by `persist_retry_max`.
    async fn persist_with_retry(
        &self,
        account: &Account,
        positions: &[Position],
        markers: &[AdjustmentMarker],
    ) -> Result<(), ReconcileError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.persist_retry_max),
            ..Default::default()
        };

        backoff::future::retry(backoff, || async {
            self.repo
                .persist_adjustment(account, positions, markers)
                .await
                .map_err(|e| {
                    warn!("Persisting adjustment for {} failed: {}", account.account_id, e);
                    backoff::Error::transient(e)
                })
        })
        .await
        .map_err(ReconcileError::Db)
    }
}
