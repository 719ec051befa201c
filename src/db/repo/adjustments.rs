//! Idempotency markers and the per-account adjustment transaction.

use crate::domain::{Account, AccountId, AdjustmentMarker, InstrumentCode, Position, TradeDate};
use chrono::Utc;
use sqlx::Row;
use tracing::warn;

use super::accounts::set_account_balances_exec;
use super::positions::upsert_position_exec;
use super::Repository;

impl Repository {
    /// True when the adjustment identified by `event_key` was already
    /// applied in a previous run.
    pub async fn adjustment_applied(&self, event_key: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM applied_adjustments WHERE event_key = ?")
            .bind(event_key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// List the adjustment markers recorded for one account.
    pub async fn list_applied_adjustments(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<AdjustmentMarker>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT event_key, account_id, code, market, effective_date
            FROM applied_adjustments
            WHERE account_id = ?
            ORDER BY effective_date, code
            "#,
        )
        .bind(account_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(row_to_marker).collect())
    }

    /// Persist one account's adjustment as a single transaction: the updated
    /// positions, the account balances, and the idempotency markers.
    ///
    /// A reader never observes adjusted positions beside a stale cash
    /// balance. Marker inserts are conflict-free no-ops when a concurrent
    /// run already recorded them.
    pub async fn persist_adjustment(
        &self,
        account: &Account,
        positions: &[Position],
        markers: &[AdjustmentMarker],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for position in positions {
            upsert_position_exec(&mut *tx, position).await?;
        }

        set_account_balances_exec(&mut *tx, account).await?;

        let applied_at_ms = Utc::now().timestamp_millis();
        for marker in markers {
            sqlx::query(
                r#"
                INSERT INTO applied_adjustments
                    (event_key, account_id, code, market, effective_date, applied_at_ms)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(event_key) DO NOTHING
                "#,
            )
            .bind(marker.event_key.as_str())
            .bind(marker.account_id.as_str())
            .bind(marker.code.as_str())
            .bind(marker.market.as_str())
            .bind(marker.effective_date.compact())
            .bind(applied_at_ms)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }
}

fn row_to_marker(row: &sqlx::sqlite::SqliteRow) -> Option<AdjustmentMarker> {
    let market_raw: String = row.get("market");
    let date_raw: String = row.get("effective_date");

    let market = match market_raw.parse() {
        Ok(market) => market,
        Err(_) => {
            warn!("Skipping marker row with unknown market code: {:?}", market_raw);
            return None;
        }
    };
    let effective_date = match TradeDate::parse_compact(&date_raw) {
        Ok(date) => date,
        Err(_) => {
            warn!("Skipping marker row with invalid date: {:?}", date_raw);
            return None;
        }
    };

    Some(AdjustmentMarker {
        event_key: row.get::<String, _>("event_key"),
        account_id: AccountId::new(row.get::<String, _>("account_id")),
        code: InstrumentCode::new(row.get::<String, _>("code")),
        market,
        effective_date,
    })
}
