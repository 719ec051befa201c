//! Position operations for the repository.

use crate::domain::{AccountId, InstrumentCode, Position};
use sqlx::Row;
use tracing::warn;

use super::{decimal_from_db, decimal_to_db, Repository};

impl Repository {
    /// Load all positions held by one account, in stable code order.
    ///
    /// Rows with an unrecognized market code are skipped with a warning
    /// rather than failing the whole account.
    pub async fn list_positions(&self, account_id: &AccountId) -> Result<Vec<Position>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT account_id, code, market, volume, available, avg_price, name
            FROM positions
            WHERE account_id = ?
            ORDER BY code
            "#,
        )
        .bind(account_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(row_to_position).collect())
    }

    /// Insert or replace one position, keyed by (account, code).
    pub async fn upsert_position(&self, position: &Position) -> Result<(), sqlx::Error> {
        upsert_position_exec(&self.pool, position).await
    }
}

/// Position upsert against any executor, so the per-account adjustment
/// transaction can reuse it.
pub(crate) async fn upsert_position_exec<'e, E>(
    executor: E,
    position: &Position,
) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO positions (account_id, code, market, volume, available, avg_price, name)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(account_id, code) DO UPDATE SET
            market = excluded.market,
            volume = excluded.volume,
            available = excluded.available,
            avg_price = excluded.avg_price,
            name = excluded.name
        "#,
    )
    .bind(position.account_id.as_str())
    .bind(position.code.as_str())
    .bind(position.market.as_str())
    .bind(position.volume)
    .bind(position.available)
    .bind(decimal_to_db(position.avg_price))
    .bind(position.name.as_deref())
    .execute(executor)
    .await?;

    Ok(())
}

fn row_to_position(row: &sqlx::sqlite::SqliteRow) -> Option<Position> {
    let market_raw: String = row.get("market");
    let market = match market_raw.parse() {
        Ok(market) => market,
        Err(_) => {
            warn!(
                "Skipping position row with unknown market code: {:?}",
                market_raw
            );
            return None;
        }
    };

    Some(Position {
        account_id: AccountId::new(row.get::<String, _>("account_id")),
        code: InstrumentCode::new(row.get::<String, _>("code")),
        market,
        volume: row.get::<i64, _>("volume"),
        available: row.get::<i64, _>("available"),
        avg_price: decimal_from_db(&row.get::<String, _>("avg_price"), "avg_price"),
        name: row.get::<Option<String>, _>("name"),
    })
}
