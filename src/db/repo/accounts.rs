//! Account operations for the repository.

use crate::domain::{Account, AccountId};
use sqlx::Row;

use super::{decimal_from_db, decimal_to_db, Repository};

impl Repository {
    /// List every account id in the store, in stable order.
    pub async fn list_account_ids(&self) -> Result<Vec<AccountId>, sqlx::Error> {
        let rows = sqlx::query("SELECT account_id FROM accounts ORDER BY account_id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| AccountId::new(row.get::<String, _>("account_id")))
            .collect())
    }

    /// Load one account, or `None` when it does not exist.
    pub async fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT account_id, assets, available, market_value, capital,
                   cost_rate, tax_rate, slip_point
            FROM accounts
            WHERE account_id = ?
            "#,
        )
        .bind(account_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row_to_account(&row)))
    }

    /// Insert or fully replace an account record.
    pub async fn upsert_account(&self, account: &Account) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO accounts (account_id, assets, available, market_value, capital,
                                  cost_rate, tax_rate, slip_point)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(account_id) DO UPDATE SET
                assets = excluded.assets,
                available = excluded.available,
                market_value = excluded.market_value,
                capital = excluded.capital,
                cost_rate = excluded.cost_rate,
                tax_rate = excluded.tax_rate,
                slip_point = excluded.slip_point
            "#,
        )
        .bind(account.account_id.as_str())
        .bind(decimal_to_db(account.assets))
        .bind(decimal_to_db(account.available))
        .bind(decimal_to_db(account.market_value))
        .bind(decimal_to_db(account.capital))
        .bind(decimal_to_db(account.cost_rate))
        .bind(decimal_to_db(account.tax_rate))
        .bind(decimal_to_db(account.slip_point))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Write only the balance fields an adjustment can move.
    pub async fn set_account_balances(&self, account: &Account) -> Result<(), sqlx::Error> {
        set_account_balances_exec(&self.pool, account).await
    }
}

/// Balance update against any executor, so the per-account adjustment
/// transaction can reuse it.
pub(crate) async fn set_account_balances_exec<'e, E>(
    executor: E,
    account: &Account,
) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE accounts
        SET assets = ?, available = ?, market_value = ?
        WHERE account_id = ?
        "#,
    )
    .bind(decimal_to_db(account.assets))
    .bind(decimal_to_db(account.available))
    .bind(decimal_to_db(account.market_value))
    .bind(account.account_id.as_str())
    .execute(executor)
    .await?;

    Ok(())
}

fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Account {
    Account {
        account_id: AccountId::new(row.get::<String, _>("account_id")),
        assets: decimal_from_db(&row.get::<String, _>("assets"), "assets"),
        available: decimal_from_db(&row.get::<String, _>("available"), "available"),
        market_value: decimal_from_db(&row.get::<String, _>("market_value"), "market_value"),
        capital: decimal_from_db(&row.get::<String, _>("capital"), "capital"),
        cost_rate: decimal_from_db(&row.get::<String, _>("cost_rate"), "cost_rate"),
        tax_rate: decimal_from_db(&row.get::<String, _>("tax_rate"), "tax_rate"),
        slip_point: decimal_from_db(&row.get::<String, _>("slip_point"), "slip_point"),
    }
}
