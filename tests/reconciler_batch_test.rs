use corpact::datasource::{MockRecordSource, SessionCache};
use corpact::db::init_ledger_db;
use corpact::domain::{
    Account, AccountId, ActionCategory, CorporateActionRecord, InstrumentCode, Market, Position,
    TradeDate,
};
use corpact::engine::EventDetector;
use corpact::orchestration::BatchReconciler;
use corpact::Repository;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn setup_repo() -> (Arc<Repository>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("ledger.db")
        .to_string_lossy()
        .to_string();
    let pool = init_ledger_db(&db_path).await.expect("init failed");
    (Arc::new(Repository::new(pool)), temp_dir)
}

fn make_account(account_id: &str) -> Account {
    Account {
        account_id: AccountId::new(account_id),
        assets: Decimal::from_str("1003235.6").unwrap(),
        available: Decimal::from_str("779653.6").unwrap(),
        market_value: Decimal::from_str("223582.0").unwrap(),
        capital: Decimal::from_str("1000000").unwrap(),
        cost_rate: Decimal::from_str("0.0003").unwrap(),
        tax_rate: Decimal::from_str("0.001").unwrap(),
        slip_point: Decimal::from_str("0.03").unwrap(),
    }
}

fn make_position(account_id: &str, code: &str, volume: i64, avg_price: &str) -> Position {
    Position {
        account_id: AccountId::new(account_id),
        code: InstrumentCode::new(code),
        market: Market::Shanghai,
        volume,
        available: volume,
        avg_price: Decimal::from_str(avg_price).unwrap(),
        name: None,
    }
}

fn make_record(code: &str, day: u32, stock: &str, cash: &str) -> CorporateActionRecord {
    CorporateActionRecord {
        code: InstrumentCode::new(code),
        market: Market::Shanghai,
        year: 2020,
        month: 8,
        day,
        category: ActionCategory::ExRightsExDividend,
        stock_ratio: Decimal::from_str(stock).unwrap(),
        cash_ratio: Decimal::from_str(cash).unwrap(),
        rights_ratio: Decimal::ZERO,
        rights_price: Decimal::ZERO,
    }
}

fn make_reconciler(repo: Arc<Repository>, source: MockRecordSource) -> BatchReconciler {
    let cached = Arc::new(SessionCache::new(Arc::new(source), 4));
    BatchReconciler::new(repo, cached, 4, Duration::from_millis(100))
}

fn as_of() -> TradeDate {
    TradeDate::parse_compact("20200817").unwrap()
}

#[tokio::test]
async fn test_stock_dividend_end_to_end() {
    let (repo, _temp) = setup_repo().await;
    repo.upsert_account(&make_account("acct-1")).await.unwrap();
    repo.upsert_position(&make_position("acct-1", "600372", 1000, "20.37"))
        .await
        .unwrap();

    let source = MockRecordSource::new().with_record(make_record("600372", 17, "3", "0"));
    let report = make_reconciler(repo.clone(), source)
        .run(as_of())
        .await
        .unwrap();

    assert_eq!(report.accounts_processed, 1);
    assert_eq!(report.accounts_adjusted, 1);
    assert_eq!(report.adjustments_applied, 1);
    assert_eq!(report.signals_emitted, 1);
    assert!(!report.has_failures());

    let positions = repo
        .list_positions(&AccountId::new("acct-1"))
        .await
        .unwrap();
    assert_eq!(positions[0].volume, 1300);
    assert_eq!(positions[0].available, 1300);
    assert_eq!(
        positions[0].avg_price.round_dp(6),
        Decimal::from_str("15.669231").unwrap()
    );
}

#[tokio::test]
async fn test_cash_dividend_end_to_end() {
    let (repo, _temp) = setup_repo().await;
    repo.upsert_account(&make_account("acct-1")).await.unwrap();
    repo.upsert_position(&make_position("acct-1", "600519", 100, "1690.0"))
        .await
        .unwrap();

    let source = MockRecordSource::new().with_record(make_record("600519", 17, "0", "6"));
    let report = make_reconciler(repo.clone(), source)
        .run(as_of())
        .await
        .unwrap();

    assert_eq!(report.accounts_adjusted, 1);

    let account = repo
        .get_account(&AccountId::new("acct-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.available, Decimal::from_str("779713.6").unwrap());
    assert_eq!(account.market_value, Decimal::from_str("223522.0").unwrap());
}

#[tokio::test]
async fn test_quiet_day_touches_nothing() {
    let (repo, _temp) = setup_repo().await;
    let account = make_account("acct-1");
    let position = make_position("acct-1", "600372", 1000, "20.37");
    repo.upsert_account(&account).await.unwrap();
    repo.upsert_position(&position).await.unwrap();

    // Record effective on a different date.
    let source = MockRecordSource::new().with_record(make_record("600372", 18, "3", "0"));
    let report = make_reconciler(repo.clone(), source)
        .run(as_of())
        .await
        .unwrap();

    assert_eq!(report.accounts_processed, 1);
    assert_eq!(report.accounts_adjusted, 0);
    assert_eq!(report.adjustments_applied, 0);

    let loaded = repo
        .get_account(&AccountId::new("acct-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, account);
    let positions = repo
        .list_positions(&AccountId::new("acct-1"))
        .await
        .unwrap();
    assert_eq!(positions, vec![position]);
}

#[tokio::test]
async fn test_rights_only_record_left_for_manual_review() {
    let (repo, _temp) = setup_repo().await;
    let account = make_account("acct-1");
    let position = make_position("acct-1", "600372", 1000, "20.37");
    repo.upsert_account(&account).await.unwrap();
    repo.upsert_position(&position).await.unwrap();

    let mut record = make_record("600372", 17, "0", "0");
    record.rights_ratio = Decimal::from_str("3").unwrap();
    record.rights_price = Decimal::from_str("5.5").unwrap();
    let source = MockRecordSource::new().with_record(record.clone());

    // The detection mapping still exposes the record for audit.
    let detector = EventDetector::new(Arc::new(source.clone()), as_of());
    let detection = detector.detect(&[position.clone()]).await;
    assert_eq!(
        detection.records.get(&InstrumentCode::new("600372")),
        Some(&record)
    );

    let report = make_reconciler(repo.clone(), source)
        .run(as_of())
        .await
        .unwrap();

    assert_eq!(report.accounts_adjusted, 0);
    assert_eq!(report.adjustments_applied, 0);
    assert_eq!(report.adjustments_skipped_unsupported, 1);
    assert_eq!(report.signals_emitted, 0);

    let loaded = repo
        .get_account(&AccountId::new("acct-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, account);
    let positions = repo
        .list_positions(&AccountId::new("acct-1"))
        .await
        .unwrap();
    assert_eq!(positions, vec![position]);
}

#[tokio::test]
async fn test_combined_ratios_fold_through_one_account() {
    let (repo, _temp) = setup_repo().await;
    repo.upsert_account(&make_account("acct-1")).await.unwrap();
    repo.upsert_position(&make_position("acct-1", "600030", 1000, "31.96"))
        .await
        .unwrap();
    repo.upsert_position(&make_position("acct-1", "600519", 100, "1690.0"))
        .await
        .unwrap();

    let source = MockRecordSource::new()
        .with_record(make_record("600030", 17, "3", "0"))
        .with_record(make_record("600519", 17, "0", "6"));
    let report = make_reconciler(repo.clone(), source)
        .run(as_of())
        .await
        .unwrap();

    assert_eq!(report.accounts_adjusted, 1);
    assert_eq!(report.adjustments_applied, 2);
    assert_eq!(report.signals_emitted, 2);

    let account = repo
        .get_account(&AccountId::new("acct-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.available, Decimal::from_str("779713.6").unwrap());

    let positions = repo
        .list_positions(&AccountId::new("acct-1"))
        .await
        .unwrap();
    assert_eq!(positions[0].volume, 1300);
    assert_eq!(positions[1].volume, 100);
}

#[tokio::test]
async fn test_failed_lookup_does_not_fail_other_accounts() {
    let (repo, _temp) = setup_repo().await;
    repo.upsert_account(&make_account("acct-a")).await.unwrap();
    repo.upsert_position(&make_position("acct-a", "600519", 100, "1690.0"))
        .await
        .unwrap();
    repo.upsert_account(&make_account("acct-b")).await.unwrap();
    repo.upsert_position(&make_position("acct-b", "600372", 1000, "20.37"))
        .await
        .unwrap();

    let source = MockRecordSource::new()
        .with_record(make_record("600372", 17, "3", "0"))
        .with_failure(Market::Shanghai, "600519");
    let report = make_reconciler(repo.clone(), source)
        .run(as_of())
        .await
        .unwrap();

    assert_eq!(report.accounts_processed, 2);
    assert_eq!(report.accounts_adjusted, 1);
    assert_eq!(report.failed_lookups, 1);
    assert!(!report.has_failures());

    let positions = repo
        .list_positions(&AccountId::new("acct-b"))
        .await
        .unwrap();
    assert_eq!(positions[0].volume, 1300);
}

#[tokio::test]
async fn test_shared_instrument_fetched_once_across_accounts() {
    let (repo, _temp) = setup_repo().await;
    for account_id in ["acct-a", "acct-b", "acct-c"] {
        repo.upsert_account(&make_account(account_id)).await.unwrap();
        repo.upsert_position(&make_position(account_id, "600372", 1000, "20.37"))
            .await
            .unwrap();
    }

    let source = MockRecordSource::new().with_record(make_record("600372", 17, "3", "0"));
    let counter = source.clone();
    let cached = Arc::new(SessionCache::new(Arc::new(source), 4));
    // Serialize accounts so every lookup after the first hits the cache.
    let reconciler = BatchReconciler::new(repo.clone(), cached, 1, Duration::from_millis(100));

    let report = reconciler.run(as_of()).await.unwrap();

    assert_eq!(report.accounts_adjusted, 3);
    assert_eq!(counter.fetch_count(), 1);
}
