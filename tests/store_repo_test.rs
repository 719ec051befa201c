use corpact::db::init_ledger_db;
use corpact::domain::{
    Account, AccountId, AdjustmentMarker, InstrumentCode, Market, Position, TradeDate,
};
use corpact::Repository;
use rust_decimal::Decimal;
use std::str::FromStr;
use tempfile::TempDir;

async fn setup_repo() -> (Repository, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("ledger.db")
        .to_string_lossy()
        .to_string();
    let pool = init_ledger_db(&db_path).await.expect("init failed");
    (Repository::new(pool), temp_dir)
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
        name: Some("test instrument".to_string()),
    }
}

#[tokio::test]
async fn test_account_round_trip() {
    let (repo, _temp) = setup_repo().await;
    let account = make_account("acct-1");

    repo.upsert_account(&account).await.unwrap();
    let loaded = repo
        .get_account(&AccountId::new("acct-1"))
        .await
        .unwrap()
        .expect("account missing");

    assert_eq!(loaded, account);
    assert_eq!(
        repo.get_account(&AccountId::new("acct-2")).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_list_account_ids_sorted() {
    let (repo, _temp) = setup_repo().await;
    repo.upsert_account(&make_account("acct-b")).await.unwrap();
    repo.upsert_account(&make_account("acct-a")).await.unwrap();

    let ids = repo.list_account_ids().await.unwrap();
    assert_eq!(ids, vec![AccountId::new("acct-a"), AccountId::new("acct-b")]);
}

#[tokio::test]
async fn test_position_round_trip_and_upsert_replaces() {
    let (repo, _temp) = setup_repo().await;
    repo.upsert_account(&make_account("acct-1")).await.unwrap();

    let mut position = make_position("acct-1", "600030", 1000, "31.96");
    repo.upsert_position(&position).await.unwrap();

    position.volume = 1300;
    position.available = 1300;
    repo.upsert_position(&position).await.unwrap();

    let positions = repo
        .list_positions(&AccountId::new("acct-1"))
        .await
        .unwrap();
    assert_eq!(positions, vec![position]);
}

#[tokio::test]
async fn test_list_positions_ordered_by_code() {
    let (repo, _temp) = setup_repo().await;
    repo.upsert_account(&make_account("acct-1")).await.unwrap();
    repo.upsert_position(&make_position("acct-1", "600519", 100, "1690.0"))
        .await
        .unwrap();
    repo.upsert_position(&make_position("acct-1", "600030", 1000, "31.96"))
        .await
        .unwrap();

    let positions = repo
        .list_positions(&AccountId::new("acct-1"))
        .await
        .unwrap();
    let codes: Vec<&str> = positions.iter().map(|p| p.code.as_str()).collect();
    assert_eq!(codes, vec!["600030", "600519"]);
}

#[tokio::test]
async fn test_persist_adjustment_writes_everything_together() {
    let (repo, _temp) = setup_repo().await;
    let mut account = make_account("acct-1");
    repo.upsert_account(&account).await.unwrap();
    repo.upsert_position(&make_position("acct-1", "600372", 1000, "20.37"))
        .await
        .unwrap();

    account.available = Decimal::from_str("779713.6").unwrap();
    account.market_value = Decimal::from_str("223522.0").unwrap();
    let adjusted_position = make_position("acct-1", "600372", 1300, "15.67");
    let marker = AdjustmentMarker::new(
        AccountId::new("acct-1"),
        InstrumentCode::new("600372"),
        Market::Shanghai,
        TradeDate::parse_compact("20200817").unwrap(),
    );

    repo.persist_adjustment(&account, &[adjusted_position.clone()], &[marker.clone()])
        .await
        .unwrap();

    let loaded_account = repo
        .get_account(&AccountId::new("acct-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded_account.available, account.available);
    assert_eq!(loaded_account.market_value, account.market_value);

    let positions = repo
        .list_positions(&AccountId::new("acct-1"))
        .await
        .unwrap();
    assert_eq!(positions, vec![adjusted_position]);

    assert!(repo.adjustment_applied(&marker.event_key).await.unwrap());
    let markers = repo
        .list_applied_adjustments(&AccountId::new("acct-1"))
        .await
        .unwrap();
    assert_eq!(markers, vec![marker]);
}

#[tokio::test]
async fn test_marker_insert_is_conflict_free() {
    let (repo, _temp) = setup_repo().await;
    let account = make_account("acct-1");
    repo.upsert_account(&account).await.unwrap();

    let position = make_position("acct-1", "600372", 1300, "15.67");
    let marker = AdjustmentMarker::new(
        AccountId::new("acct-1"),
        InstrumentCode::new("600372"),
        Market::Shanghai,
        TradeDate::parse_compact("20200817").unwrap(),
    );

    repo.persist_adjustment(&account, &[position.clone()], &[marker.clone()])
        .await
        .unwrap();
    repo.persist_adjustment(&account, &[position], &[marker.clone()])
        .await
        .unwrap();

    let markers = repo
        .list_applied_adjustments(&AccountId::new("acct-1"))
        .await
        .unwrap();
    assert_eq!(markers.len(), 1);
}
