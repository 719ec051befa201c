use anyhow::Context;
use corpact::datasource::{SessionCache, TdxRecordSource};
use corpact::orchestration::BatchReconciler;
use corpact::{config::Config, db::init_ledger_db, RecordSource, Repository, TradeDate};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("loading configuration")?;

    // The scheduler fires after market close; settle yesterday's actions
    // unless an explicit backfill date was given.
    let as_of = config.as_of_override.unwrap_or_else(TradeDate::yesterday);

    let pool = init_ledger_db(&config.database_path)
        .await
        .context("initializing ledger database")?;
    let repo = Arc::new(Repository::new(pool));

    let gateway: Arc<dyn RecordSource> =
        Arc::new(TdxRecordSource::new(config.market_data_api_url.clone()));
    let source: Arc<dyn RecordSource> =
        Arc::new(SessionCache::new(gateway, config.lookup_concurrency));

    let reconciler = BatchReconciler::new(
        repo,
        source,
        config.account_concurrency,
        Duration::from_secs(config.persist_retry_secs),
    );

    let report = reconciler
        .run(as_of)
        .await
        .context("running reconciliation")?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}
