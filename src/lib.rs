pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod orchestration;

pub use config::Config;
pub use datasource::{
    MockRecordSource, RecordSource, RecordSourceError, SessionCache, TdxRecordSource,
};
pub use db::{init_ledger_db, Repository};
pub use domain::{
    Account, AccountId, ActionCategory, AdjustmentMarker, AdjustmentSignal, CorporateActionRecord,
    InstrumentCode, Market, Position, SignalKind, TradeDate,
};
pub use engine::{adjust, Adjustment, Detection, EventDetector};
pub use orchestration::{BatchReconciler, RunReport};
