//! Batch orchestration over the ledger store.

pub mod reconciler;

pub use reconciler::{AccountFailure, BatchReconciler, ReconcileError, RunReport};
