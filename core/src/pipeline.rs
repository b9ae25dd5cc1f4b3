//! The run orchestrator. One batch ETL run from queue to tables.
//!
//! STAGE ORDER (fixed, never reordered):
//!   1. connect        — open the store; nothing is written on failure
//!   2. ensure schema  — idempotent table/index creation
//!   3. collect        — drain queue, load secondary source, merge
//!   4. classify       — static high-amount rule over the working set
//!   5. persist        — ledger upsert then alert insert, one transaction
//!   6. report         — summary counts
//!
//! RULES:
//!   - No table is touched before collect completes; a bad source aborts
//!     with the store untouched.
//!   - Ledger rows are written before alert rows, so an alert id always
//!     has a ledger counterpart.
//!   - The connection is released on every exit path (drop).

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    classify,
    config::PipelineConfig,
    error::PipelineResult,
    queue::{self, TxnQueue},
    source,
    store::PipelineStore,
};

/// Final counts for one run, surfaced to the caller and the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub total_transactions: usize,
    pub total_flagged: usize,
    pub alerts_inserted: usize,
}

/// Execute one batch run end to end.
pub fn run(cfg: &PipelineConfig, queue: &mut dyn TxnQueue) -> PipelineResult<RunSummary> {
    let run_id = Uuid::new_v4().to_string();

    log::info!("run {run_id}: connecting to {}", cfg.db_path);
    let mut store = PipelineStore::open(&cfg.db_path)?;

    store.ensure_schema()?;
    log::info!("run {run_id}: schema ready");

    let drained = queue::drain(queue, cfg.drain_cap)?;
    log::info!("run {run_id}: drained {} queue transactions", drained.len());
    let secondary = source::load_secondary(cfg)?;
    let working_set = source::merge(drained, secondary);
    log::info!("run {run_id}: collected {} transactions", working_set.len());

    let candidates = classify::classify(&working_set)?;
    log::info!("run {run_id}: flagged {} transactions", candidates.len());

    let alerts_inserted = store.persist_run(&working_set, &candidates, Utc::now())?;

    let summary = RunSummary {
        run_id,
        total_transactions: working_set.len(),
        total_flagged: candidates.len(),
        alerts_inserted,
    };
    log::info!(
        "run {}: done. {} processed, {} flagged, {} new alerts",
        summary.run_id,
        summary.total_transactions,
        summary.total_flagged,
        summary.alerts_inserted
    );
    Ok(summary)
}
