//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The orchestrator and tests call store methods; nothing else executes
//! SQL directly.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::PipelineResult;
use crate::transaction::{AlertCandidate, Transaction};

pub struct PipelineStore {
    conn: Connection,
}

/// One persisted row of `transactions_all`.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub transaction_id: String,
    pub amount: f64,
    pub location: Option<String>,
    pub device: Option<String>,
    pub processed_at: String,
    pub is_flagged: bool,
    pub risk_score: Option<i64>,
    pub flagged_reason: Option<String>,
}

/// One persisted row of `fraud_alerts`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRow {
    pub alert_id: i64,
    pub transaction_id: String,
    pub amount: f64,
    pub risk_score: i64,
    pub flagged_reason: String,
    pub created_at: String,
}

impl PipelineStore {
    pub fn open(path: &str) -> PipelineResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PipelineResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Create tables and indexes if absent. Safe to call on every run
    /// start; a no-op when the schema already matches.
    pub fn ensure_schema(&self) -> PipelineResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_schema.sql"))?;
        Ok(())
    }

    /// Persist one batch: upsert the full working set into the ledger,
    /// then insert the alert candidates, inside one transaction. Ledger
    /// rows land first so an alert row never references an id the ledger
    /// has not seen. Returns the count of newly inserted alerts.
    pub fn persist_run(
        &mut self,
        working_set: &[Transaction],
        candidates: &[AlertCandidate],
        now: DateTime<Utc>,
    ) -> PipelineResult<usize> {
        let tx = self.conn.transaction()?;
        upsert_ledger(&tx, working_set, candidates, now)?;
        let inserted = insert_alerts(&tx, candidates, now)?;
        tx.commit()?;
        Ok(inserted)
    }

    /// Ledger upsert without the batch transaction wrapper. Each
    /// statement is individually atomic (insert-or-update in one
    /// statement), so concurrent runs racing on the same id cannot lose
    /// updates or hit duplicate-key failures.
    pub fn upsert_ledger(
        &self,
        working_set: &[Transaction],
        candidates: &[AlertCandidate],
        now: DateTime<Utc>,
    ) -> PipelineResult<()> {
        upsert_ledger(&self.conn, working_set, candidates, now)
    }

    /// Alert insert without the batch transaction wrapper. Conflicting
    /// ids are skipped; first detection wins and `created_at` is never
    /// touched again.
    pub fn insert_alerts(
        &self,
        candidates: &[AlertCandidate],
        now: DateTime<Utc>,
    ) -> PipelineResult<usize> {
        insert_alerts(&self.conn, candidates, now)
    }

    // ── Read-back helpers (runner summary and tests) ───────────────

    pub fn ledger_count(&self) -> PipelineResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM transactions_all", [], |row| row.get(0))
            .map_err(Into::into)
    }

    pub fn alert_count(&self) -> PipelineResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM fraud_alerts", [], |row| row.get(0))
            .map_err(Into::into)
    }

    pub fn ledger_row(&self, transaction_id: &str) -> PipelineResult<Option<LedgerRow>> {
        self.conn
            .query_row(
                "SELECT transaction_id, amount, location, device,
                        processed_at, is_flagged, risk_score, flagged_reason
                 FROM transactions_all WHERE transaction_id = ?1",
                params![transaction_id],
                |row| {
                    Ok(LedgerRow {
                        transaction_id: row.get(0)?,
                        amount: row.get(1)?,
                        location: row.get(2)?,
                        device: row.get(3)?,
                        processed_at: row.get(4)?,
                        is_flagged: row.get::<_, i32>(5)? != 0,
                        risk_score: row.get(6)?,
                        flagged_reason: row.get(7)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn alert_row(&self, transaction_id: &str) -> PipelineResult<Option<AlertRow>> {
        self.conn
            .query_row(
                "SELECT alert_id, transaction_id, amount, risk_score,
                        flagged_reason, created_at
                 FROM fraud_alerts WHERE transaction_id = ?1",
                params![transaction_id],
                |row| {
                    Ok(AlertRow {
                        alert_id: row.get(0)?,
                        transaction_id: row.get(1)?,
                        amount: row.get(2)?,
                        risk_score: row.get(3)?,
                        flagged_reason: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}

fn upsert_ledger(
    conn: &Connection,
    working_set: &[Transaction],
    candidates: &[AlertCandidate],
    now: DateTime<Utc>,
) -> PipelineResult<()> {
    if working_set.is_empty() {
        return Ok(());
    }
    let by_id: HashMap<&str, &AlertCandidate> = candidates
        .iter()
        .map(|c| (c.transaction_id.as_str(), c))
        .collect();
    let processed_at = now.to_rfc3339();

    let mut stmt = conn.prepare(
        "INSERT INTO transactions_all
            (transaction_id, amount, location, device,
             processed_at, is_flagged, risk_score, flagged_reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(transaction_id) DO UPDATE SET
            amount         = excluded.amount,
            location       = excluded.location,
            device         = excluded.device,
            processed_at   = excluded.processed_at,
            is_flagged     = excluded.is_flagged,
            risk_score     = excluded.risk_score,
            flagged_reason = excluded.flagged_reason",
    )?;
    for txn in working_set {
        let hit = by_id.get(txn.transaction_id.as_str());
        stmt.execute(params![
            txn.transaction_id,
            txn.amount,
            txn.location,
            txn.device,
            processed_at,
            if hit.is_some() { 1i32 } else { 0i32 },
            hit.map(|c| c.risk_score),
            hit.map(|c| c.flagged_reason.as_str()),
        ])?;
    }
    Ok(())
}

fn insert_alerts(
    conn: &Connection,
    candidates: &[AlertCandidate],
    now: DateTime<Utc>,
) -> PipelineResult<usize> {
    if candidates.is_empty() {
        return Ok(0);
    }
    let created_at = now.to_rfc3339();

    let mut stmt = conn.prepare(
        "INSERT INTO fraud_alerts
            (transaction_id, amount, risk_score, flagged_reason, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(transaction_id) DO NOTHING",
    )?;
    let mut inserted = 0usize;
    for candidate in candidates {
        inserted += stmt.execute(params![
            candidate.transaction_id,
            candidate.amount,
            candidate.risk_score,
            candidate.flagged_reason,
            created_at,
        ])?;
    }
    Ok(inserted)
}
