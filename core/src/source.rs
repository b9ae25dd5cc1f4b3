//! Secondary transaction source and working-set assembly.
//!
//! A readable file wins; the synthetic generator runs only when
//! explicitly enabled; an empty batch is the final fallback.

use std::path::Path;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::transaction::{Transaction, DEFAULT_DEVICE, DEFAULT_LOCATION};

/// Load the secondary batch for one run.
pub fn load_secondary(cfg: &PipelineConfig) -> PipelineResult<Vec<Transaction>> {
    if Path::new(&cfg.csv_path).exists() {
        log::info!("Loading secondary transactions from {}", cfg.csv_path);
        return load_csv(&cfg.csv_path);
    }
    if cfg.synthetic_fallback {
        log::warn!(
            "No file at {}; generating {} synthetic demo transactions",
            cfg.csv_path,
            cfg.synthetic_count
        );
        return Ok(synthetic_batch(cfg.synthetic_count, cfg.synthetic_base_id));
    }
    Ok(Vec::new())
}

/// Parse a simple comma-separated file: header row, no quoting.
///
/// `transaction_id` and `amount` columns are required; a file missing
/// either is a fatal source error. `location` and `device` are optional
/// and default when the column or cell is absent. An unparsable amount
/// is fatal.
pub fn load_csv(path: &str) -> PipelineResult<Vec<Transaction>> {
    let content = std::fs::read_to_string(path)?;
    let mut lines = content.lines();
    let header = lines.next().ok_or_else(|| PipelineError::BadSource {
        path: path.to_string(),
        detail: "file is empty".to_string(),
    })?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let position = |name: &str| columns.iter().position(|c| *c == name);
    let id_col = position("transaction_id").ok_or_else(|| PipelineError::MissingColumn {
        path: path.to_string(),
        column: "transaction_id",
    })?;
    let amount_col = position("amount").ok_or_else(|| PipelineError::MissingColumn {
        path: path.to_string(),
        column: "amount",
    })?;
    let location_col = position("location");
    let device_col = position("device");

    let mut txns = Vec::new();
    for (lineno, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let cell = |idx: usize| fields.get(idx).copied().unwrap_or("");

        let transaction_id = cell(id_col);
        if transaction_id.is_empty() {
            return Err(PipelineError::BadSource {
                path: path.to_string(),
                detail: format!("line {}: empty transaction_id", lineno + 2),
            });
        }
        let raw_amount = cell(amount_col);
        let amount: f64 = raw_amount.parse().map_err(|_| PipelineError::BadSource {
            path: path.to_string(),
            detail: format!("line {}: unparsable amount '{raw_amount}'", lineno + 2),
        })?;

        let optional = |col: Option<usize>, default: &str| {
            col.map(|i| cell(i))
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        txns.push(Transaction {
            transaction_id: transaction_id.to_string(),
            amount,
            location: optional(location_col, DEFAULT_LOCATION),
            device: optional(device_col, DEFAULT_DEVICE),
        });
    }
    Ok(txns)
}

/// Deterministic demo batch, shaped like the historical sample data:
/// amounts 25*i with a 25000 spike every 7th record, location and device
/// alternating, ids TXN{base_id + i}.
pub fn synthetic_batch(count: usize, base_id: u64) -> Vec<Transaction> {
    (1..=count as u64)
        .map(|i| Transaction {
            transaction_id: format!("TXN{}", base_id + i),
            amount: if i % 7 == 0 { 25_000.0 } else { 25.0 * i as f64 },
            location: if i % 3 == 0 { "CAN" } else { DEFAULT_LOCATION }.to_string(),
            device: if i % 2 == 0 { "Mobile" } else { DEFAULT_DEVICE }.to_string(),
        })
        .collect()
}

/// Assemble the working set: queue items first, then the secondary
/// batch. Order preserved, no deduplication; repeated ids are processed
/// independently and the last upsert wins in the ledger.
pub fn merge(queue_txns: Vec<Transaction>, secondary: Vec<Transaction>) -> Vec<Transaction> {
    let mut working_set = queue_txns;
    working_set.extend(secondary);
    working_set
}
