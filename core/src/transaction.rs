//! The records that flow through one batch run.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCATION: &str = "USA";
pub const DEFAULT_DEVICE: &str = "Web";

/// One ingested transaction. Lives only for the duration of a run, then
/// is folded into the ledger (and possibly alert) tables.
/// `transaction_id` is externally assigned and may repeat across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub amount: f64,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_device")]
    pub device: String,
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

fn default_device() -> String {
    DEFAULT_DEVICE.to_string()
}

/// A flagged transaction as produced by the classifier, before it
/// becomes a `fraud_alerts` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCandidate {
    pub transaction_id: String,
    pub amount: f64,
    pub risk_score: i64,
    pub flagged_reason: String,
}
