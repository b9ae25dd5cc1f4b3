//! The fraud classifier. One static rule; pluggable rule-sets are a
//! later phase.

use crate::error::{PipelineError, PipelineResult};
use crate::transaction::{AlertCandidate, Transaction};

/// Inclusive flagging threshold, in the transaction's own currency unit.
pub const AMOUNT_THRESHOLD: f64 = 10_000.0;
pub const HIGH_AMOUNT_RISK_SCORE: i64 = 90;
pub const HIGH_AMOUNT_REASON: &str = "high_amount";

/// Flag every transaction with `amount >= AMOUNT_THRESHOLD`.
///
/// Pure and order-preserving. A non-finite amount fails the run; NaN
/// compares as unflagged and must not pass silently.
pub fn classify(working_set: &[Transaction]) -> PipelineResult<Vec<AlertCandidate>> {
    let mut candidates = Vec::new();
    for txn in working_set {
        if !txn.amount.is_finite() {
            return Err(PipelineError::NonFiniteAmount {
                transaction_id: txn.transaction_id.clone(),
            });
        }
        if txn.amount >= AMOUNT_THRESHOLD {
            candidates.push(AlertCandidate {
                transaction_id: txn.transaction_id.clone(),
                amount: txn.amount,
                risk_score: HIGH_AMOUNT_RISK_SCORE,
                flagged_reason: HIGH_AMOUNT_REASON.to_string(),
            });
        }
    }
    Ok(candidates)
}
