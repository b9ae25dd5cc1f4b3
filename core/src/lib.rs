//! Batch fraud ETL.
//!
//! One run: drain the transaction queue, merge with the file-based or
//! synthetic secondary source, flag high-amount transactions, and
//! persist the ledger and alert tables idempotently.

pub mod classify;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod queue;
pub mod source;
pub mod store;
pub mod transaction;
