//! The queue capability and the run drainer.
//!
//! RULE: the pipeline consumes "a FIFO queue" through an injected trait
//! and never knows the transport. Popped items are destructively
//! removed; a payload drained but never persisted (crash before commit)
//! is not re-delivered. At-most-once, not exactly-once.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::transaction::Transaction;

/// The FIFO capability the pipeline consumes. `pop` removes and returns
/// the front payload, or `None` when the queue is empty. Must not block.
pub trait TxnQueue {
    fn pop(&mut self) -> PipelineResult<Option<String>>;
}

/// In-memory FIFO. The producer side (`push`) exists for tests and the
/// demo seeder.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    items: VecDeque<String>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, payload: impl Into<String>) {
        self.items.push_back(payload.into());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl TxnQueue for MemoryQueue {
    fn pop(&mut self) -> PipelineResult<Option<String>> {
        Ok(self.items.pop_front())
    }
}

/// Stands in when no queue is configured. Always empty.
pub struct NullQueue;

impl TxnQueue for NullQueue {
    fn pop(&mut self) -> PipelineResult<Option<String>> {
        Ok(None)
    }
}

/// A JSON-lines spool file drained destructively.
///
/// The whole file is read at open; pops come from the front of the
/// in-memory remainder. `flush` rewrites the file with whatever was not
/// popped. A crash before `flush` re-delivers already-popped items on
/// the next run.
pub struct SpoolQueue {
    path: PathBuf,
    items: VecDeque<String>,
}

impl SpoolQueue {
    pub fn open(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref().to_path_buf();
        let items = if path.exists() {
            std::fs::read_to_string(&path)?
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect()
        } else {
            VecDeque::new()
        };
        Ok(Self { path, items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a payload at the back (producer side, used by the seeder).
    pub fn push(&mut self, payload: impl Into<String>) {
        self.items.push_back(payload.into());
    }

    /// Write the undrained remainder back to the spool file.
    pub fn flush(&self) -> PipelineResult<()> {
        let mut out = String::with_capacity(self.items.iter().map(|i| i.len() + 1).sum());
        for item in &self.items {
            out.push_str(item);
            out.push('\n');
        }
        std::fs::write(&self.path, out)?;
        Ok(())
    }
}

impl TxnQueue for SpoolQueue {
    fn pop(&mut self) -> PipelineResult<Option<String>> {
        Ok(self.items.pop_front())
    }
}

/// Drain up to `cap` payloads from the queue and deserialize each.
///
/// Policy: a payload that fails to deserialize fails the whole run.
/// Items popped before the failure stay consumed.
pub fn drain(queue: &mut dyn TxnQueue, cap: usize) -> PipelineResult<Vec<Transaction>> {
    let mut drained = Vec::new();
    while drained.len() < cap {
        let Some(payload) = queue.pop()? else {
            break;
        };
        let txn = serde_json::from_str::<Transaction>(&payload)
            .map_err(|source| PipelineError::QueueDeserialize { payload, source })?;
        drained.push(txn);
    }
    log::debug!("Drained {} transactions from the queue", drained.len());
    Ok(drained)
}
