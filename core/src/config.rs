//! Run configuration.
//!
//! RULE: the configuration is built once at process start and passed by
//! reference into the orchestrator. Core logic never reads the
//! environment itself; `from_env` is the single read point, called from
//! main.

use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_DRAIN_CAP: usize = 5000;
pub const DEFAULT_CSV_PATH: &str = "data/transactions_sample.csv";
pub const DEFAULT_SYNTHETIC_COUNT: usize = 50;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// SQLite database path. The one required setting.
    pub db_path: String,
    /// Secondary source file. Absence falls through to the synthetic
    /// generator (if enabled) or an empty batch, never an error.
    pub csv_path: String,
    /// Queue spool file consumed by the runner; `None` disables queue
    /// support entirely.
    pub queue_spool: Option<String>,
    /// Maximum queue items removed per run.
    pub drain_cap: usize,
    /// Gate for the synthetic secondary source. Demo data only; it never
    /// substitutes for a real file silently.
    pub synthetic_fallback: bool,
    pub synthetic_count: usize,
    /// Base for synthetic transaction ids. The runner seeds it from
    /// wall-clock time; tests pin it.
    pub synthetic_base_id: u64,
}

impl PipelineConfig {
    /// Read settings from the environment. `FRAUD_DB` may still be empty
    /// here when the caller supplies the database path another way;
    /// `validate` enforces it before a run.
    pub fn from_env() -> Self {
        Self {
            db_path: std::env::var("FRAUD_DB").unwrap_or_default(),
            csv_path: std::env::var("TXN_CSV_PATH")
                .unwrap_or_else(|_| DEFAULT_CSV_PATH.to_string()),
            queue_spool: std::env::var("QUEUE_SPOOL").ok(),
            drain_cap: std::env::var("DRAIN_CAP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_DRAIN_CAP),
            synthetic_fallback: std::env::var("SYNTHETIC_FALLBACK")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            synthetic_count: std::env::var("SYNTHETIC_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SYNTHETIC_COUNT),
            synthetic_base_id: 0,
        }
    }

    /// Fail fast on missing required settings, before any side effects.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.db_path.is_empty() {
            return Err(PipelineError::MissingConfig { name: "FRAUD_DB" });
        }
        Ok(())
    }

    /// Fixed settings for tests: no secondary file, synthetic disabled.
    pub fn default_test(db_path: &str) -> Self {
        Self {
            db_path: db_path.to_string(),
            csv_path: "no-secondary-source.csv".to_string(),
            queue_spool: None,
            drain_cap: DEFAULT_DRAIN_CAP,
            synthetic_fallback: false,
            synthetic_count: DEFAULT_SYNTHETIC_COUNT,
            synthetic_base_id: 0,
        }
    }
}
