//! pipeline-runner: headless batch ETL runner.
//!
//! Usage:
//!   pipeline-runner --db fraud.db [--queue spool.jsonl] [--csv txns.csv]
//!   pipeline-runner --db fraud.db --queue spool.jsonl --seed-queue 200 --seed 42
//!
//! Settings come from the environment (FRAUD_DB, TXN_CSV_PATH,
//! QUEUE_SPOOL, DRAIN_CAP, SYNTHETIC_FALLBACK, SYNTHETIC_COUNT); CLI
//! flags override. Exit code is non-zero on any fatal failure.

use anyhow::Result;
use fraudbatch_core::{
    config::PipelineConfig,
    pipeline::{self, RunSummary},
    queue::{NullQueue, SpoolQueue},
    transaction::Transaction,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut cfg = PipelineConfig::from_env();
    apply_flags(&mut cfg, &args);

    // Demo mode: fill the spool with generated transactions and exit
    // without running the pipeline.
    if let Some(count) = parse_opt::<usize>(&args, "--seed-queue") {
        let spool = cfg
            .queue_spool
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--seed-queue needs --queue <spool file>"))?;
        let seed = parse_arg(&args, "--seed", 42u64);
        return seed_queue(&spool, count, seed);
    }

    cfg.validate()?;
    if cfg.synthetic_base_id == 0 {
        cfg.synthetic_base_id = unix_time();
    }

    println!("pipeline-runner");
    println!("  db:     {}", cfg.db_path);
    println!("  csv:    {}", cfg.csv_path);
    println!("  queue:  {}", cfg.queue_spool.as_deref().unwrap_or("(disabled)"));
    println!("  cap:    {}", cfg.drain_cap);
    println!();

    let summary = match cfg.queue_spool.clone() {
        Some(path) => {
            let mut queue = SpoolQueue::open(&path)?;
            let result = pipeline::run(&cfg, &mut queue);
            // Keep the undrained remainder even when the run failed.
            if let Err(e) = queue.flush() {
                log::warn!("Failed to rewrite queue spool {path}: {e}");
            }
            result?
        }
        None => pipeline::run(&cfg, &mut NullQueue)?,
    };

    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:             {}", summary.run_id);
    println!("  total_transactions: {}", summary.total_transactions);
    println!("  total_flagged:      {}", summary.total_flagged);
    println!("  alerts_inserted:    {}", summary.alerts_inserted);
}

/// Fill the spool with deterministic pseudo-random demo transactions.
fn seed_queue(path: &str, count: usize, seed: u64) -> Result<()> {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let mut spool = SpoolQueue::open(path)?;
    for i in 0..count {
        let txn = Transaction {
            transaction_id: format!("GEN{seed}-{i:06}"),
            amount: rng.gen_range(1_000..2_000_000) as f64 / 100.0,
            location: if rng.gen_bool(0.8) { "USA" } else { "CAN" }.to_string(),
            device: if rng.gen_bool(0.5) { "Web" } else { "Mobile" }.to_string(),
        };
        spool.push(serde_json::to_string(&txn)?);
    }
    spool.flush()?;
    println!("Seeded {count} transactions into {path}");
    Ok(())
}

fn apply_flags(cfg: &mut PipelineConfig, args: &[String]) {
    if let Some(db) = flag_value(args, "--db") {
        cfg.db_path = db.to_string();
    }
    if let Some(csv) = flag_value(args, "--csv") {
        cfg.csv_path = csv.to_string();
    }
    if let Some(queue) = flag_value(args, "--queue") {
        cfg.queue_spool = Some(queue.to_string());
    }
    cfg.drain_cap = parse_arg(args, "--cap", cfg.drain_cap);
    if args.iter().any(|a| a == "--synthetic") {
        cfg.synthetic_fallback = true;
    }
    cfg.synthetic_count = parse_arg(args, "--synthetic-count", cfg.synthetic_count);
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_opt<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn unix_time() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
