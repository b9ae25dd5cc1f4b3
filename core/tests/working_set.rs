//! Queue drain, secondary source loading, and working-set assembly.

use fraudbatch_core::config::PipelineConfig;
use fraudbatch_core::queue::{drain, MemoryQueue, NullQueue, SpoolQueue};
use fraudbatch_core::source::{load_csv, load_secondary, merge, synthetic_batch};
use fraudbatch_core::transaction::Transaction;

fn payload(id: &str, amount: f64) -> String {
    format!(r#"{{"transaction_id":"{id}","amount":{amount},"location":"USA","device":"Web"}}"#)
}

fn txn(id: &str) -> Transaction {
    Transaction {
        transaction_id: id.to_string(),
        amount: 1.0,
        location: "USA".to_string(),
        device: "Web".to_string(),
    }
}

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write file");
    path.to_string_lossy().into_owned()
}

// ── Drain ──────────────────────────────────────────────────────────

#[test]
fn drain_respects_the_cap() {
    let mut queue = MemoryQueue::new();
    for i in 0..6000 {
        queue.push(payload(&format!("T{i}"), 10.0));
    }
    let drained = drain(&mut queue, 5000).expect("drain");
    assert_eq!(drained.len(), 5000);
    assert_eq!(queue.len(), 1000);
    assert_eq!(drained[0].transaction_id, "T0");
    assert_eq!(drained[4999].transaction_id, "T4999");
}

#[test]
fn drain_stops_on_empty_queue() {
    let mut queue = MemoryQueue::new();
    queue.push(payload("A", 1.0));
    let drained = drain(&mut queue, 5000).expect("drain");
    assert_eq!(drained.len(), 1);
    assert!(queue.is_empty());
}

#[test]
fn malformed_payload_fails_the_run() {
    let mut queue = MemoryQueue::new();
    queue.push(payload("A", 1.0));
    queue.push("{not json");
    queue.push(payload("B", 2.0));
    let err = drain(&mut queue, 5000).unwrap_err();
    assert!(err.to_string().contains("deserialize"));
    // The item popped before the failure is consumed; the one behind the
    // bad payload is still queued.
    assert_eq!(queue.len(), 1);
}

#[test]
fn missing_optional_fields_default() {
    let mut queue = MemoryQueue::new();
    queue.push(r#"{"transaction_id":"T1","amount":42.5}"#);
    let drained = drain(&mut queue, 10).expect("drain");
    assert_eq!(drained[0].location, "USA");
    assert_eq!(drained[0].device, "Web");
}

#[test]
fn null_queue_is_always_empty() {
    let mut queue = NullQueue;
    assert!(drain(&mut queue, 5000).expect("drain").is_empty());
}

// ── Merge ──────────────────────────────────────────────────────────

#[test]
fn merge_keeps_queue_items_first() {
    let queue_txns = vec![txn("A"), txn("B")];
    let secondary = vec![txn("C"), txn("D")];
    let ids: Vec<String> = merge(queue_txns, secondary)
        .into_iter()
        .map(|t| t.transaction_id)
        .collect();
    assert_eq!(ids, ["A", "B", "C", "D"]);
}

#[test]
fn merge_does_not_deduplicate() {
    let working_set = merge(vec![txn("X")], vec![txn("X")]);
    assert_eq!(working_set.len(), 2);
}

// ── CSV source ─────────────────────────────────────────────────────

#[test]
fn csv_rows_load_with_optional_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(
        &dir,
        "txns.csv",
        "transaction_id,amount,location,device\nT1,15000,CAN,Mobile\nT2,9.5,,\n",
    );
    let txns = load_csv(&path).expect("load");
    assert_eq!(txns.len(), 2);
    assert_eq!(txns[0].transaction_id, "T1");
    assert_eq!(txns[0].amount, 15_000.0);
    assert_eq!(txns[0].location, "CAN");
    assert_eq!(txns[0].device, "Mobile");
    // Empty cells fall back to the defaults.
    assert_eq!(txns[1].location, "USA");
    assert_eq!(txns[1].device, "Web");
}

#[test]
fn csv_without_location_or_device_columns_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "txns.csv", "transaction_id,amount\nT1,12.5\n");
    let txns = load_csv(&path).expect("load");
    assert_eq!(txns[0].location, "USA");
    assert_eq!(txns[0].device, "Web");
}

#[test]
fn csv_missing_required_column_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "bad.csv", "transaction_id,location\nT1,USA\n");
    let err = load_csv(&path).unwrap_err();
    assert!(err.to_string().contains("amount"));
}

#[test]
fn csv_unparsable_amount_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "bad.csv", "transaction_id,amount\nT1,abc\n");
    assert!(load_csv(&path).is_err());
}

#[test]
fn csv_empty_transaction_id_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "bad.csv", "transaction_id,amount\n,100\n");
    assert!(load_csv(&path).is_err());
}

// ── Synthetic source ───────────────────────────────────────────────

#[test]
fn synthetic_batch_is_deterministic_and_shaped() {
    let a = synthetic_batch(50, 1_700_000_000);
    let b = synthetic_batch(50, 1_700_000_000);
    assert_eq!(a, b);
    assert_eq!(a.len(), 50);
    assert_eq!(a[0].transaction_id, "TXN1700000001");
    assert_eq!(a[0].amount, 25.0);
    // Every 7th record spikes over the flagging threshold.
    assert_eq!(a[6].amount, 25_000.0);
    assert_eq!(a[13].amount, 25_000.0);
    assert_eq!(a[0].location, "USA");
    assert_eq!(a[2].location, "CAN");
    assert_eq!(a[0].device, "Web");
    assert_eq!(a[1].device, "Mobile");
}

#[test]
fn secondary_source_is_empty_when_no_file_and_fallback_disabled() {
    let mut cfg = PipelineConfig::default_test(":memory:");
    cfg.csv_path = "no/such/file.csv".to_string();
    assert!(load_secondary(&cfg).expect("load").is_empty());
}

#[test]
fn synthetic_fallback_is_gated_by_the_flag() {
    let mut cfg = PipelineConfig::default_test(":memory:");
    cfg.csv_path = "no/such/file.csv".to_string();
    cfg.synthetic_fallback = true;
    cfg.synthetic_count = 10;
    cfg.synthetic_base_id = 500;
    let txns = load_secondary(&cfg).expect("load");
    assert_eq!(txns.len(), 10);
    assert_eq!(txns[0].transaction_id, "TXN501");
}

// ── Spool queue ────────────────────────────────────────────────────

#[test]
fn spool_queue_flush_preserves_undrained_items() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("spool.jsonl");
    std::fs::write(
        &path,
        format!(
            "{}\n{}\n{}\n",
            payload("A", 1.0),
            payload("B", 2.0),
            payload("C", 3.0)
        ),
    )
    .expect("write spool");

    let mut queue = SpoolQueue::open(&path).expect("open");
    let drained = drain(&mut queue, 2).expect("drain");
    assert_eq!(drained.len(), 2);
    queue.flush().expect("flush");

    let reopened = SpoolQueue::open(&path).expect("reopen");
    assert_eq!(reopened.len(), 1);
}

#[test]
fn spool_queue_open_tolerates_a_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let queue = SpoolQueue::open(dir.path().join("absent.jsonl")).expect("open");
    assert!(queue.is_empty());
}
