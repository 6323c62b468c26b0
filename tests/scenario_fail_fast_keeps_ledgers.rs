// tests/scenario_fail_fast_keeps_ledgers.rs
use std::io;
use std::sync::Arc;

use pnl_engine::error::EngineError;
use pnl_engine::merger::StreamMerger;
use pnl_engine::registry::LedgerRegistry;
use pnl_engine::source::{LineSource, MemorySource};
use pnl_engine::worker::EngineWorker;
use rust_decimal_macros::dec;

#[test]
fn malformed_record_stops_run_and_keeps_applied_state() {
    let sources: Vec<Box<dyn LineSource>> = vec![
        Box::new(MemorySource::new("prices", ["P 1 ABC 10", "P 2 ABC eleven", "P 3 ABC 12"])),
        Box::new(MemorySource::new("fills", ["F 5 ABC 10 2 BUY"])),
    ];
    let registry = Arc::new(LedgerRegistry::default());
    let err = EngineWorker::new(StreamMerger::new(sources), Arc::clone(&registry)).run().unwrap_err();

    match err {
        EngineError::MalformedRecord { origin, .. } => {
            assert_eq!(origin.source_index, Some(0));
            assert_eq!(origin.line_no, Some(2));
        }
        other => panic!("expected MalformedRecord, got {other:?}"),
    }
    // P 1 went through, the fill behind the bad line never did
    let st = registry.get("ABC").unwrap().state();
    assert_eq!(st.last_price, dec!(10));
    assert_eq!(st.position, dec!(0));
    assert_eq!(registry.get("ABC").unwrap().snapshot().to_string(), "PNL 1 ABC 0 0");
}

#[test]
fn read_failure_is_not_end_of_stream() {
    let sources: Vec<Box<dyn LineSource>> = vec![Box::new(
        MemorySource::new("flaky", ["P 1 ABC 10", "F 2 ABC 10 1 BUY"]).then_fail(io::ErrorKind::UnexpectedEof, "truncated gzip"),
    )];
    let mut merger = StreamMerger::new(sources);

    assert_eq!(merger.next_event().unwrap().unwrap().to_string(), "P 1 ABC 10");
    // the failure behind the last line must not swallow it
    assert_eq!(merger.next_event().unwrap().unwrap().to_string(), "F 2 ABC 10 1 BUY");
    match merger.next_event() {
        Err(EngineError::SourceRead { source_index, source }) => {
            assert_eq!(source_index, 0);
            assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof);
        }
        other => panic!("expected SourceRead, got {other:?}"),
    }
    assert!(merger.next_event().unwrap().is_none());
}

#[test]
fn worker_surfaces_read_failure_after_applying_buffered_events() {
    let sources: Vec<Box<dyn LineSource>> = vec![
        Box::new(MemorySource::new("ok", ["P 1 ABC 10", "P 9 ABC 20"])),
        Box::new(MemorySource::new("flaky", ["F 2 ABC 10 1 BUY"]).then_fail(io::ErrorKind::Other, "disk gone")),
    ];
    let registry = Arc::new(LedgerRegistry::default());
    let err = EngineWorker::new(StreamMerger::new(sources), Arc::clone(&registry)).run().unwrap_err();
    assert!(matches!(err, EngineError::SourceRead { source_index: 1, .. }));

    // prices drain first (P 1, P 9), then the buffered fill, then the failure
    let st = registry.get("ABC").unwrap().state();
    assert_eq!(st.last_price, dec!(20));
    assert_eq!(st.position, dec!(1));
    assert_eq!(st.cash_balance, dec!(-10));
}

#[test]
fn failure_while_priming_is_reported_immediately() {
    let sources: Vec<Box<dyn LineSource>> = vec![
        Box::new(MemorySource::new("ok", ["P 1 ABC 10"])),
        Box::new(MemorySource::new("broken", Vec::<String>::new()).then_fail(io::ErrorKind::Other, "no such device")),
    ];
    let registry = Arc::new(LedgerRegistry::default());
    let err = EngineWorker::new(StreamMerger::new(sources), Arc::clone(&registry)).run().unwrap_err();
    assert!(matches!(err, EngineError::SourceRead { source_index: 1, .. }));
    assert!(registry.is_empty());
}
