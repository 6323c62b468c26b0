// tests/scenario_registry_concurrent_first_access.rs
use std::sync::{Arc, Barrier};
use std::thread;

use pnl_engine::parser::parse_line;
use pnl_engine::registry::LedgerRegistry;
use rust_decimal::Decimal;

#[test]
fn concurrent_get_or_create_yields_one_ledger() {
    const THREADS: usize = 16;
    let registry = Arc::new(LedgerRegistry::default());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.get_or_create("XYZ")
            })
        })
        .collect();
    let ledgers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(ledgers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.created_count(), 1);
}

#[test]
fn snapshots_run_alongside_updates_on_other_tickers() {
    let registry = Arc::new(LedgerRegistry::default());
    let quiet = registry.get_or_create("QUIET");
    quiet.apply(&parse_line("P 1 QUIET 7").unwrap()).unwrap();

    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            let ev = parse_line("F 2 BUSY 1 1 BUY").unwrap();
            for _ in 0..10_000 {
                registry.get_or_create("BUSY").apply(&ev).unwrap();
            }
        })
    };

    let mut reads = 0u32;
    while !writer.is_finished() || reads == 0 {
        for report in registry.snapshot_all() {
            if report.ticker == "QUIET" {
                assert_eq!(report.to_string(), "PNL 1 QUIET 0 0");
            }
        }
        reads += 1;
    }
    writer.join().unwrap();

    let busy = registry.get("BUSY").unwrap().state();
    assert_eq!(busy.position, Decimal::from(10_000));
    assert_eq!(busy.cash_balance, Decimal::from(-10_000));
    assert_eq!(registry.created_count(), 2);
}
