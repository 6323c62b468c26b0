// tests/scenario_end_to_end_pnl.rs
use std::sync::Arc;

use pnl_engine::domain::Event;
use pnl_engine::ledger::InstrumentLedger;
use pnl_engine::merger::StreamMerger;
use pnl_engine::parser::parse_line;
use pnl_engine::registry::LedgerRegistry;
use pnl_engine::source::{LineSource, MemorySource};
use pnl_engine::worker::EngineWorker;
use rust_decimal_macros::dec;

fn two_feeds() -> Vec<Box<dyn LineSource>> {
    vec![
        Box::new(MemorySource::new("a", ["P 100 ABC 10.00", "F 300 ABC 11.00 2 BUY"])),
        Box::new(MemorySource::new("b", ["F 200 ABC 9.50 3 SELL"])),
    ]
}

#[test]
fn merge_order_matches_priority_then_timestamp() {
    let order: Vec<String> = StreamMerger::new(two_feeds()).map(|e| e.unwrap().to_string()).collect();
    assert_eq!(order, vec!["P 100 ABC 10.00", "F 200 ABC 9.50 3 SELL", "F 300 ABC 11.00 2 BUY"]);
}

#[test]
fn ledger_walks_through_each_step() {
    let ledger = InstrumentLedger::new("ABC");
    let events: Vec<Event> = StreamMerger::new(two_feeds()).map(|e| e.unwrap()).collect();

    ledger.apply(&events[0]).unwrap();
    assert_eq!(ledger.state().last_price, dec!(10.00));

    ledger.apply(&events[1]).unwrap();
    let st = ledger.state();
    assert_eq!(st.position, dec!(-3));
    assert_eq!(st.cash_balance, dec!(28.50));

    ledger.apply(&events[2]).unwrap();
    let st = ledger.state();
    assert_eq!(st.position, dec!(-1));
    assert_eq!(st.cash_balance, dec!(6.50));

    let snap = ledger.snapshot();
    assert_eq!(snap.total_value, dec!(-3.50));
    assert_eq!(snap.to_string(), "PNL 300 ABC -1 -3.50");
}

#[test]
fn worker_run_produces_expected_report() {
    let registry = Arc::new(LedgerRegistry::default());
    let summary = EngineWorker::new(StreamMerger::new(two_feeds()), Arc::clone(&registry)).run().unwrap();
    assert_eq!(summary.events, 3);
    assert_eq!(summary.price_events, 1);
    assert_eq!(summary.fill_events, 2);
    assert_eq!(summary.tickers, 1);

    let lines: Vec<String> = registry.snapshot_all().iter().map(|r| r.to_string()).collect();
    assert_eq!(lines, vec!["PNL 300 ABC -1 -3.50"]);
}

#[test]
fn flat_round_trip_is_worth_realized_cash() {
    let ledger = InstrumentLedger::new("XYZ");
    for line in ["F 1 XYZ 10 5 BUY", "F 2 XYZ 12 5 SELL", "P 3 XYZ 12"] {
        ledger.apply(&parse_line(line).unwrap()).unwrap();
    }
    let st = ledger.state();
    assert_eq!(st.position, dec!(0));
    assert_eq!(st.cash_balance, dec!(10));
    assert_eq!(ledger.snapshot().total_value, dec!(10));
}

#[test]
fn tickers_are_kept_apart() {
    let sources: Vec<Box<dyn LineSource>> = vec![
        Box::new(MemorySource::new("prices", ["P 1 AAA 2", "P 1 BBB 3"])),
        Box::new(MemorySource::new("fills", ["F 2 AAA 2 10 BUY", "F 3 BBB 3 4 SELL", "X 4 CCC ?"])),
    ];
    let registry = Arc::new(LedgerRegistry::default());
    let summary = EngineWorker::new(StreamMerger::new(sources), Arc::clone(&registry)).run().unwrap();
    assert_eq!(summary.unknown_events, 1);

    let lines: Vec<String> = registry.snapshot_all().iter().map(|r| r.to_string()).collect();
    // an unknown-only ticker still gets a (zero) ledger
    assert_eq!(lines, vec!["PNL 2 AAA 10 0", "PNL 3 BBB -4 0", "PNL -1 CCC 0 0"]);
}
