// ===============================
// src/lib.rs
// ===============================
//! Ordered multi-feed merge and per-ticker PnL ledger.
//!
//! Line sources (price `P` and fill `F` records) are parsed into [`domain::Event`]s,
//! merged by [`merger::StreamMerger`] (prices always ahead of fills, then by
//! timestamp, then by source index), and applied by [`worker::EngineWorker`]
//! to the ledgers of a [`registry::LedgerRegistry`]. Each
//! [`ledger::InstrumentLedger`] can be snapshotted into a `PNL` line at any
//! time, including while the worker is still applying events.
//!
//! ```rust
//! use std::sync::Arc;
//! use pnl_engine::{merger::StreamMerger, registry::LedgerRegistry, source::{LineSource, MemorySource}, worker::EngineWorker};
//!
//! let sources: Vec<Box<dyn LineSource>> = vec![
//!     Box::new(MemorySource::new("a", ["P 100 ABC 10.00", "F 300 ABC 11.00 2 BUY"])),
//!     Box::new(MemorySource::new("b", ["F 200 ABC 9.50 3 SELL"])),
//! ];
//! let registry = Arc::new(LedgerRegistry::default());
//! EngineWorker::new(StreamMerger::new(sources), Arc::clone(&registry)).run().unwrap();
//! assert_eq!(registry.get("ABC").unwrap().snapshot().to_string(), "PNL 300 ABC -1 -3.50");
//! ```
pub mod config;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod merger;
pub mod metrics;
pub mod parser;
pub mod registry;
pub mod reporter;
pub mod source;
pub mod worker;
