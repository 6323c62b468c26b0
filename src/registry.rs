// ===============================
// src/registry.rs (ticker -> ledger directory for one run)
// ===============================
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use crate::domain::PnlReport;
use crate::ledger::{InstrumentLedger, StalePolicy};
use crate::metrics::LEDGERS;

/// Ledgers are created on first sight of a ticker and live until the registry is dropped.
///
/// Backed by a sharded map: lookups of existing tickers only take a shard read
/// lock, and insert-if-absent runs under the shard write lock, so concurrent
/// first access to one ticker still builds exactly one ledger.
pub struct LedgerRegistry {
    ledgers: DashMap<String, Arc<InstrumentLedger>, ahash::RandomState>,
    stale_policy: StalePolicy,
    created: AtomicU64,
}

impl Default for LedgerRegistry {
    fn default() -> Self { Self::new(StalePolicy::default()) }
}

impl LedgerRegistry {
    pub fn new(stale_policy: StalePolicy) -> Self {
        Self {
            ledgers: DashMap::with_hasher(ahash::RandomState::new()),
            stale_policy,
            created: AtomicU64::new(0),
        }
    }

    pub fn get_or_create(&self, ticker: &str) -> Arc<InstrumentLedger> {
        if let Some(existing) = self.ledgers.get(ticker) {
            return Arc::clone(existing.value());
        }
        let entry = self.ledgers.entry(ticker.to_string()).or_insert_with(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            LEDGERS.inc();
            info!(%ticker, "added new ledger");
            Arc::new(InstrumentLedger::with_policy(ticker, self.stale_policy))
        });
        Arc::clone(entry.value())
    }

    pub fn get(&self, ticker: &str) -> Option<Arc<InstrumentLedger>> {
        self.ledgers.get(ticker).map(|l| Arc::clone(l.value()))
    }

    pub fn len(&self) -> usize { self.ledgers.len() }

    pub fn is_empty(&self) -> bool { self.ledgers.is_empty() }

    /// Number of ledgers ever constructed by this registry.
    pub fn created_count(&self) -> u64 { self.created.load(Ordering::Relaxed) }

    pub fn stale_policy(&self) -> StalePolicy { self.stale_policy }

    pub fn tickers(&self) -> Vec<String> {
        let mut out: Vec<String> = self.ledgers.iter().map(|e| e.key().clone()).collect();
        out.sort();
        out
    }

    /// Snapshot of every ledger, sorted by ticker.
    pub fn snapshot_all(&self) -> Vec<PnlReport> {
        // clone the Arcs first so no shard lock is held while taking ledger locks
        let mut ledgers: Vec<Arc<InstrumentLedger>> = self.ledgers.iter().map(|e| Arc::clone(e.value())).collect();
        ledgers.sort_by(|a, b| a.ticker().cmp(b.ticker()));
        ledgers.iter().map(|l| l.snapshot()).collect()
    }
}
