// ===============================
// src/worker.rs (merge -> route -> apply loop)
// ===============================
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::domain::{Event, EventKind};
use crate::error::EngineError;
use crate::ledger::ApplyOutcome;
use crate::merger::StreamMerger;
use crate::metrics::{EVENTS, RUN_FAILURES, SOURCE_LINES, STALE_EVENTS, UNKNOWN_EVENTS};
use crate::registry::LedgerRegistry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub events: u64,
    pub price_events: u64,
    pub fill_events: u64,
    pub unknown_events: u64,
    pub stale_events: u64,
    pub tickers: usize,
    pub cancelled: bool,
}

/// What the supervisor does on a ctrl-c.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// First signal: flip the cancel flag and keep waiting for the worker.
    Cancel,
    /// The worker has not come back (e.g. blocked on a pipe): stop waiting.
    Abort,
}

/// Counts ctrl-c presses seen while a worker runs.
#[derive(Debug, Default)]
pub struct Interrupts {
    seen: u32,
}

impl Interrupts {
    pub fn record(&mut self) -> InterruptAction {
        self.seen += 1;
        if self.seen == 1 { InterruptAction::Cancel } else { InterruptAction::Abort }
    }

    pub fn seen(&self) -> u32 { self.seen }
}

/// Drains a [`StreamMerger`] into a [`LedgerRegistry`] on the calling thread.
///
/// Pulling the next line may block, so from async code run it on the
/// blocking pool. Stops at end of stream, on the first fatal error, or when
/// the optional cancel flag flips to `true` (checked between events).
pub struct EngineWorker {
    merger: StreamMerger,
    registry: Arc<LedgerRegistry>,
    cancel: Option<watch::Receiver<bool>>,
}

impl EngineWorker {
    pub fn new(merger: StreamMerger, registry: Arc<LedgerRegistry>) -> Self {
        Self { merger, registry, cancel: None }
    }

    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn registry(&self) -> &Arc<LedgerRegistry> { &self.registry }

    pub fn run(mut self) -> Result<RunSummary, EngineError> {
        info!(sources = self.merger.source_count(), "engine worker started");
        let mut summary = RunSummary::default();
        let result = self.drain(&mut summary);
        summary.tickers = self.registry.len();

        for s in self.merger.source_stats() {
            SOURCE_LINES.with_label_values(&[s.name.as_str()]).inc_by(s.lines_read);
            debug!(source = %s.name, lines = s.lines_read, events = s.events_emitted, exhausted = s.exhausted, "source stats");
        }

        match result {
            Ok(()) => {
                info!(events = summary.events, tickers = summary.tickers, cancelled = summary.cancelled, "engine worker exited");
                Ok(summary)
            }
            Err(e) => {
                RUN_FAILURES.with_label_values(&[e.label()]).inc();
                error!(error = %e, events = summary.events, "engine worker stopped on fatal error");
                Err(e)
            }
        }
    }

    fn drain(&mut self, summary: &mut RunSummary) -> Result<(), EngineError> {
        loop {
            if self.cancel_requested() {
                warn!(events = summary.events, "cancellation requested, stopping");
                summary.cancelled = true;
                return Ok(());
            }
            let Some(event) = self.merger.next_event()? else {
                return Ok(());
            };
            self.route(&event, summary)?;
        }
    }

    fn route(&self, event: &Event, summary: &mut RunSummary) -> Result<(), EngineError> {
        summary.events += 1;
        EVENTS.with_label_values(&[event.kind().as_str()]).inc();

        let ledger = self.registry.get_or_create(event.ticker());
        match ledger.apply(event)? {
            ApplyOutcome::Applied => match event.kind() {
                EventKind::Price => summary.price_events += 1,
                EventKind::Fill => summary.fill_events += 1,
                EventKind::Unknown => {}
            },
            ApplyOutcome::UnknownKind => {
                summary.unknown_events += 1;
                UNKNOWN_EVENTS.inc();
                warn!(ticker = %event.ticker(), code = %event.type_code(), "got UNKNOWN event type");
            }
            ApplyOutcome::Stale => {
                summary.stale_events += 1;
                STALE_EVENTS.inc();
                debug!(event = %event, "stale event ignored");
            }
        }
        Ok(())
    }

    fn cancel_requested(&self) -> bool {
        self.cancel.as_ref().map_or(false, |rx| *rx.borrow())
    }
}
