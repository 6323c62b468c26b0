// ===============================
// src/metrics.rs
// ===============================
use std::path::Path;

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tracing::debug;

// Single custom registry (we register everything here)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(Opts::new("events_total", "merged events by kind"), &["kind"]).unwrap()
});

pub static UNKNOWN_EVENTS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("unknown_events_total", "events with an unknown type code").unwrap());

pub static STALE_EVENTS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("stale_events_total", "events rejected by the staleness guard").unwrap());

pub static LEDGERS: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("ledgers", "instrument ledgers created").unwrap());

pub static RUN_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(Opts::new("run_failures_total", "fatal run failures (label: reason)"), &["reason"]).unwrap()
});

pub static SOURCE_LINES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(Opts::new("source_lines_total", "raw lines read per source"), &["source"]).unwrap()
});

pub fn init() {
    for r in [
        REGISTRY.register(Box::new(EVENTS.clone())),
        REGISTRY.register(Box::new(UNKNOWN_EVENTS.clone())),
        REGISTRY.register(Box::new(STALE_EVENTS.clone())),
        REGISTRY.register(Box::new(LEDGERS.clone())),
        REGISTRY.register(Box::new(RUN_FAILURES.clone())),
        REGISTRY.register(Box::new(SOURCE_LINES.clone())),
    ] {
        if let Err(e) = r {
            debug!(?e, "metric already registered");
        }
    }
}

// Encode all metrics in Prometheus text format
pub fn encode_metrics() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buf = Vec::new();
    if encoder.encode(&families, &mut buf).is_err() || buf.is_empty() {
        buf.extend_from_slice(b"# no metrics\n");
    }
    buf
}

/// No HTTP endpoint here: the text dump goes to a file at the end of a run.
pub fn write_metrics_file(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, encode_metrics())
}
