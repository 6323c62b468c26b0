// ===============================
// src/main.rs
// ===============================
/*
 cargo run --release -- fills.gz prices.gz --report-file out/pnl.txt

 # atau lewat .env
 SOURCES=fills.gz,prices.gz
 REPORT_INTERVAL_MS=1000
 STALE_POLICY=accept
*/
/*
=============================================================================
Project : pnl_engine_rust — ordered multi-feed merge & per-ticker PnL ledger
Module  : main.rs
Version : 0.1.0
Author  : Kukuh Tripamungkas Wicaksono (Kukuh TW)
Email   : kukuhtw@gmail.com
WhatsApp: https://wa.me/628129893706
LinkedIn: https://id.linkedin.com/in/kukuhtw
License : MIT (see LICENSE)

Summary : Merges N time-ordered price/fill feeds (plain or .gz) under the
          price-before-fill priority rule, keeps a lock-per-ticker ledger of
          position, realized cash and last price, and reports mark-to-market
          PNL lines.

(c) 2025 Kukuh TW. All rights reserved where applicable.
=============================================================================
*/
use std::process::ExitCode;
use std::sync::Arc;

use tokio::{
    sync::{mpsc, watch},
    time::{interval, Duration, MissedTickBehavior},
};
use tracing::{error, info, warn};

use pnl_engine::{
    config::{self, Args},
    domain::PnlReport,
    error::EngineError,
    merger::StreamMerger,
    metrics,
    registry::LedgerRegistry,
    reporter,
    source,
    worker::{EngineWorker, InterruptAction, Interrupts, RunSummary},
};

fn main() -> ExitCode {
    // ---- Load config ----
    let args = config::load();

    // ---- Logging ----
    // stdout is reserved for PNL lines
    tracing_subscriber::fmt()
        .with_env_filter(args.log_filter.as_str())
        .with_writer(std::io::stderr)
        .init();

    // ---- Metrics ----
    metrics::init();

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "cannot start tokio runtime");
            return ExitCode::FAILURE;
        }
    };
    let result = rt.block_on(run(args));
    // worker yang masih block di read() tidak boleh menahan proses
    rt.shutdown_background();

    match result {
        Ok(summary) => {
            info!(?summary, "run completed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<RunSummary, EngineError> {
    args.validate()?;
    info!(
        sources = ?args.sources,
        report_file = ?args.report_file,
        report_format = ?args.report_format,
        stale_policy = ?args.stale_policy(),
        report_interval_ms = args.report_interval_ms,
        "startup config"
    );

    // ---- Sources -> merger ----
    let mut sources = Vec::with_capacity(args.sources.len());
    for path in &args.sources {
        sources.push(source::open_file(path)?);
    }
    let merger = StreamMerger::new(sources);

    // ---- Registry + worker (blocking pool: readLine boleh block) ----
    let registry = Arc::new(LedgerRegistry::new(args.stale_policy()));
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let worker = EngineWorker::new(merger, Arc::clone(&registry)).with_cancel(cancel_rx);
    let mut handle = tokio::task::spawn_blocking(move || worker.run());

    // ---- Reporter ----
    let (rep_tx, rep_rx) = mpsc::channel::<PnlReport>(1024);
    let reporter = tokio::spawn(reporter::run(rep_rx, args.report_file.clone(), args.report_format));

    // ---- Periodic snapshots while the worker runs ----
    let periodic = args.report_interval_ms > 0;
    let mut tick = interval(Duration::from_millis(args.report_interval_ms.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tick.tick().await;
    let mut interrupts = Interrupts::default();
    let mut signals = true;

    let outcome = loop {
        tokio::select! {
            joined = &mut handle => {
                break joined.unwrap_or_else(|e| Err(EngineError::WorkerAborted(e.to_string())));
            }
            _ = tick.tick(), if periodic => {
                for r in registry.snapshot_all() {
                    info!(report = %r, "snapshot");
                }
            }
            res = tokio::signal::ctrl_c(), if signals => match res.map(|()| interrupts.record()) {
                Err(e) => {
                    warn!(error = %e, "ctrl-c handler unavailable");
                    signals = false;
                }
                Ok(InterruptAction::Cancel) => {
                    warn!("ctrl-c received, asking worker to stop (again to abort)");
                    let _ = cancel_tx.send(true);
                }
                Ok(InterruptAction::Abort) => {
                    error!("second ctrl-c, no longer waiting for the worker");
                    break Err(EngineError::WorkerAborted("interrupted twice while the worker was blocked".into()));
                }
            },
        }
    };

    // ---- Final report: ledgers stay valid even after a fatal error ----
    for r in registry.snapshot_all() {
        if rep_tx.send(r).await.is_err() {
            warn!("reporter gone, final report truncated");
            break;
        }
    }
    drop(rep_tx);
    let reported = match reporter.await {
        Ok(Ok(written)) => {
            info!(written, "final report written");
            Ok(())
        }
        Ok(Err(e)) => Err(EngineError::Io(e)),
        Err(e) => Err(EngineError::WorkerAborted(format!("reporter: {e}"))),
    };

    if let Some(path) = &args.metrics_file {
        if let Err(e) = metrics::write_metrics_file(path) {
            warn!(error = %e, path = %path.display(), "metrics dump failed");
        }
    }

    let summary = outcome?;
    reported?;
    Ok(summary)
}
