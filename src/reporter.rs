// ===============================
// src/reporter.rs
// ===============================
//
// Writer laporan PNL:
// - pnl   : `PNL <ts> <ticker> <position> <totalValue>` per baris (default)
// - jsonl : satu objek JSON per baris + generated_at (wall clock)
// Output ke file (parent dir dibuat otomatis) atau stdout.
//
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tokio::{
    fs::{self, OpenOptions},
    io::{self, AsyncWrite, AsyncWriteExt, BufWriter},
    sync::mpsc,
};
use tracing::{error, info};

use crate::domain::PnlReport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Pnl,
    Jsonl,
}

#[derive(Serialize)]
struct ReportRecord<'a> {
    generated_at: String,
    #[serde(flatten)]
    report: &'a PnlReport,
}

pub fn render(report: &PnlReport, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Pnl => Ok(report.to_string()),
        ReportFormat::Jsonl => serde_json::to_string(&ReportRecord { generated_at: Utc::now().to_rfc3339(), report }),
    }
}

type Sink = BufWriter<Box<dyn AsyncWrite + Unpin + Send>>;

async fn open_writer(path: Option<&Path>) -> io::Result<Sink> {
    let inner: Box<dyn AsyncWrite + Unpin + Send> = match path {
        None => Box::new(io::stdout()),
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await?;
                }
            }
            Box::new(OpenOptions::new().create(true).write(true).truncate(true).open(path).await?)
        }
    };
    Ok(BufWriter::new(inner))
}

/// Write every report received until the channel closes; returns the number written.
pub async fn run(mut rx: mpsc::Receiver<PnlReport>, path: Option<PathBuf>, format: ReportFormat) -> io::Result<u64> {
    let target = path.as_ref().map_or_else(|| "stdout".to_string(), |p| p.display().to_string());
    info!(%target, ?format, "reporter: started");
    let mut writer = open_writer(path.as_deref()).await?;

    let mut written: u64 = 0;
    while let Some(report) = rx.recv().await {
        let line = match render(&report, format) {
            Ok(s) => s,
            Err(e) => {
                error!(?e, ticker = %report.ticker, "reporter: serialize error, skip report");
                continue;
            }
        };
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        written += 1;
    }

    writer.flush().await?;
    info!(written, "reporter: channel closed, stopped");
    Ok(written)
}
