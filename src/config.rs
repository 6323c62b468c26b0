// ===============================
// src/config.rs
// ===============================
/*
=============================================================================
Project : pnl_engine_rust — ordered multi-feed merge & per-ticker PnL ledger
Module  : config.rs
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
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use dotenvy::dotenv;

use crate::error::EngineError;
use crate::ledger::StalePolicy;
use crate::reporter::ReportFormat;

/// CLI spelling of [`StalePolicy`]; the ledger type stays free of clap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum StalePolicyArg {
    #[default]
    Accept,
    Reject,
}

impl From<StalePolicyArg> for StalePolicy {
    fn from(arg: StalePolicyArg) -> Self {
        match arg {
            StalePolicyArg::Accept => StalePolicy::Accept,
            StalePolicyArg::Reject => StalePolicy::Reject,
        }
    }
}

/// Every flag can also come from the environment (or `.env`).
#[derive(Clone, Debug, Parser)]
#[command(name = "pnl_engine", version, about = "Merge price/fill feeds and report per-ticker PNL")]
pub struct Args {
    /// Input feeds, one event per line; `*.gz` is decompressed.
    /// SOURCES=fills.gz,prices.gz
    #[arg(env = "SOURCES", value_delimiter = ',', required = true, num_args = 1..)]
    pub sources: Vec<PathBuf>,

    /// Write final PNL lines here instead of stdout.
    #[arg(long, env = "REPORT_FILE")]
    pub report_file: Option<PathBuf>,

    #[arg(long, env = "REPORT_FORMAT", value_enum, default_value_t = ReportFormat::Pnl)]
    pub report_format: ReportFormat,

    /// Log a snapshot of every ledger this often while running; 0 disables.
    #[arg(long, env = "REPORT_INTERVAL_MS", default_value_t = 1000)]
    pub report_interval_ms: u64,

    /// What to do with events older than a ledger's last applied event.
    #[arg(long, env = "STALE_POLICY", value_enum, default_value_t = StalePolicyArg::Accept)]
    pub stale_policy: StalePolicyArg,

    /// Dump prometheus text metrics to this file when the run ends.
    #[arg(long, env = "METRICS_FILE")]
    pub metrics_file: Option<PathBuf>,

    /// tracing EnvFilter directive, e.g. `info` or `pnl_engine=debug`.
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_filter: String,
}

impl Args {
    pub fn stale_policy(&self) -> StalePolicy {
        self.stale_policy.into()
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.sources.is_empty() {
            return Err(EngineError::Config("at least one source is required".into()));
        }
        if let Some(dup) = self.sources.iter().enumerate().find_map(|(i, s)| self.sources[..i].contains(s).then_some(s)) {
            return Err(EngineError::Config(format!("source {} listed twice", dup.display())));
        }
        Ok(())
    }
}

pub fn load() -> Args {
    // Pastikan .env dibaca sebelum clap melihat env
    let _ = dotenv();
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sources_and_flags() {
        let args = Args::try_parse_from([
            "pnl_engine",
            "fills.gz",
            "prices.gz",
            "--report-format",
            "jsonl",
            "--stale-policy",
            "reject",
            "--report-interval-ms",
            "0",
        ])
        .unwrap();
        assert_eq!(args.sources, vec![PathBuf::from("fills.gz"), PathBuf::from("prices.gz")]);
        assert_eq!(args.report_format, ReportFormat::Jsonl);
        assert_eq!(args.stale_policy, StalePolicyArg::Reject);
        assert_eq!(args.stale_policy(), StalePolicy::Reject);
        assert_eq!(args.report_interval_ms, 0);
        args.validate().unwrap();
    }

    #[test]
    fn stale_policy_defaults_to_accept() {
        let args = Args::try_parse_from(["pnl_engine", "a.txt"]).unwrap();
        assert_eq!(args.stale_policy(), StalePolicy::default());
        assert!(Args::try_parse_from(["pnl_engine", "a.txt", "--stale-policy", "drop"]).is_err());
    }

    #[test]
    fn duplicate_source_is_rejected() {
        let args = Args::try_parse_from(["pnl_engine", "a.txt", "a.txt"]).unwrap();
        assert!(matches!(args.validate(), Err(EngineError::Config(_))));
    }
}
