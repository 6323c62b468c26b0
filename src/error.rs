// ===============================
// src/error.rs
// ===============================
use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Where a raw record came from. Both parts are unknown when a line is parsed standalone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordOrigin {
    pub source_index: Option<usize>,
    pub line_no: Option<u64>,
}

impl fmt::Display for RecordOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.source_index, self.line_no) {
            (Some(s), Some(l)) => write!(f, "source #{s} line {l}"),
            (Some(s), None) => write!(f, "source #{s}"),
            (None, Some(l)) => write!(f, "line {l}"),
            (None, None) => f.write_str("input"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed record at {origin}: {reason} ({line:?})")]
    MalformedRecord { origin: RecordOrigin, line: String, reason: String },

    #[error("read failure on source #{source_index}")]
    SourceRead {
        source_index: usize,
        #[source]
        source: io::Error,
    },

    #[error("invalid side {side:?} in fill for {ticker}")]
    InvalidSide { ticker: String, side: String },

    #[error("decimal overflow while applying event to {ticker}")]
    Overflow { ticker: String },

    #[error("decimal result for {ticker} needs more than 28 fractional digits")]
    PrecisionLoss { ticker: String },

    #[error("cannot open source {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config: {0}")]
    Config(String),

    #[error("engine worker aborted: {0}")]
    WorkerAborted(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl EngineError {
    pub fn malformed(line: &str, reason: impl Into<String>) -> Self {
        EngineError::MalformedRecord {
            origin: RecordOrigin::default(),
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    /// Tag a parse failure with its source position; other variants pass through.
    pub fn at(self, source_index: usize, line_no: u64) -> Self {
        match self {
            EngineError::MalformedRecord { line, reason, .. } => EngineError::MalformedRecord {
                origin: RecordOrigin { source_index: Some(source_index), line_no: Some(line_no) },
                line,
                reason,
            },
            other => other,
        }
    }

    // label untuk metrics RUN_FAILURES
    pub fn label(&self) -> &'static str {
        match self {
            EngineError::MalformedRecord { .. } => "malformed_record",
            EngineError::SourceRead { .. } => "source_read",
            EngineError::InvalidSide { .. } => "invalid_side",
            EngineError::Overflow { .. } => "overflow",
            EngineError::PrecisionLoss { .. } => "precision_loss",
            EngineError::Open { .. } => "open",
            EngineError::Config(_) => "config",
            EngineError::WorkerAborted(_) => "worker_aborted",
            EngineError::Io(_) => "io",
        }
    }
}
