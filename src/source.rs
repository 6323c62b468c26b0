// ===============================
// src/source.rs
// ===============================
//
// Line sources feeding the merger. A source only has to hand out "next line
// or end-of-stream"; a failed read must come back as Err, never as None.
//
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::info;

use crate::error::EngineError;

pub trait LineSource: Send {
    /// Next raw line without its line terminator, `Ok(None)` once exhausted.
    fn next_line(&mut self) -> io::Result<Option<String>>;

    fn name(&self) -> &str;
}

/// Any buffered reader (plain file, gzip stream, stdin, byte slice).
pub struct ReaderSource<R> {
    name: String,
    reader: R,
    buf: String,
}

impl<R: BufRead + Send> ReaderSource<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self { name: name.into(), reader, buf: String::new() }
    }
}

impl<R: BufRead + Send> LineSource for ReaderSource<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf.trim_end_matches(|c| c == '\n' || c == '\r').to_string()))
    }

    fn name(&self) -> &str { &self.name }
}

/// In-memory source; can be scripted to fail after its lines are consumed.
pub struct MemorySource {
    name: String,
    lines: VecDeque<io::Result<String>>,
}

impl MemorySource {
    pub fn new<I, S>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { name: name.into(), lines: lines.into_iter().map(|l| Ok(l.into())).collect() }
    }

    /// Append a read failure that surfaces once the preceding lines are consumed.
    pub fn then_fail(mut self, kind: io::ErrorKind, msg: &str) -> Self {
        self.lines.push_back(Err(io::Error::new(kind, msg.to_string())));
        self
    }
}

impl LineSource for MemorySource {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.lines.pop_front().transpose()
    }

    fn name(&self) -> &str { &self.name }
}

/// Open a file source; `*.gz` is decoded as (possibly multi-member) gzip.
pub fn open_file(path: &Path) -> Result<Box<dyn LineSource>, EngineError> {
    let file = File::open(path).map_err(|e| EngineError::Open { path: path.to_path_buf(), source: e })?;
    let name = path.display().to_string();
    let gz = path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("gz"));
    info!(source = %name, gzip = gz, "opened source");
    if gz {
        Ok(Box::new(ReaderSource::new(name, BufReader::new(MultiGzDecoder::new(file)))))
    } else {
        Ok(Box::new(ReaderSource::new(name, BufReader::new(file))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reader_source_strips_terminators() {
        let mut src = ReaderSource::new("mem", "P 1 A 1\r\nP 2 A 2\nP 3 A 3".as_bytes());
        assert_eq!(src.next_line().unwrap().as_deref(), Some("P 1 A 1"));
        assert_eq!(src.next_line().unwrap().as_deref(), Some("P 2 A 2"));
        assert_eq!(src.next_line().unwrap().as_deref(), Some("P 3 A 3"));
        assert_eq!(src.next_line().unwrap(), None);
    }

    #[test]
    fn memory_source_fails_after_lines() {
        let mut src = MemorySource::new("m", ["a"]).then_fail(io::ErrorKind::Other, "boom");
        assert_eq!(src.next_line().unwrap().as_deref(), Some("a"));
        assert!(src.next_line().is_err());
        assert_eq!(src.next_line().unwrap(), None);
    }

    #[test]
    fn opens_gzip_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.txt.gz");
        let mut enc = flate2::write::GzEncoder::new(File::create(&path).unwrap(), flate2::Compression::default());
        enc.write_all(b"P 100 ABC 10.00\n").unwrap();
        enc.finish().unwrap();

        let mut src = open_file(&path).unwrap();
        assert_eq!(src.next_line().unwrap().as_deref(), Some("P 100 ABC 10.00"));
        assert_eq!(src.next_line().unwrap(), None);
    }

    #[test]
    fn missing_file_is_open_error() {
        let err = open_file(Path::new("/definitely/not/here.txt")).err().unwrap();
        assert!(matches!(err, EngineError::Open { .. }));
    }
}
