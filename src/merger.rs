// ===============================
// src/merger.rs (N-way ordered merge)
// ===============================
//
// Satu lookahead per source; kandidat disusun di BinaryHeap dengan key
// (class, timestamp, source_index):
//   - class: Price (0) < Fill (1) < Unknown (2). Price selalu duluan
//     sebelum Fill, apapun timestamp-nya.
//   - timestamp ascending dalam kelas yang sama.
//   - source_index memecah seri timestamp secara deterministik.
// Each source holds at most one buffered candidate, so the key is unique.
//
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::domain::{Event, EventKind};
use crate::error::EngineError;
use crate::parser::parse_line;
use crate::source::LineSource;

pub fn priority_class(kind: EventKind) -> u8 {
    match kind {
        EventKind::Price => 0,
        EventKind::Fill => 1,
        EventKind::Unknown => 2,
    }
}

/// Merge order of two buffered heads; `Less` means `a` is emitted first.
pub fn compare_candidates(a: &Event, a_source: usize, b: &Event, b_source: usize) -> Ordering {
    merge_key(a, a_source).cmp(&merge_key(b, b_source))
}

fn merge_key(ev: &Event, source: usize) -> (u8, i64, usize) {
    (priority_class(ev.kind()), ev.timestamp(), source)
}

struct Candidate {
    key: (u8, i64, usize),
    event: Event,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool { self.key == other.key }
}
impl Eq for Candidate {}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}
// reversed: BinaryHeap pops the largest
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering { other.key.cmp(&self.key) }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub name: String,
    pub lines_read: u64,
    pub events_emitted: u64,
    pub exhausted: bool,
}

struct Feed {
    source: Box<dyn LineSource>,
    stats: SourceStats,
}

pub struct StreamMerger {
    feeds: Vec<Feed>,
    heap: BinaryHeap<Candidate>,
    primed: bool,
    // failure hit while refilling after an event was already handed out
    deferred: Option<EngineError>,
    fused: bool,
}

impl StreamMerger {
    /// Source index (for tie-breaks and error reports) is the position in `sources`.
    pub fn new(sources: Vec<Box<dyn LineSource>>) -> Self {
        let feeds: Vec<Feed> = sources
            .into_iter()
            .map(|source| {
                let stats = SourceStats { name: source.name().to_string(), ..Default::default() };
                Feed { source, stats }
            })
            .collect();
        Self { heap: BinaryHeap::with_capacity(feeds.len()), feeds, primed: false, deferred: None, fused: false }
    }

    pub fn source_count(&self) -> usize { self.feeds.len() }

    pub fn source_stats(&self) -> Vec<SourceStats> {
        self.feeds.iter().map(|f| f.stats.clone()).collect()
    }

    /// Next event in merged order, `Ok(None)` at end of stream.
    ///
    /// A read or parse failure on a source is returned as `Err` and fuses the
    /// merger. If it happens while refilling behind an event that is being
    /// returned, that event is still delivered and the failure comes on the
    /// following call.
    pub fn next_event(&mut self) -> Result<Option<Event>, EngineError> {
        if self.fused {
            return Ok(None);
        }
        if let Some(err) = self.deferred.take() {
            self.fused = true;
            return Err(err);
        }
        if !self.primed {
            self.primed = true;
            for idx in 0..self.feeds.len() {
                if let Err(e) = self.refill(idx) {
                    self.fused = true;
                    return Err(e);
                }
            }
        }

        let Some(head) = self.heap.pop() else {
            self.fused = true;
            debug!("all sources drained");
            return Ok(None);
        };
        let idx = head.key.2;
        self.feeds[idx].stats.events_emitted += 1;
        if let Err(e) = self.refill(idx) {
            self.deferred = Some(e);
        }
        Ok(Some(head.event))
    }

    fn refill(&mut self, idx: usize) -> Result<(), EngineError> {
        let feed = &mut self.feeds[idx];
        if feed.stats.exhausted {
            return Ok(());
        }
        let line = match feed.source.next_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                feed.stats.exhausted = true;
                debug!(source = %feed.stats.name, lines = feed.stats.lines_read, "source exhausted");
                return Ok(());
            }
            Err(e) => {
                feed.stats.exhausted = true;
                return Err(EngineError::SourceRead { source_index: idx, source: e });
            }
        };
        feed.stats.lines_read += 1;
        // baris kosong juga malformed, sama seperti record dengan < 4 field
        let event = parse_line(&line).map_err(|e| e.at(idx, feed.stats.lines_read))?;
        self.heap.push(Candidate { key: merge_key(&event, idx), event });
        Ok(())
    }
}

impl Iterator for StreamMerger {
    type Item = Result<Event, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}
