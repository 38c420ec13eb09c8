//! Typed collection queries over the unordered world state.
//!
//! The world state offers no secondary index, so every query is a full
//! linear scan. Values that fail to decode are skipped with a warning
//! rather than failing the query; errors from the accessor itself are
//! returned.

use crate::error::CoreResult;
use crate::record::{Record, RecordCodec};
use camledger_state::WorldState;
use tracing::{debug, warn};

/// Counters from one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Entries visited.
    pub visited: usize,
    /// Entries in the target namespace that failed to decode.
    pub skipped: usize,
    /// Records returned.
    pub matched: usize,
}

/// Full-scan reader of typed records.
pub struct Scanner<'a, S: WorldState + ?Sized> {
    state: &'a S,
    warn_threshold: usize,
}

impl<'a, S: WorldState + ?Sized> Scanner<'a, S> {
    /// Creates a scanner; scans visiting more than `warn_threshold`
    /// entries log a warning.
    pub fn new(state: &'a S, warn_threshold: usize) -> Self {
        Self {
            state,
            warn_threshold,
        }
    }

    /// Every record of kind `R`, in scan order.
    ///
    /// **Warning**: This is a full scan of the world state.
    pub fn scan_all<R: RecordCodec>(&self) -> CoreResult<Vec<R>> {
        self.scan_where(|_: &R| true)
    }

    /// Every record of kind `R` accepted by `filter`, in scan order.
    ///
    /// **Warning**: This is a full scan of the world state.
    pub fn scan_where<R, F>(&self, filter: F) -> CoreResult<Vec<R>>
    where
        R: RecordCodec,
        F: Fn(&R) -> bool,
    {
        self.scan_with_stats(filter).map(|(records, _)| records)
    }

    /// Like [`Scanner::scan_where`], also returning counters.
    pub fn scan_with_stats<R, F>(&self, filter: F) -> CoreResult<(Vec<R>, ScanStats)>
    where
        R: RecordCodec,
        F: Fn(&R) -> bool,
    {
        let namespace = R::DOC_TYPE.namespace();
        let mut stats = ScanStats::default();
        let mut out = Vec::new();

        for entry in self.state.scan_all()? {
            let (key, value) = entry?;
            stats.visited += 1;
            if !namespace.contains(&key) || value.is_empty() {
                continue;
            }

            let record = match Record::decode(&value) {
                Ok(record) => record,
                Err(err) => {
                    stats.skipped += 1;
                    warn!(
                        key = %String::from_utf8_lossy(&key),
                        error = %err,
                        "skipping undecodable record"
                    );
                    continue;
                }
            };
            let found = record.doc_type();
            let Some(record) = R::from_record(record) else {
                stats.skipped += 1;
                warn!(
                    key = %String::from_utf8_lossy(&key),
                    expected = %R::DOC_TYPE,
                    found = %found,
                    "skipping record of unexpected kind"
                );
                continue;
            };
            if filter(&record) {
                out.push(record);
            }
        }

        stats.matched = out.len();
        if stats.visited > self.warn_threshold {
            warn!(
                visited = stats.visited,
                threshold = self.warn_threshold,
                "full scan exceeded size threshold"
            );
        }
        debug!(
            doc_type = %R::DOC_TYPE,
            visited = stats.visited,
            skipped = stats.skipped,
            matched = stats.matched,
            "scan complete"
        );
        Ok((out, stats))
    }
}
