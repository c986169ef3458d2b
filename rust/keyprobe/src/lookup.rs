use std::{path::Path, time::Duration};

use keyprobe_common::{Result, error::Error};
use keyprobe_index::{FsDirectory, IndexReader, IndexSearcher, TopDocsCollector, TotalHits};

use crate::{codec::KeyCodec, stopwatch::Stopwatch};

#[derive(Debug, Clone, Copy)]
pub struct LookupOutcome {
    pub total_hits: TotalHits,
    /// Time from query construction until the collector reported its total.
    pub elapsed: Duration,
}

/// Counts the documents at `location` whose key is in `candidates`, using one
/// batched membership query.
///
/// The collector is sized to the candidate set for both its capacity and its exact
/// count threshold, so up to `candidates.len()` hits are counted exactly. Opening
/// and closing the index are outside the timed window.
pub fn lookup<C: KeyCodec + ?Sized>(
    location: &Path,
    candidates: Vec<C::Key>,
    codec: &C,
) -> Result<LookupOutcome> {
    if !location.is_dir() {
        return Err(Error::index_not_found(location.display().to_string()));
    }
    let directory = FsDirectory::open(location)?;
    let reader = IndexReader::open(&directory)?;
    let searcher = IndexSearcher::new(&reader);
    let capacity = candidates.len();
    let mut collector = TopDocsCollector::new(capacity, capacity as u64);

    let stopwatch = Stopwatch::start_new();
    let query = codec.membership_query(candidates);
    searcher.search(query.as_ref(), &mut collector)?;
    let total_hits = collector.total_hits();
    let elapsed = stopwatch.elapsed();

    drop(query);
    reader.close()?;
    Ok(LookupOutcome {
        total_hits,
        elapsed,
    })
}
