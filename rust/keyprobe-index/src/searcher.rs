use keyprobe_common::Result;

use crate::{
    collector::{CollectFlow, Collector, CountCollector, TopDocs, TopDocsCollector},
    query::{DocSet, Query, TERMINATED},
    reader::IndexReader,
};

/// Runs queries against every segment of an [`IndexReader`].
pub struct IndexSearcher<'a> {
    reader: &'a IndexReader,
}

impl<'a> IndexSearcher<'a> {
    pub fn new(reader: &'a IndexReader) -> IndexSearcher<'a> {
        IndexSearcher { reader }
    }

    pub fn reader(&self) -> &IndexReader {
        self.reader
    }

    /// Feeds every match of `query` to `collector`, segment by segment in doc order,
    /// until the collector asks to stop.
    pub fn search(&self, query: &dyn Query, collector: &mut dyn Collector) -> Result<()> {
        for segment in self.reader.segments() {
            collector.set_segment(segment.doc_base());
            let mut docs = query.doc_set(segment.reader())?;
            let mut doc = docs.doc();
            while doc != TERMINATED {
                if collector.collect(doc) == CollectFlow::Stop {
                    return Ok(());
                }
                doc = docs.advance();
            }
        }
        Ok(())
    }

    /// Exact number of documents matching `query`.
    pub fn count(&self, query: &dyn Query) -> Result<u64> {
        let mut collector = CountCollector::new();
        self.search(query, &mut collector)?;
        Ok(collector.count())
    }

    /// First `num_hits` matches, counting exactly up to `num_hits`.
    pub fn top_docs(&self, query: &dyn Query, num_hits: usize) -> Result<TopDocs> {
        let mut collector = TopDocsCollector::new(num_hits, num_hits as u64);
        self.search(query, &mut collector)?;
        Ok(collector.top_docs())
    }
}
