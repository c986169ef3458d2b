//! Hit collectors driven by [`IndexSearcher`](crate::searcher::IndexSearcher).

use std::fmt;

use crate::DocId;

/// Tells the searcher whether to keep feeding hits to a collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectFlow {
    Continue,
    Stop,
}

pub trait Collector {
    /// Called before the hits of each segment, with the segment's first global doc id.
    fn set_segment(&mut self, doc_base: DocId);

    /// Receives a segment-local hit. Hits arrive in ascending order within a segment.
    fn collect(&mut self, doc: DocId) -> CollectFlow;
}

/// Whether [`TotalHits::value`] is the exact hit count or only a lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalHitsRelation {
    EqualTo,
    GreaterThanOrEqualTo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalHits {
    pub value: u64,
    pub relation: TotalHitsRelation,
}

impl TotalHits {
    pub fn exact(value: u64) -> TotalHits {
        TotalHits {
            value,
            relation: TotalHitsRelation::EqualTo,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.relation == TotalHitsRelation::EqualTo
    }
}

impl fmt::Display for TotalHits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.relation {
            TotalHitsRelation::EqualTo => write!(f, "{}", self.value),
            TotalHitsRelation::GreaterThanOrEqualTo => write!(f, ">={}", self.value),
        }
    }
}

/// Result of a [`TopDocsCollector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopDocs {
    pub total_hits: TotalHits,
    /// Global ids of the retained hits, in collection order.
    pub docs: Vec<DocId>,
}

/// Retains the first `num_hits` hits; all hits score the same, so the first ones
/// collected are the top ones.
///
/// Hits are counted exactly while the queue has room or the count is below
/// `total_hits_threshold`. Once the queue is full and the threshold is reached,
/// the next hit ends the search and the reported total becomes a lower bound.
/// To get an exact count of up to `n` hits, both parameters must be at least `n`.
#[derive(Debug)]
pub struct TopDocsCollector {
    num_hits: usize,
    total_hits_threshold: u64,
    doc_base: DocId,
    docs: Vec<DocId>,
    total: u64,
    relation: TotalHitsRelation,
}

impl TopDocsCollector {
    pub fn new(num_hits: usize, total_hits_threshold: u64) -> TopDocsCollector {
        TopDocsCollector {
            num_hits,
            total_hits_threshold,
            doc_base: 0,
            docs: Vec::with_capacity(num_hits.min(1 << 16)),
            total: 0,
            relation: TotalHitsRelation::EqualTo,
        }
    }

    pub fn total_hits(&self) -> TotalHits {
        TotalHits {
            value: self.total,
            relation: self.relation,
        }
    }

    pub fn top_docs(self) -> TopDocs {
        TopDocs {
            total_hits: self.total_hits(),
            docs: self.docs,
        }
    }
}

impl Collector for TopDocsCollector {
    fn set_segment(&mut self, doc_base: DocId) {
        self.doc_base = doc_base;
    }

    fn collect(&mut self, doc: DocId) -> CollectFlow {
        self.total += 1;
        if self.docs.len() < self.num_hits {
            self.docs.push(self.doc_base + doc);
            CollectFlow::Continue
        } else if self.total > self.total_hits_threshold {
            self.relation = TotalHitsRelation::GreaterThanOrEqualTo;
            CollectFlow::Stop
        } else {
            CollectFlow::Continue
        }
    }
}

/// Counts every hit exactly and retains nothing.
#[derive(Debug, Default)]
pub struct CountCollector {
    count: u64,
}

impl CountCollector {
    pub fn new() -> CountCollector {
        CountCollector::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Collector for CountCollector {
    fn set_segment(&mut self, _doc_base: DocId) {}

    fn collect(&mut self, _doc: DocId) -> CollectFlow {
        self.count += 1;
        CollectFlow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(collector: &mut impl Collector, segments: &[(DocId, u32)]) -> u64 {
        let mut fed = 0;
        for &(base, hits) in segments {
            collector.set_segment(base);
            for doc in 0..hits {
                fed += 1;
                if collector.collect(doc) == CollectFlow::Stop {
                    return fed;
                }
            }
        }
        fed
    }

    #[test]
    fn test_top_docs_exact_at_capacity() {
        let mut collector = TopDocsCollector::new(5, 5);
        assert_eq!(feed(&mut collector, &[(0, 3), (10, 2)]), 5);
        let top = collector.top_docs();
        assert_eq!(top.total_hits, TotalHits::exact(5));
        assert_eq!(top.docs, vec![0, 1, 2, 10, 11]);
    }

    #[test]
    fn test_top_docs_lower_bound_when_undersized() {
        let mut collector = TopDocsCollector::new(2, 2);
        assert_eq!(feed(&mut collector, &[(0, 10)]), 3);
        let total = collector.total_hits();
        assert_eq!(total.value, 3);
        assert_eq!(total.relation, TotalHitsRelation::GreaterThanOrEqualTo);
        assert!(!total.is_exact());
        assert_eq!(total.to_string(), ">=3");
    }

    #[test]
    fn test_top_docs_counts_past_capacity_up_to_threshold() {
        let mut collector = TopDocsCollector::new(1, 4);
        assert_eq!(feed(&mut collector, &[(0, 3)]), 3);
        let top = collector.top_docs();
        assert_eq!(top.total_hits, TotalHits::exact(3));
        assert_eq!(top.docs, vec![0]);

        let mut collector = TopDocsCollector::new(0, 0);
        assert_eq!(feed(&mut collector, &[]), 0);
        assert_eq!(collector.total_hits(), TotalHits::exact(0));
    }

    #[test]
    fn test_count_collector() {
        let mut collector = CountCollector::new();
        assert_eq!(feed(&mut collector, &[(0, 7), (7, 0), (7, 5)]), 12);
        assert_eq!(collector.count(), 12);
    }
}
