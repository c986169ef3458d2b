//! Queries and the document cursors they produce.
//!
//! A [`Query`] is evaluated one segment at a time: for every segment it yields a
//! [`DocSet`], a forward-only cursor over the ascending segment-local ids of the
//! matching documents. All matches carry the same (constant) score.

use std::fmt::Debug;

use keyprobe_common::Result;

use crate::{DocId, segment::SegmentReader};

mod docset;
mod match_all;
mod point;
mod sorted_set;
mod term;

pub use docset::{AllDocSet, BitmapDocSet, EmptyDocSet, PredicateDocSet, VecDocSet};
pub use match_all::MatchAllQuery;
pub use point::PointRangeQuery;
pub use sorted_set::{SortedBytesSetQuery, SortedNumericSetQuery};
pub use term::{TermQuery, TermSetQuery};

/// Sentinel returned by an exhausted [`DocSet`].
pub const TERMINATED: DocId = DocId::MAX;

/// Forward-only cursor over sorted document ids.
///
/// A freshly created doc set is already positioned on its first document (or on
/// [`TERMINATED`] when empty).
pub trait DocSet {
    /// Current document id, or [`TERMINATED`] if exhausted.
    fn doc(&self) -> DocId;

    /// Advances to the next document. Returns the new id or [`TERMINATED`].
    fn advance(&mut self) -> DocId;

    /// Moves to the first document `>= target`.
    fn seek(&mut self, target: DocId) -> DocId {
        let mut doc = self.doc();
        while doc < target {
            doc = self.advance();
        }
        doc
    }

    /// Upper bound on the number of remaining documents.
    fn size_hint(&self) -> u32;
}

impl DocSet for Box<dyn DocSet + '_> {
    #[inline]
    fn doc(&self) -> DocId {
        (**self).doc()
    }

    #[inline]
    fn advance(&mut self) -> DocId {
        (**self).advance()
    }

    #[inline]
    fn seek(&mut self, target: DocId) -> DocId {
        (**self).seek(target)
    }

    #[inline]
    fn size_hint(&self) -> u32 {
        (**self).size_hint()
    }
}

pub trait Query: Debug {
    /// Creates the cursor over the documents of `segment` matching this query.
    fn doc_set<'a>(&'a self, segment: &'a SegmentReader) -> Result<Box<dyn DocSet + 'a>>;
}

impl<Q: Query + ?Sized> Query for Box<Q> {
    fn doc_set<'a>(&'a self, segment: &'a SegmentReader) -> Result<Box<dyn DocSet + 'a>> {
        (**self).doc_set(segment)
    }
}

/// Drains a doc set into a vector. Mostly useful in tests.
pub fn collect_docs(mut docs: impl DocSet) -> Vec<DocId> {
    let mut result = Vec::with_capacity(docs.size_hint() as usize);
    let mut doc = docs.doc();
    while doc != TERMINATED {
        result.push(doc);
        doc = docs.advance();
    }
    result
}
