use std::borrow::Cow;

use roaring::RoaringBitmap;

use crate::{
    DocId,
    query::{DocSet, TERMINATED},
};

/// Doc set with no documents.
pub struct EmptyDocSet;

impl DocSet for EmptyDocSet {
    fn doc(&self) -> DocId {
        TERMINATED
    }

    fn advance(&mut self) -> DocId {
        TERMINATED
    }

    fn seek(&mut self, _target: DocId) -> DocId {
        TERMINATED
    }

    fn size_hint(&self) -> u32 {
        0
    }
}

/// Every document of a segment, `0..max_doc`.
pub struct AllDocSet {
    doc: DocId,
    max_doc: DocId,
}

impl AllDocSet {
    pub fn new(max_doc: DocId) -> AllDocSet {
        AllDocSet { doc: 0, max_doc }
    }
}

impl DocSet for AllDocSet {
    fn doc(&self) -> DocId {
        if self.doc < self.max_doc {
            self.doc
        } else {
            TERMINATED
        }
    }

    fn advance(&mut self) -> DocId {
        if self.doc < self.max_doc {
            self.doc += 1;
        }
        self.doc()
    }

    fn seek(&mut self, target: DocId) -> DocId {
        self.doc = self.doc.max(target.min(self.max_doc));
        self.doc()
    }

    fn size_hint(&self) -> u32 {
        self.max_doc - self.doc.min(self.max_doc)
    }
}

/// Doc set over a sorted, duplicate-free list of ids, borrowed (postings) or owned.
pub struct VecDocSet<'a> {
    docs: Cow<'a, [DocId]>,
    pos: usize,
}

impl<'a> VecDocSet<'a> {
    pub fn new(docs: impl Into<Cow<'a, [DocId]>>) -> VecDocSet<'a> {
        let docs = docs.into();
        debug_assert!(docs.windows(2).all(|w| w[0] < w[1]));
        VecDocSet { docs, pos: 0 }
    }
}

impl DocSet for VecDocSet<'_> {
    #[inline]
    fn doc(&self) -> DocId {
        self.docs.get(self.pos).copied().unwrap_or(TERMINATED)
    }

    #[inline]
    fn advance(&mut self) -> DocId {
        if self.pos < self.docs.len() {
            self.pos += 1;
        }
        self.doc()
    }

    fn seek(&mut self, target: DocId) -> DocId {
        self.pos += self.docs[self.pos..].partition_point(|&doc| doc < target);
        self.doc()
    }

    fn size_hint(&self) -> u32 {
        (self.docs.len() - self.pos) as u32
    }
}

/// Doc set over the members of a Roaring bitmap.
pub struct BitmapDocSet {
    iter: roaring::bitmap::IntoIter,
    doc: DocId,
    remaining: u32,
}

impl BitmapDocSet {
    pub fn new(bitmap: RoaringBitmap) -> BitmapDocSet {
        let remaining = bitmap.len() as u32;
        let mut iter = bitmap.into_iter();
        let doc = iter.next().unwrap_or(TERMINATED);
        BitmapDocSet {
            iter,
            doc,
            remaining,
        }
    }
}

impl DocSet for BitmapDocSet {
    fn doc(&self) -> DocId {
        self.doc
    }

    fn advance(&mut self) -> DocId {
        if self.doc != TERMINATED {
            self.remaining -= 1;
            self.doc = self.iter.next().unwrap_or(TERMINATED);
        }
        self.doc
    }

    fn size_hint(&self) -> u32 {
        self.remaining
    }
}

/// Scans `0..max_doc` and yields the documents accepted by a per-document predicate.
///
/// This is how doc-value (column) queries are evaluated: there is no inverted
/// structure to walk, so every document's value is tested.
pub struct PredicateDocSet<F> {
    doc: DocId,
    max_doc: DocId,
    predicate: F,
}

impl<F: Fn(DocId) -> bool> PredicateDocSet<F> {
    pub fn new(max_doc: DocId, predicate: F) -> PredicateDocSet<F> {
        let mut docs = PredicateDocSet {
            doc: 0,
            max_doc,
            predicate,
        };
        docs.doc = docs.next_match(0);
        docs
    }

    fn next_match(&self, mut doc: DocId) -> DocId {
        while doc < self.max_doc {
            if (self.predicate)(doc) {
                return doc;
            }
            doc += 1;
        }
        TERMINATED
    }
}

impl<F: Fn(DocId) -> bool> DocSet for PredicateDocSet<F> {
    fn doc(&self) -> DocId {
        self.doc
    }

    fn advance(&mut self) -> DocId {
        if self.doc != TERMINATED {
            self.doc = self.next_match(self.doc + 1);
        }
        self.doc
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if self.doc < target {
            self.doc = self.next_match(target);
        }
        self.doc
    }

    fn size_hint(&self) -> u32 {
        self.max_doc.saturating_sub(self.doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::collect_docs;

    #[test]
    fn test_vec_doc_set_seek() {
        let postings = [1, 4, 9, 16, 25];
        let mut docs = VecDocSet::new(postings.as_slice());
        assert_eq!(docs.doc(), 1);
        assert_eq!(docs.size_hint(), 5);
        assert_eq!(docs.seek(5), 9);
        assert_eq!(docs.seek(9), 9);
        assert_eq!(docs.advance(), 16);
        assert_eq!(docs.seek(100), TERMINATED);
        assert_eq!(docs.advance(), TERMINATED);
        assert_eq!(docs.size_hint(), 0);

        assert_eq!(collect_docs(VecDocSet::new(Vec::<DocId>::new())), Vec::<DocId>::new());
    }

    #[test]
    fn test_bitmap_doc_set() {
        let bitmap: RoaringBitmap = [70_000u32, 3, 12].into_iter().collect();
        let mut docs = BitmapDocSet::new(bitmap);
        assert_eq!(docs.size_hint(), 3);
        assert_eq!(docs.seek(4), 12);
        assert_eq!(docs.size_hint(), 2);
        assert_eq!(docs.advance(), 70_000);
        assert_eq!(docs.advance(), TERMINATED);
        assert_eq!(docs.advance(), TERMINATED);
        assert_eq!(docs.size_hint(), 0);
    }

    #[test]
    fn test_predicate_and_all_doc_sets() {
        let even = PredicateDocSet::new(10, |doc| doc % 2 == 0);
        assert_eq!(collect_docs(even), vec![0, 2, 4, 6, 8]);

        let mut none = PredicateDocSet::new(10, |_| false);
        assert_eq!(none.doc(), TERMINATED);
        assert_eq!(none.advance(), TERMINATED);

        let mut all = AllDocSet::new(3);
        assert_eq!(all.size_hint(), 3);
        assert_eq!(all.seek(2), 2);
        assert_eq!(all.advance(), TERMINATED);
        assert_eq!(collect_docs(AllDocSet::new(0)), Vec::<DocId>::new());
        assert_eq!(collect_docs(EmptyDocSet), Vec::<DocId>::new());
    }
}
