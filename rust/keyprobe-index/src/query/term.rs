use roaring::RoaringBitmap;

use keyprobe_common::Result;

use crate::{
    query::{BitmapDocSet, DocSet, EmptyDocSet, Query, VecDocSet},
    segment::SegmentReader,
};

/// Documents whose keyword field contains exactly `term`.
#[derive(Debug, Clone)]
pub struct TermQuery {
    field: String,
    term: Vec<u8>,
}

impl TermQuery {
    pub fn new(field: impl Into<String>, term: impl Into<Vec<u8>>) -> TermQuery {
        TermQuery {
            field: field.into(),
            term: term.into(),
        }
    }
}

impl Query for TermQuery {
    fn doc_set<'a>(&'a self, segment: &'a SegmentReader) -> Result<Box<dyn DocSet + 'a>> {
        let postings = segment
            .keyword(&self.field)
            .and_then(|column| column.postings_for(&self.term));
        Ok(match postings {
            Some(docs) => Box::new(VecDocSet::new(docs)),
            None => Box::new(EmptyDocSet),
        })
    }
}

/// Documents whose keyword field contains any of the given terms.
///
/// Postings of all matching terms are merged into one bitmap per segment, so the
/// cost grows with the number of matching postings rather than with segment size.
#[derive(Debug, Clone)]
pub struct TermSetQuery {
    field: String,
    terms: Vec<Vec<u8>>,
}

impl TermSetQuery {
    pub fn new<T: Into<Vec<u8>>>(
        field: impl Into<String>,
        terms: impl IntoIterator<Item = T>,
    ) -> TermSetQuery {
        let mut terms = terms.into_iter().map(Into::into).collect::<Vec<_>>();
        terms.sort_unstable();
        terms.dedup();
        TermSetQuery {
            field: field.into(),
            terms,
        }
    }

    pub fn terms(&self) -> &[Vec<u8>] {
        &self.terms
    }
}

impl Query for TermSetQuery {
    fn doc_set<'a>(&'a self, segment: &'a SegmentReader) -> Result<Box<dyn DocSet + 'a>> {
        let Some(column) = segment.keyword(&self.field) else {
            return Ok(Box::new(EmptyDocSet));
        };
        let dictionary = column.terms();
        let mut docs = RoaringBitmap::new();
        let mut ord = 0;
        for term in &self.terms {
            ord = dictionary.seek_ceil(ord, term);
            if ord == dictionary.len() {
                break;
            }
            if dictionary.term(ord) == term.as_slice() {
                docs.extend(column.postings(ord as u32).iter().copied());
            }
        }
        Ok(Box::new(BitmapDocSet::new(docs)))
    }
}
