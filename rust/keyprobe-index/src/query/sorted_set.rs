use ahash::AHashSet;
use roaring::RoaringBitmap;

use keyprobe_common::Result;

use crate::{
    query::{DocSet, EmptyDocSet, PredicateDocSet, Query},
    segment::{SegmentReader, format::MISSING_ORD},
};

/// Set membership over a sorted-bytes column.
///
/// The candidate terms are sorted and deduplicated once. Per segment they are
/// resolved to dictionary ordinals in a single forward walk, and then every
/// document's ordinal is tested against the resolved set.
#[derive(Debug, Clone)]
pub struct SortedBytesSetQuery {
    field: String,
    terms: Vec<Vec<u8>>,
}

impl SortedBytesSetQuery {
    pub fn new<T: Into<Vec<u8>>>(
        field: impl Into<String>,
        terms: impl IntoIterator<Item = T>,
    ) -> SortedBytesSetQuery {
        let mut terms = terms.into_iter().map(Into::into).collect::<Vec<_>>();
        terms.sort_unstable();
        terms.dedup();
        SortedBytesSetQuery {
            field: field.into(),
            terms,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Number of distinct candidate terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Query for SortedBytesSetQuery {
    fn doc_set<'a>(&'a self, segment: &'a SegmentReader) -> Result<Box<dyn DocSet + 'a>> {
        let Some(column) = segment.sorted_bytes(&self.field) else {
            return Ok(Box::new(EmptyDocSet));
        };
        let dictionary = column.dictionary();
        let mut ords = RoaringBitmap::new();
        let mut ord = 0;
        for term in &self.terms {
            ord = dictionary.seek_ceil(ord, term);
            if ord == dictionary.len() {
                break;
            }
            if dictionary.term(ord) == term.as_slice() {
                ords.insert(ord as u32);
            }
        }
        if ords.is_empty() {
            return Ok(Box::new(EmptyDocSet));
        }
        let doc_ords = column.ords();
        Ok(Box::new(PredicateDocSet::new(segment.doc_count(), move |doc| {
            let ord = doc_ords[doc as usize];
            ord != MISSING_ORD && ords.contains(ord)
        })))
    }
}

/// Set membership over a sorted-numeric column.
#[derive(Debug, Clone)]
pub struct SortedNumericSetQuery {
    field: String,
    values: AHashSet<i64>,
    bounds: Option<(i64, i64)>,
}

impl SortedNumericSetQuery {
    pub fn new(field: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        let values = values.into_iter().collect::<AHashSet<_>>();
        let bounds = values
            .iter()
            .fold(None, |bounds: Option<(i64, i64)>, &v| match bounds {
                Some((min, max)) => Some((min.min(v), max.max(v))),
                None => Some((v, v)),
            });
        SortedNumericSetQuery {
            field: field.into(),
            values,
            bounds,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Number of distinct candidate values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Query for SortedNumericSetQuery {
    fn doc_set<'a>(&'a self, segment: &'a SegmentReader) -> Result<Box<dyn DocSet + 'a>> {
        let (Some(column), Some((min, max))) = (segment.sorted_numeric(&self.field), self.bounds)
        else {
            return Ok(Box::new(EmptyDocSet));
        };
        let values = &self.values;
        Ok(Box::new(PredicateDocSet::new(segment.doc_count(), move |doc| {
            column
                .value(doc)
                .is_some_and(|v| v >= min && v <= max && values.contains(&v))
        })))
    }
}
