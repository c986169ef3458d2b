use keyprobe_common::Result;

use crate::{
    query::{AllDocSet, DocSet, Query},
    segment::SegmentReader,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchAllQuery;

impl Query for MatchAllQuery {
    fn doc_set<'a>(&'a self, segment: &'a SegmentReader) -> Result<Box<dyn DocSet + 'a>> {
        Ok(Box::new(AllDocSet::new(segment.doc_count())))
    }
}
