use keyprobe_common::{Result, error::Error};

use crate::{
    query::{DocSet, EmptyDocSet, Query, VecDocSet},
    segment::SegmentReader,
};

/// Documents with a point value in `lower..=upper`.
#[derive(Debug, Clone)]
pub struct PointRangeQuery {
    field: String,
    lower: i64,
    upper: i64,
}

impl PointRangeQuery {
    pub fn new(field: impl Into<String>, lower: i64, upper: i64) -> Result<PointRangeQuery> {
        if lower > upper {
            return Err(Error::invalid_arg(
                "range",
                format!("lower bound {lower} exceeds upper bound {upper}"),
            ));
        }
        Ok(PointRangeQuery {
            field: field.into(),
            lower,
            upper,
        })
    }

    /// Matches a single point value.
    pub fn exact(field: impl Into<String>, value: i64) -> PointRangeQuery {
        PointRangeQuery {
            field: field.into(),
            lower: value,
            upper: value,
        }
    }

    pub fn bounds(&self) -> (i64, i64) {
        (self.lower, self.upper)
    }
}

impl Query for PointRangeQuery {
    fn doc_set<'a>(&'a self, segment: &'a SegmentReader) -> Result<Box<dyn DocSet + 'a>> {
        let Some(points) = segment.points(&self.field) else {
            return Ok(Box::new(EmptyDocSet));
        };
        let mut docs = points.docs_in_range(self.lower, self.upper).to_vec();
        if docs.is_empty() {
            return Ok(Box::new(EmptyDocSet));
        }
        // Points come back in value order; a document may also hold several of them.
        docs.sort_unstable();
        docs.dedup();
        Ok(Box::new(VecDocSet::new(docs)))
    }
}
