//! Decoded column readers, one type per [`FieldKind`](crate::document::FieldKind).
//!
//! Payload layouts (little-endian):
//!
//! ```text
//! Keyword        := dictionary posting_offsets:u64[terms + 1] postings:u32[total]
//! SortedBytes    := dictionary ords:u32[doc_count]            (MISSING_ORD = no value)
//! SortedNumeric  := presence_len:u32 presence:roaring values:i64[doc_count]
//! LongPoint      := count:u32 values:i64[count] docs:u32[count]   (sorted by value, doc)
//! Stored         := count:u32 docs:u32[count] offsets:u64[count + 1] data
//! ```

use std::{ops::Range, sync::Arc};

use byteorder::{LE, ReadBytesExt};
use roaring::RoaringBitmap;

use keyprobe_common::{Result, error::Error, verify_data};
use keyprobe_io::ReadAt;

use crate::{
    DocId,
    segment::format::{
        MISSING_ORD, TermDictionary, read_i64_vec, read_u32_vec, read_u64_vec, truncated,
    },
};

/// Inverted index of an exact-match keyword field.
#[derive(Debug, Clone)]
pub struct KeywordColumn {
    terms: TermDictionary,
    posting_offsets: Vec<u64>,
    postings: Vec<DocId>,
}

impl KeywordColumn {
    pub fn decode(mut payload: &[u8], doc_count: u32) -> Result<KeywordColumn> {
        let terms = TermDictionary::read_from(&mut payload)?;
        let posting_offsets = read_u64_vec(&mut payload, terms.len() + 1, "posting offsets")?;
        verify_data!(posting_offsets, posting_offsets[0] == 0);
        verify_data!(
            posting_offsets,
            posting_offsets.windows(2).all(|w| w[0] < w[1])
        );
        let total = posting_offsets[terms.len()] as usize;
        let postings = read_u32_vec(&mut payload, total, "postings")?;
        verify_data!(keyword_column, payload.is_empty());
        verify_data!(postings, postings.iter().all(|&doc| doc < doc_count));
        Ok(KeywordColumn {
            terms,
            posting_offsets,
            postings,
        })
    }

    pub fn terms(&self) -> &TermDictionary {
        &self.terms
    }

    /// Ascending document ids containing the term with ordinal `ord`.
    pub fn postings(&self, ord: u32) -> &[DocId] {
        let ord = ord as usize;
        &self.postings[self.posting_offsets[ord] as usize..self.posting_offsets[ord + 1] as usize]
    }

    pub fn postings_for(&self, term: &[u8]) -> Option<&[DocId]> {
        self.terms.find(term).map(|ord| self.postings(ord))
    }
}

/// Single-valued byte column: sorted value dictionary plus one ordinal per document.
#[derive(Debug, Clone)]
pub struct SortedBytesColumn {
    dictionary: TermDictionary,
    ords: Vec<u32>,
}

impl SortedBytesColumn {
    pub fn decode(mut payload: &[u8], doc_count: u32) -> Result<SortedBytesColumn> {
        let dictionary = TermDictionary::read_from(&mut payload)?;
        let ords = read_u32_vec(&mut payload, doc_count as usize, "document ordinals")?;
        verify_data!(sorted_bytes_column, payload.is_empty());
        let term_count = dictionary.len() as u32;
        verify_data!(
            document_ordinals,
            ords.iter().all(|&ord| ord == MISSING_ORD || ord < term_count)
        );
        Ok(SortedBytesColumn { dictionary, ords })
    }

    pub fn dictionary(&self) -> &TermDictionary {
        &self.dictionary
    }

    /// Raw per-document ordinals, `MISSING_ORD` marking documents without a value.
    pub fn ords(&self) -> &[u32] {
        &self.ords
    }

    pub fn ord(&self, doc: DocId) -> Option<u32> {
        match self.ords[doc as usize] {
            MISSING_ORD => None,
            ord => Some(ord),
        }
    }

    pub fn value(&self, doc: DocId) -> Option<&[u8]> {
        self.ord(doc).map(|ord| self.dictionary.term(ord as usize))
    }
}

/// Single-valued signed 64-bit column.
#[derive(Debug, Clone)]
pub struct SortedNumericColumn {
    presence: RoaringBitmap,
    /// All documents have a value; the presence bitmap need not be consulted.
    dense: bool,
    values: Vec<i64>,
}

impl SortedNumericColumn {
    pub fn decode(mut payload: &[u8], doc_count: u32) -> Result<SortedNumericColumn> {
        let presence_len = payload
            .read_u32::<LE>()
            .map_err(truncated("presence length"))? as usize;
        verify_data!(presence_len, presence_len <= payload.len());
        let presence = RoaringBitmap::deserialize_from(&payload[..presence_len])
            .map_err(|e| Error::invalid_format(format!("presence bitmap: {e}")))?;
        payload = &payload[presence_len..];
        let values = read_i64_vec(&mut payload, doc_count as usize, "numeric values")?;
        verify_data!(sorted_numeric_column, payload.is_empty());
        verify_data!(
            presence,
            presence.max().is_none_or(|max| max < doc_count)
        );
        let dense = presence.len() == doc_count as u64;
        Ok(SortedNumericColumn {
            presence,
            dense,
            values,
        })
    }

    pub fn value(&self, doc: DocId) -> Option<i64> {
        if self.dense || self.presence.contains(doc) {
            Some(self.values[doc as usize])
        } else {
            None
        }
    }

    pub fn has_value(&self, doc: DocId) -> bool {
        self.dense || self.presence.contains(doc)
    }

    pub fn presence(&self) -> &RoaringBitmap {
        &self.presence
    }
}

/// Range-indexed 64-bit points, sorted by value and then by document.
#[derive(Debug, Clone)]
pub struct PointColumn {
    values: Vec<i64>,
    docs: Vec<DocId>,
}

impl PointColumn {
    pub fn decode(mut payload: &[u8], doc_count: u32) -> Result<PointColumn> {
        let count = payload.read_u32::<LE>().map_err(truncated("point count"))? as usize;
        let values = read_i64_vec(&mut payload, count, "point values")?;
        let docs = read_u32_vec(&mut payload, count, "point documents")?;
        verify_data!(point_column, payload.is_empty());
        verify_data!(point_order, values.windows(2).all(|w| w[0] <= w[1]));
        verify_data!(point_documents, docs.iter().all(|&doc| doc < doc_count));
        Ok(PointColumn { values, docs })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Documents whose point lies in `lower..=upper`, in value order (not document order).
    pub fn docs_in_range(&self, lower: i64, upper: i64) -> &[DocId] {
        if lower > upper {
            return &[];
        }
        let start = self.values.partition_point(|&v| v < lower);
        let end = self.values.partition_point(|&v| v <= upper);
        &self.docs[start..end]
    }
}

/// Stored values; the per-value index is decoded eagerly, the value bytes are read
/// on demand from the segment file.
pub struct StoredColumn {
    docs: Vec<DocId>,
    offsets: Vec<u64>,
    data_start: u64,
    file: Arc<dyn ReadAt>,
}

impl StoredColumn {
    /// Size of the stored column header for `count` values.
    pub fn header_len(count: usize) -> u64 {
        4 + 4 * count as u64 + 8 * (count as u64 + 1)
    }

    /// Decodes the stored column located at `range` of `file`.
    pub fn open(file: Arc<dyn ReadAt>, range: Range<u64>, doc_count: u32) -> Result<StoredColumn> {
        let count_bytes = file.read_at(range.start..range.start + 4)?;
        verify_data!(stored_count, count_bytes.len() == 4);
        let count = u32::from_le_bytes([count_bytes[0], count_bytes[1], count_bytes[2], count_bytes[3]])
            as usize;
        let header_end = range.start + Self::header_len(count);
        verify_data!(stored_header, header_end <= range.end);
        let header = file.read_at(range.start + 4..header_end)?;
        let mut input = header.as_slice();
        let docs = read_u32_vec(&mut input, count, "stored documents")?;
        let offsets = read_u64_vec(&mut input, count + 1, "stored offsets")?;
        verify_data!(stored_documents, docs.windows(2).all(|w| w[0] <= w[1]));
        verify_data!(stored_documents, docs.iter().all(|&doc| doc < doc_count));
        verify_data!(stored_offsets, offsets[0] == 0);
        verify_data!(stored_offsets, offsets.windows(2).all(|w| w[0] <= w[1]));
        verify_data!(stored_data, header_end + offsets[count] == range.end);
        Ok(StoredColumn {
            docs,
            offsets,
            data_start: header_end,
            file,
        })
    }

    /// Reads the values stored for `doc`, in insertion order.
    pub fn values(&self, doc: DocId) -> Result<Vec<Vec<u8>>> {
        let start = self.docs.partition_point(|&d| d < doc);
        let end = self.docs.partition_point(|&d| d <= doc);
        if start == end {
            return Ok(Vec::new());
        }
        let bytes = self.file.read_at(
            self.data_start + self.offsets[start]..self.data_start + self.offsets[end],
        )?;
        let base = self.offsets[start];
        Ok((start..end)
            .map(|i| {
                bytes[(self.offsets[i] - base) as usize..(self.offsets[i + 1] - base) as usize]
                    .to_vec()
            })
            .collect())
    }

    pub fn value_count(&self) -> usize {
        self.docs.len()
    }
}
