use std::{collections::BTreeMap, sync::Arc};

use ahash::AHashMap;

use keyprobe_common::{Result, verify_data};
use keyprobe_io::ReadAt;

use crate::{
    DocId, checksum,
    document::{FieldKind, StoredDocument},
    segment::{
        column::{KeywordColumn, PointColumn, SortedBytesColumn, SortedNumericColumn, StoredColumn},
        format::{SEGMENT_MAGIC, TRAILER_SIZE, Trailer, read_directory},
    },
};

/// Chunk size used when streaming a segment file through the checksum.
const VERIFY_CHUNK_SIZE: u64 = 1024 * 1024;

/// Read-only view of one segment.
///
/// Searchable columns are decoded into memory when the segment is opened; stored
/// values stay on disk and are read on demand.
pub struct SegmentReader {
    segment_id: u64,
    doc_count: u32,
    keyword: AHashMap<String, KeywordColumn>,
    sorted_bytes: AHashMap<String, SortedBytesColumn>,
    sorted_numeric: AHashMap<String, SortedNumericColumn>,
    points: AHashMap<String, PointColumn>,
    stored: BTreeMap<String, StoredColumn>,
}

impl SegmentReader {
    /// Opens a segment, verifying its checksum and decoding its column directory.
    pub fn open(segment_id: u64, file: Arc<dyn ReadAt>) -> Result<SegmentReader> {
        let size = file.size()?;
        verify_data!(segment_size, size >= SEGMENT_MAGIC.len() as u64 + TRAILER_SIZE);

        let trailer = Trailer::decode(&file.read_at(size - TRAILER_SIZE..size)?)?;
        Self::verify_checksum(file.as_ref(), size - 12, trailer.checksum)?;

        let magic = file.read_at(0..SEGMENT_MAGIC.len() as u64)?;
        verify_data!(segment_magic, magic.as_slice() == SEGMENT_MAGIC);
        verify_data!(
            directory_offset,
            trailer.directory_offset >= SEGMENT_MAGIC.len() as u64
                && trailer.directory_offset <= size - TRAILER_SIZE
        );
        let directory = file.read_at(trailer.directory_offset..size - TRAILER_SIZE)?;
        let entries = read_directory(&directory, trailer.directory_offset)?;

        let doc_count = trailer.doc_count;
        let mut reader = SegmentReader {
            segment_id,
            doc_count,
            keyword: AHashMap::new(),
            sorted_bytes: AHashMap::new(),
            sorted_numeric: AHashMap::new(),
            points: AHashMap::new(),
            stored: BTreeMap::new(),
        };
        for entry in entries {
            verify_data!(column_offset, entry.offset >= SEGMENT_MAGIC.len() as u64);
            let range = entry.offset..entry.offset + entry.len;
            if entry.kind == FieldKind::Stored {
                let column = StoredColumn::open(Arc::clone(&file), range, doc_count)?;
                reader.stored.insert(entry.name, column);
                continue;
            }
            let payload = file.read_at(range)?;
            match entry.kind {
                FieldKind::Keyword => {
                    let column = KeywordColumn::decode(&payload, doc_count)?;
                    reader.keyword.insert(entry.name, column);
                }
                FieldKind::SortedBytes => {
                    let column = SortedBytesColumn::decode(&payload, doc_count)?;
                    reader.sorted_bytes.insert(entry.name, column);
                }
                FieldKind::SortedNumeric => {
                    let column = SortedNumericColumn::decode(&payload, doc_count)?;
                    reader.sorted_numeric.insert(entry.name, column);
                }
                FieldKind::LongPoint => {
                    let column = PointColumn::decode(&payload, doc_count)?;
                    reader.points.insert(entry.name, column);
                }
                FieldKind::Stored => unreachable!("stored columns are opened above"),
            }
        }
        log::debug!(
            "opened segment {segment_id:x}: {doc_count} docs, {size} bytes"
        );
        Ok(reader)
    }

    fn verify_checksum(file: &dyn ReadAt, covered: u64, expected: u32) -> Result<()> {
        let mut hasher = checksum::Hasher::new();
        let mut pos = 0;
        while pos < covered {
            let end = (pos + VERIFY_CHUNK_SIZE).min(covered);
            let chunk = file.read_at(pos..end)?;
            verify_data!(segment_size, chunk.len() as u64 == end - pos);
            hasher.update(&chunk);
            pos = end;
        }
        checksum::validate(hasher.finish(), expected, "segment")
    }

    pub fn segment_id(&self) -> u64 {
        self.segment_id
    }

    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    pub fn keyword(&self, field: &str) -> Option<&KeywordColumn> {
        self.keyword.get(field)
    }

    pub fn sorted_bytes(&self, field: &str) -> Option<&SortedBytesColumn> {
        self.sorted_bytes.get(field)
    }

    pub fn sorted_numeric(&self, field: &str) -> Option<&SortedNumericColumn> {
        self.sorted_numeric.get(field)
    }

    pub fn points(&self, field: &str) -> Option<&PointColumn> {
        self.points.get(field)
    }

    /// Reads all stored values of a segment-local document.
    pub fn document(&self, doc: DocId) -> Result<StoredDocument> {
        let mut document = StoredDocument::default();
        for (name, column) in &self.stored {
            for value in column.values(doc)? {
                document.push(name, value);
            }
        }
        Ok(document)
    }
}
