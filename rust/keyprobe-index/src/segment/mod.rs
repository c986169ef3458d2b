//! Immutable on-disk segments: the unit produced by one writer flush.

pub mod builder;
pub mod column;
pub mod format;
pub mod reader;

pub use builder::SegmentBuilder;
pub use reader::SegmentReader;

/// Identity and size of a committed segment, as recorded in the commit manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInfo {
    pub segment_id: u64,
    pub doc_count: u32,
}

impl SegmentInfo {
    pub fn file_name(&self) -> String {
        format::segment_file_name(self.segment_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use keyprobe_common::error::ErrorKind;
    use keyprobe_io::{FileReader, FileWriter, ReadAt};

    use super::*;
    use crate::document::{Document, Field};

    fn write_segment(path: &std::path::Path, docs: &[Document]) -> u64 {
        let mut builder = SegmentBuilder::new();
        for doc in docs {
            builder.add_document(doc).unwrap();
        }
        let mut out = FileWriter::create(path).unwrap();
        builder.write_to(&mut out).unwrap()
    }

    fn open_segment(path: &std::path::Path) -> keyprobe_common::Result<SegmentReader> {
        let file: Arc<dyn ReadAt> = Arc::new(FileReader::open(path).unwrap());
        SegmentReader::open(7, file)
    }

    fn sample_docs() -> Vec<Document> {
        vec![
            Document::new()
                .with_field(Field::keyword("uid", "k2", true))
                .with_field(Field::sorted_bytes("uid", "k2"))
                .with_field(Field::stored("payload", "first")),
            Document::new()
                .with_field(Field::long_point("num", 30))
                .with_field(Field::sorted_numeric("num", 30))
                .with_field(Field::stored("payload", "second")),
            Document::new()
                .with_field(Field::keyword("uid", "k1", true))
                .with_field(Field::sorted_bytes("uid", "k1"))
                .with_field(Field::long_point("num", -5))
                .with_field(Field::sorted_numeric("num", -5)),
        ]
    }

    #[test]
    fn test_segment_write_and_read() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join(format::segment_file_name(7));
        let written = write_segment(&path, &sample_docs());
        assert_eq!(written, std::fs::metadata(&path).unwrap().len());

        let segment = open_segment(&path).unwrap();
        assert_eq!(segment.segment_id(), 7);
        assert_eq!(segment.doc_count(), 3);

        let keyword = segment.keyword("uid").unwrap();
        assert_eq!(keyword.terms().len(), 2);
        assert_eq!(keyword.postings_for(b"k1"), Some([2].as_slice()));
        assert_eq!(keyword.postings_for(b"k2"), Some([0].as_slice()));
        assert_eq!(keyword.postings_for(b"k3"), None);

        let sorted = segment.sorted_bytes("uid").unwrap();
        assert_eq!(sorted.value(0), Some(b"k2".as_slice()));
        assert_eq!(sorted.value(1), None);
        assert_eq!(sorted.ord(2), Some(0));

        let numeric = segment.sorted_numeric("num").unwrap();
        assert_eq!(numeric.value(0), None);
        assert_eq!(numeric.value(1), Some(30));
        assert_eq!(numeric.value(2), Some(-5));

        let points = segment.points("num").unwrap();
        assert_eq!(points.docs_in_range(-10, 0), [2].as_slice());
        assert_eq!(points.docs_in_range(i64::MIN, i64::MAX).len(), 2);
        assert!(points.docs_in_range(31, 40).is_empty());

        let doc = segment.document(0).unwrap();
        assert_eq!(doc.get("payload"), Some(b"first".as_slice()));
        assert_eq!(doc.get("uid"), Some(b"k2".as_slice()));
        let doc = segment.document(2).unwrap();
        assert_eq!(doc.get("payload"), None);
        assert_eq!(doc.len(), 1);

        assert!(segment.keyword("missing").is_none());
        assert!(segment.sorted_numeric("uid").is_none());
    }

    #[test]
    fn test_single_valued_columns_reject_second_value() {
        let mut builder = SegmentBuilder::new();
        let doc = Document::new()
            .with_field(Field::sorted_numeric("num", 1))
            .with_field(Field::sorted_numeric("num", 2));
        let err = builder.add_document(&doc).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        assert!(builder.is_empty());

        let doc = Document::new()
            .with_field(Field::long_point("num", 1))
            .with_field(Field::long_point("num", 2));
        assert_eq!(builder.add_document(&doc).unwrap(), 0);
    }

    #[test]
    fn test_corrupted_segment_is_rejected() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("corrupt.kpseg");
        write_segment(&path, &sample_docs());

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[12] ^= 0x40;
        std::fs::write(&path, &bytes).unwrap();
        let err = open_segment(&path).err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::ChecksumMismatch { .. }));

        std::fs::write(&path, &bytes[..10]).unwrap();
        let err = open_segment(&path).err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    }

    #[test]
    fn test_empty_segment() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("empty.kpseg");
        write_segment(&path, &[]);
        let segment = open_segment(&path).unwrap();
        assert_eq!(segment.doc_count(), 0);
        assert!(segment.sorted_bytes("uid").is_none());
    }
}
