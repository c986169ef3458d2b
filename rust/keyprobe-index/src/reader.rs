//! Point-in-time view of the latest commit.

use std::sync::Arc;

use keyprobe_common::{Result, error::Error, verify_data};
use keyprobe_io::ReadAt;

use crate::{
    DocId,
    directory::FsDirectory,
    document::StoredDocument,
    manifest::Manifest,
    segment::SegmentReader,
};

/// A segment together with the global id of its first document.
pub struct SegmentContext {
    doc_base: DocId,
    reader: SegmentReader,
}

impl SegmentContext {
    pub fn doc_base(&self) -> DocId {
        self.doc_base
    }

    pub fn reader(&self) -> &SegmentReader {
        &self.reader
    }
}

pub struct IndexReader {
    generation: u64,
    segments: Vec<SegmentContext>,
    num_docs: u64,
}

impl IndexReader {
    /// Opens the latest commit of the index in `directory`.
    pub fn open(directory: &FsDirectory) -> Result<IndexReader> {
        let manifest = Manifest::read_latest(directory)?
            .ok_or_else(|| Error::index_not_found(directory.path().display().to_string()))?;
        let mut segments = Vec::with_capacity(manifest.segments.len());
        let mut num_docs = 0u64;
        for info in &manifest.segments {
            let file: Arc<dyn ReadAt> = Arc::new(directory.open_input(&info.file_name())?);
            let reader = SegmentReader::open(info.segment_id, file)?;
            verify_data!(segment_doc_count, reader.doc_count() == info.doc_count);
            segments.push(SegmentContext {
                doc_base: num_docs as DocId,
                reader,
            });
            num_docs += info.doc_count as u64;
        }
        log::debug!(
            "opened index reader at {} (generation {}, {} segments, {num_docs} docs)",
            directory.path().display(),
            manifest.generation,
            segments.len()
        );
        Ok(IndexReader {
            generation: manifest.generation,
            segments,
            num_docs,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn num_docs(&self) -> u64 {
        self.num_docs
    }

    pub fn segments(&self) -> &[SegmentContext] {
        &self.segments
    }

    /// Reads the stored fields of a document by global id.
    pub fn document(&self, doc: DocId) -> Result<StoredDocument> {
        if doc as u64 >= self.num_docs {
            return Err(Error::invalid_arg(
                "doc",
                format!("{doc} is out of range for {} documents", self.num_docs),
            ));
        }
        let index = self.segments.partition_point(|s| s.doc_base <= doc) - 1;
        let segment = &self.segments[index];
        segment.reader.document(doc - segment.doc_base)
    }

    /// Releases the segment files.
    pub fn close(self) -> Result<()> {
        Ok(())
    }
}
