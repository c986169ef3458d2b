//! Single-writer index construction.

use std::collections::BTreeSet;

use keyprobe_common::{Result, error::Error, verify_arg};

use crate::{
    DocId,
    directory::{FsDirectory, WriteLock},
    document::Document,
    manifest::{Manifest, parse_manifest_file_name},
    segment::{
        SegmentBuilder, SegmentInfo,
        format::{MAX_DOCS, parse_segment_file_name},
    },
};

/// How [`IndexWriter::open`] treats an index already present in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Discard any existing index and start empty.
    Create,
    /// Add to the existing index; fails when there is none.
    Append,
    /// Append when an index exists, create otherwise.
    #[default]
    CreateOrAppend,
}

#[derive(Debug, Clone)]
pub struct IndexWriterConfig {
    pub open_mode: OpenMode,
    /// Number of buffered documents that triggers a segment flush.
    pub max_buffered_docs: usize,
}

impl Default for IndexWriterConfig {
    fn default() -> Self {
        IndexWriterConfig {
            open_mode: OpenMode::default(),
            max_buffered_docs: 100_000,
        }
    }
}

impl IndexWriterConfig {
    pub fn with_open_mode(mut self, open_mode: OpenMode) -> Self {
        self.open_mode = open_mode;
        self
    }

    pub fn with_max_buffered_docs(mut self, max_buffered_docs: usize) -> Self {
        self.max_buffered_docs = max_buffered_docs;
        self
    }
}

/// Adds documents to an index held in an [`FsDirectory`].
///
/// Buffered documents are flushed into immutable segment files; flushed segments
/// become visible to readers only after [`commit`](IndexWriter::commit). Only one
/// writer may be open per directory at a time (enforced by the write lock).
///
/// The writer must be finished with [`close`](IndexWriter::close). Dropping it
/// without closing discards everything added since the last commit.
pub struct IndexWriter {
    directory: FsDirectory,
    config: IndexWriterConfig,
    generation: u64,
    committed: Vec<SegmentInfo>,
    pending: Vec<SegmentInfo>,
    buffer: SegmentBuilder,
    next_segment_id: u64,
    num_docs: u64,
    closed: bool,
    _lock: WriteLock,
}

impl IndexWriter {
    pub fn open(directory: &FsDirectory, config: IndexWriterConfig) -> Result<IndexWriter> {
        verify_arg!(max_buffered_docs, config.max_buffered_docs > 0);
        let lock = directory.obtain_write_lock()?;

        let existing = Manifest::read_latest(directory);
        let manifest = match config.open_mode {
            OpenMode::Create => {
                // The previous generation is kept so the new commit still supersedes it.
                let generation = Manifest::latest_generation(directory)?.unwrap_or(0);
                remove_index_files(directory, &BTreeSet::new(), u64::MAX)?;
                Manifest {
                    generation,
                    segments: Vec::new(),
                }
            }
            OpenMode::Append => existing?.ok_or_else(|| {
                Error::index_not_found(directory.path().display().to_string())
            })?,
            OpenMode::CreateOrAppend => existing?.unwrap_or_default(),
        };

        let next_segment_id = directory
            .list()?
            .iter()
            .filter_map(|name| parse_segment_file_name(name))
            .chain(manifest.segments.iter().map(|s| s.segment_id))
            .max()
            .map_or(0, |id| id + 1);

        log::debug!(
            "opened index writer at {} ({:?}, generation {}, {} docs)",
            directory.path().display(),
            config.open_mode,
            manifest.generation,
            manifest.doc_count()
        );
        Ok(IndexWriter {
            directory: directory.clone(),
            config,
            generation: manifest.generation,
            num_docs: manifest.doc_count(),
            committed: manifest.segments,
            pending: Vec::new(),
            buffer: SegmentBuilder::new(),
            next_segment_id,
            closed: false,
            _lock: lock,
        })
    }

    pub fn config(&self) -> &IndexWriterConfig {
        &self.config
    }

    /// Documents in the index including those not yet committed.
    pub fn num_docs(&self) -> u64 {
        self.num_docs
    }

    /// Generation of the last commit, `0` when nothing was committed yet.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Adds a document and returns its index-wide id (valid once committed).
    ///
    /// A document rejected by validation leaves the index unchanged. When the flush
    /// triggered by this document fails, the whole unflushed batch (this document
    /// included) is discarded and `num_docs` drops back by its size.
    pub fn add_document(&mut self, doc: &Document) -> Result<DocId> {
        if self.num_docs >= MAX_DOCS {
            return Err(Error::invalid_operation(format!(
                "index is full ({MAX_DOCS} documents)"
            )));
        }
        self.buffer.add_document(doc)?;
        let doc_id = self.num_docs as DocId;
        self.num_docs += 1;
        if self.buffer.doc_count() as usize >= self.config.max_buffered_docs {
            self.flush()?;
        }
        Ok(doc_id)
    }

    /// Writes the buffered documents as a new segment without committing it.
    ///
    /// On failure the buffered documents are lost and no longer counted.
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let segment = SegmentInfo {
            segment_id: self.next_segment_id,
            doc_count: self.buffer.doc_count(),
        };
        self.next_segment_id += 1;
        let builder = std::mem::take(&mut self.buffer);
        let name = segment.file_name();
        let mut out = match self.directory.create_output(&name) {
            Ok(out) => out,
            Err(e) => {
                self.num_docs -= segment.doc_count as u64;
                return Err(e);
            }
        };
        match builder.write_to(&mut out) {
            Ok(bytes) => {
                log::debug!(
                    "flushed segment {name}: {} docs, {bytes} bytes",
                    segment.doc_count
                );
                self.pending.push(segment);
                Ok(())
            }
            Err(e) => {
                drop(out);
                self.delete_quietly(&name);
                self.num_docs -= segment.doc_count as u64;
                Err(e)
            }
        }
    }

    /// Flushes and publishes all added documents as a new commit generation.
    pub fn commit(&mut self) -> Result<u64> {
        self.flush()?;
        let mut segments = self.committed.clone();
        segments.extend_from_slice(&self.pending);
        let manifest = Manifest {
            generation: self.generation + 1,
            segments,
        };
        manifest.write(&self.directory)?;
        self.generation = manifest.generation;
        self.committed = manifest.segments;
        self.pending.clear();

        let live = self
            .committed
            .iter()
            .map(|s| s.segment_id)
            .collect::<BTreeSet<_>>();
        remove_index_files(&self.directory, &live, self.generation)?;
        log::debug!(
            "committed generation {} ({} segments, {} docs)",
            self.generation,
            self.committed.len(),
            self.num_docs
        );
        Ok(self.generation)
    }

    /// Commits and releases the writer.
    pub fn close(mut self) -> Result<()> {
        self.commit()?;
        self.closed = true;
        Ok(())
    }

    fn delete_quietly(&self, name: &str) {
        if let Err(e) = self.directory.delete(name) {
            log::warn!("failed to delete {name}: {e}");
        }
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if !self.pending.is_empty() || !self.buffer.is_empty() {
            log::warn!(
                "index writer at {} dropped without close; discarding {} uncommitted documents",
                self.directory.path().display(),
                self.pending.iter().map(|s| s.doc_count as u64).sum::<u64>()
                    + self.buffer.doc_count() as u64
            );
        }
        for segment in std::mem::take(&mut self.pending) {
            self.delete_quietly(&segment.file_name());
        }
    }
}

/// Deletes segment files not in `live` and manifests older than `keep_generation`.
fn remove_index_files(
    directory: &FsDirectory,
    live: &BTreeSet<u64>,
    keep_generation: u64,
) -> Result<()> {
    for name in directory.list()? {
        let obsolete = match (parse_segment_file_name(&name), parse_manifest_file_name(&name)) {
            (Some(id), _) => !live.contains(&id),
            (_, Some(generation)) => generation < keep_generation,
            _ => false,
        };
        if obsolete {
            directory.delete(&name)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Field;

    fn doc(key: &str) -> Document {
        Document::new().with_field(Field::keyword("uid", key, true))
    }

    #[test]
    fn test_flush_and_commit_files() {
        let tempdir = tempfile::tempdir().unwrap();
        let directory = FsDirectory::open(tempdir.path()).unwrap();
        let config = IndexWriterConfig::default()
            .with_open_mode(OpenMode::Create)
            .with_max_buffered_docs(2);
        let mut writer = IndexWriter::open(&directory, config).unwrap();
        for (i, key) in ["a", "b", "c"].into_iter().enumerate() {
            assert_eq!(writer.add_document(&doc(key)).unwrap(), i as DocId);
        }
        assert_eq!(writer.num_docs(), 3);
        assert_eq!(writer.commit().unwrap(), 1);
        assert_eq!(
            directory.list().unwrap(),
            vec!["_0.kpseg", "_1.kpseg", "segments_1", "write.lock"]
        );

        writer.add_document(&doc("d")).unwrap();
        writer.close().unwrap();
        assert_eq!(
            directory.list().unwrap(),
            vec!["_0.kpseg", "_1.kpseg", "_2.kpseg", "segments_2"]
        );
    }

    #[test]
    fn test_create_discards_existing_index() {
        let tempdir = tempfile::tempdir().unwrap();
        let directory = FsDirectory::open(tempdir.path()).unwrap();
        let mut writer = IndexWriter::open(&directory, IndexWriterConfig::default()).unwrap();
        writer.add_document(&doc("a")).unwrap();
        writer.close().unwrap();

        let config = IndexWriterConfig::default().with_open_mode(OpenMode::Create);
        let writer = IndexWriter::open(&directory, config).unwrap();
        assert_eq!(writer.num_docs(), 0);
        assert_eq!(directory.list().unwrap(), vec!["write.lock"]);
        writer.close().unwrap();
        assert_eq!(directory.list().unwrap(), vec!["segments_2"]);
    }

    #[test]
    fn test_append_requires_index() {
        let tempdir = tempfile::tempdir().unwrap();
        let directory = FsDirectory::open(tempdir.path()).unwrap();
        let config = IndexWriterConfig::default().with_open_mode(OpenMode::Append);
        let err = IndexWriter::open(&directory, config).err().unwrap();
        assert!(matches!(
            err.kind(),
            keyprobe_common::error::ErrorKind::IndexNotFound { .. }
        ));
        assert!(!directory.exists(crate::directory::WRITE_LOCK_NAME));
    }

    #[test]
    fn test_drop_without_close_discards_pending_segments() {
        let tempdir = tempfile::tempdir().unwrap();
        let directory = FsDirectory::open(tempdir.path()).unwrap();
        let config = IndexWriterConfig::default().with_max_buffered_docs(1);
        let mut writer = IndexWriter::open(&directory, config).unwrap();
        writer.add_document(&doc("a")).unwrap();
        writer.add_document(&doc("b")).unwrap();
        assert_eq!(directory.list().unwrap().len(), 3);
        drop(writer);
        assert!(directory.list().unwrap().is_empty());
    }

    #[test]
    fn test_failed_flush_drops_the_batch() {
        let tempdir = tempfile::tempdir().unwrap();
        let directory = FsDirectory::open(tempdir.path()).unwrap();
        let config = IndexWriterConfig::default().with_max_buffered_docs(2);
        let mut writer = IndexWriter::open(&directory, config).unwrap();
        writer.add_document(&doc("a")).unwrap();
        // Occupy the name of the next segment so its creation fails.
        std::fs::write(directory.file_path("_0.kpseg"), b"taken").unwrap();
        assert!(writer.add_document(&doc("b")).is_err());
        assert_eq!(writer.num_docs(), 0);

        assert_eq!(writer.add_document(&doc("c")).unwrap(), 0);
        writer.close().unwrap();
        assert_eq!(directory.list().unwrap(), vec!["_1.kpseg", "segments_1"]);

        let reader = crate::reader::IndexReader::open(&directory).unwrap();
        assert_eq!(reader.num_docs(), 1);
        let stored = reader.document(0).unwrap();
        assert_eq!(stored.get("uid"), Some(b"c".as_slice()));
    }

    #[test]
    fn test_zero_buffer_is_rejected() {
        let tempdir = tempfile::tempdir().unwrap();
        let directory = FsDirectory::open(tempdir.path()).unwrap();
        let config = IndexWriterConfig::default().with_max_buffered_docs(0);
        assert!(IndexWriter::open(&directory, config).is_err());
    }
}
