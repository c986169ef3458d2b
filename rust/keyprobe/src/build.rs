use std::{path::Path, time::Duration};

use keyprobe_common::Result;
use keyprobe_index::{
    Document, Field, FsDirectory, IndexWriter, IndexWriterConfig, OpenMode, manifest::Manifest,
};

use crate::{
    codec::{KeyCodec, PAYLOAD_FIELD},
    payload::PayloadGenerator,
    stopwatch::Stopwatch,
};

/// What a finished build left on disk.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub doc_count: u64,
    pub segment_count: usize,
    pub index_bytes: u64,
    pub elapsed: Duration,
}

/// Writes a fresh index of `doc_count` documents at `location`.
///
/// Any index already present is discarded. Document `i` carries the codec's key
/// fields for `codec.encode(i)` and a stored payload. The writer is closed before
/// returning; on error it is dropped, which releases the lock and removes the
/// segments written so far.
pub fn build_index<C: KeyCodec + ?Sized>(
    location: &Path,
    doc_count: u64,
    codec: &C,
    payloads: &mut PayloadGenerator,
    writer_config: &IndexWriterConfig,
) -> Result<BuildSummary> {
    let stopwatch = Stopwatch::start_new();
    let directory = FsDirectory::open(location)?;
    let config = writer_config.clone().with_open_mode(OpenMode::Create);
    let mut writer = IndexWriter::open(&directory, config)?;
    for ordinal in 0..doc_count {
        let key = codec.encode(ordinal);
        let mut doc = Document::with_capacity(3);
        doc.extend(codec.key_fields(&key));
        doc.add(Field::stored(PAYLOAD_FIELD, payloads.next_payload()));
        writer.add_document(&doc)?;
    }
    writer.close()?;

    let segment_count = Manifest::read_latest(&directory)?.map_or(0, |m| m.segments.len());
    let summary = BuildSummary {
        doc_count,
        segment_count,
        index_bytes: directory.size_in_bytes()?,
        elapsed: stopwatch.elapsed(),
    };
    log::debug!(
        "built {} index at {}: {} docs in {} segments, {} bytes",
        codec.encoding(),
        location.display(),
        summary.doc_count,
        summary.segment_count,
        summary.index_bytes
    );
    Ok(summary)
}
