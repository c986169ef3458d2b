use std::collections::BTreeMap;

use ahash::{AHashMap, AHashSet};
use byteorder::{LE, WriteBytesExt};
use roaring::RoaringBitmap;

use keyprobe_common::{Result, error::Error};
use keyprobe_io::SealingWrite;

use crate::{
    DocId,
    checksum,
    document::{Document, FieldKind},
    segment::format::{
        ColumnEntry, MAX_DOCS, MISSING_ORD, SEGMENT_MAGIC, TermDictionary, Trailer,
        write_directory,
    },
};

/// In-memory buffer of documents that is serialized into one immutable segment file.
///
/// Every `(field name, kind)` pair becomes its own column. Documents are assigned
/// consecutive ids starting at zero.
#[derive(Default)]
pub struct SegmentBuilder {
    doc_count: u32,
    columns: BTreeMap<(String, FieldKind), ColumnBuilder>,
}

enum ColumnBuilder {
    Stored {
        docs: Vec<DocId>,
        offsets: Vec<u64>,
        data: Vec<u8>,
    },
    Keyword {
        postings: AHashMap<Vec<u8>, Vec<DocId>>,
    },
    SortedBytes {
        values: Vec<Option<Vec<u8>>>,
    },
    SortedNumeric {
        values: Vec<Option<i64>>,
    },
    Points {
        points: Vec<(i64, DocId)>,
    },
}

impl ColumnBuilder {
    fn new(kind: FieldKind) -> ColumnBuilder {
        match kind {
            FieldKind::Stored => ColumnBuilder::Stored {
                docs: Vec::new(),
                offsets: vec![0],
                data: Vec::new(),
            },
            FieldKind::Keyword => ColumnBuilder::Keyword {
                postings: AHashMap::new(),
            },
            FieldKind::SortedBytes => ColumnBuilder::SortedBytes { values: Vec::new() },
            FieldKind::SortedNumeric => ColumnBuilder::SortedNumeric { values: Vec::new() },
            FieldKind::LongPoint => ColumnBuilder::Points { points: Vec::new() },
        }
    }
}

impl SegmentBuilder {
    pub fn new() -> SegmentBuilder {
        SegmentBuilder::default()
    }

    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    pub fn is_empty(&self) -> bool {
        self.doc_count == 0
    }

    /// Buffers a document and returns its segment-local id.
    ///
    /// The document is validated before anything is buffered, so a rejected document
    /// leaves the builder unchanged.
    pub fn add_document(&mut self, doc: &Document) -> Result<DocId> {
        if self.doc_count as u64 >= MAX_DOCS {
            return Err(Error::invalid_operation(format!(
                "segment is full ({MAX_DOCS} documents)"
            )));
        }
        let mut single_valued = AHashSet::new();
        for field in doc.fields() {
            if field.kind().is_single_valued() && !single_valued.insert((field.name(), field.kind()))
            {
                return Err(Error::invalid_arg(
                    field.name(),
                    format!("{:?} field may hold only one value per document", field.kind()),
                ));
            }
            let typed = match field.kind() {
                FieldKind::SortedNumeric | FieldKind::LongPoint => field.as_i64().is_some(),
                _ => field.as_bytes().is_some(),
            };
            if !typed {
                return Err(Error::invalid_arg(field.name(), "value type does not match field kind"));
            }
        }

        let doc_id = self.doc_count;
        for field in doc.fields() {
            if field.kind() == FieldKind::Keyword && field.is_stored() {
                let bytes = field.as_bytes().unwrap_or_default();
                self.column(field.name(), FieldKind::Stored)
                    .push_stored(doc_id, bytes);
            }
            match self.column(field.name(), field.kind()) {
                column @ ColumnBuilder::Stored { .. } => {
                    column.push_stored(doc_id, field.as_bytes().unwrap_or_default());
                }
                ColumnBuilder::Keyword { postings } => {
                    let bytes = field.as_bytes().unwrap_or_default();
                    match postings.get_mut(bytes) {
                        Some(docs) => {
                            if docs.last() != Some(&doc_id) {
                                docs.push(doc_id);
                            }
                        }
                        None => {
                            postings.insert(bytes.to_vec(), vec![doc_id]);
                        }
                    }
                }
                ColumnBuilder::SortedBytes { values } => {
                    let bytes = field.as_bytes().unwrap_or_default();
                    values.resize(doc_id as usize, None);
                    values.push(Some(bytes.to_vec()));
                }
                ColumnBuilder::SortedNumeric { values } => {
                    values.resize(doc_id as usize, None);
                    values.push(field.as_i64());
                }
                ColumnBuilder::Points { points } => {
                    if let Some(value) = field.as_i64() {
                        points.push((value, doc_id));
                    }
                }
            }
        }
        self.doc_count += 1;
        Ok(doc_id)
    }

    fn column(&mut self, name: &str, kind: FieldKind) -> &mut ColumnBuilder {
        self.columns
            .entry((name.to_string(), kind))
            .or_insert_with(|| ColumnBuilder::new(kind))
    }

    /// Serializes the buffered documents as a segment and seals the output.
    ///
    /// Returns the number of bytes written.
    pub fn write_to(self, out: &mut dyn SealingWrite) -> Result<u64> {
        let doc_count = self.doc_count;
        let mut out = HashingWrite::new(out);
        out.write_all(SEGMENT_MAGIC)?;

        let mut entries = Vec::with_capacity(self.columns.len());
        for ((name, kind), column) in self.columns {
            let payload = column.encode(doc_count)?;
            entries.push(ColumnEntry {
                name,
                kind,
                offset: out.position,
                len: payload.len() as u64,
            });
            out.write_all(&payload)?;
        }

        let directory_offset = out.position;
        out.write_all(&write_directory(&entries)?)?;

        let mut trailer = Trailer {
            doc_count,
            directory_offset,
            checksum: 0,
        };
        // doc_count and directory_offset are covered by the checksum, the rest is not.
        let covered = trailer.encode();
        out.write_all(&covered[..12])?;
        trailer.checksum = out.hasher.finish();
        let encoded = trailer.encode();
        out.write_unhashed(&encoded[12..])?;
        out.inner.seal()?;
        Ok(out.position)
    }
}

impl ColumnBuilder {
    fn push_stored(&mut self, doc_id: DocId, bytes: &[u8]) {
        if let ColumnBuilder::Stored {
            docs,
            offsets,
            data,
        } = self
        {
            docs.push(doc_id);
            data.extend_from_slice(bytes);
            offsets.push(data.len() as u64);
        }
    }

    fn encode(self, doc_count: u32) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            ColumnBuilder::Stored {
                docs,
                offsets,
                data,
            } => {
                out.write_u32::<LE>(docs.len() as u32)?;
                for doc in docs {
                    out.write_u32::<LE>(doc)?;
                }
                for offset in offsets {
                    out.write_u64::<LE>(offset)?;
                }
                out.extend_from_slice(&data);
            }
            ColumnBuilder::Keyword { postings } => {
                let mut terms = postings.into_iter().collect::<Vec<_>>();
                terms.sort_unstable_by(|a, b| a.0.cmp(&b.0));
                TermDictionary::write_sorted(terms.iter().map(|(term, _)| term.as_slice()), &mut out)?;
                let mut offset = 0u64;
                out.write_u64::<LE>(offset)?;
                for (_, docs) in &terms {
                    offset += docs.len() as u64;
                    out.write_u64::<LE>(offset)?;
                }
                for (_, docs) in &terms {
                    for &doc in docs {
                        out.write_u32::<LE>(doc)?;
                    }
                }
            }
            ColumnBuilder::SortedBytes { mut values } => {
                values.resize(doc_count as usize, None);
                let mut dictionary = values
                    .iter()
                    .filter_map(|v| v.as_deref())
                    .collect::<Vec<_>>();
                dictionary.sort_unstable();
                dictionary.dedup();
                TermDictionary::write_sorted(dictionary.iter().copied(), &mut out)?;
                for value in &values {
                    let ord = match value.as_deref() {
                        Some(term) => dictionary
                            .binary_search(&term)
                            .map(|ord| ord as u32)
                            .map_err(|_| Error::invalid_operation("sorted bytes dictionary"))?,
                        None => MISSING_ORD,
                    };
                    out.write_u32::<LE>(ord)?;
                }
            }
            ColumnBuilder::SortedNumeric { mut values } => {
                values.resize(doc_count as usize, None);
                let mut presence = RoaringBitmap::new();
                for (doc, value) in values.iter().enumerate() {
                    if value.is_some() {
                        presence.insert(doc as u32);
                    }
                }
                let mut bitmap = Vec::with_capacity(presence.serialized_size());
                presence.serialize_into(&mut bitmap)?;
                out.write_u32::<LE>(bitmap.len() as u32)?;
                out.extend_from_slice(&bitmap);
                for value in values {
                    out.write_i64::<LE>(value.unwrap_or(0))?;
                }
            }
            ColumnBuilder::Points { mut points } => {
                points.sort_unstable();
                out.write_u32::<LE>(points.len() as u32)?;
                for &(value, _) in &points {
                    out.write_i64::<LE>(value)?;
                }
                for &(_, doc) in &points {
                    out.write_u32::<LE>(doc)?;
                }
            }
        }
        Ok(out)
    }
}

/// Sequential writer tracking the current position and the running checksum.
struct HashingWrite<'a> {
    inner: &'a mut dyn SealingWrite,
    hasher: checksum::Hasher,
    position: u64,
}

impl<'a> HashingWrite<'a> {
    fn new(inner: &'a mut dyn SealingWrite) -> HashingWrite<'a> {
        HashingWrite {
            inner,
            hasher: checksum::Hasher::new(),
            position: 0,
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.hasher.update(buf);
        self.write_unhashed(buf)
    }

    fn write_unhashed(&mut self, buf: &[u8]) -> Result<()> {
        self.inner.write_all(buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }
}
