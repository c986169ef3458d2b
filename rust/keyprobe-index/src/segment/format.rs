//! Segment file layout.
//!
//! ```text
//! segment    := MAGIC column_payload* directory trailer
//! directory  := column_count:u32 (name_len:u16 name kind:u8 offset:u64 len:u64)*
//! trailer    := doc_count:u32 directory_offset:u64 checksum:u32 MAGIC
//! ```
//!
//! All integers are little-endian. The checksum covers every byte preceding it.
//! Column payload layouts are documented next to their readers in `column.rs`.

use std::io::Read;

use byteorder::{LE, ReadBytesExt, WriteBytesExt};

use keyprobe_common::{Result, error::Error, verify_data};

use crate::{DocId, document::FieldKind};

pub const SEGMENT_MAGIC: &[u8; 8] = b"KPSEG001";

pub const SEGMENT_EXTENSION: &str = "kpseg";

/// Size of the fixed trailer at the end of every segment file.
pub const TRAILER_SIZE: u64 = 4 + 8 + 4 + SEGMENT_MAGIC.len() as u64;

/// Ordinal recorded for documents that have no value in a sorted-bytes column.
pub const MISSING_ORD: u32 = u32::MAX;

/// Largest number of documents a single segment (and an index) may hold.
pub const MAX_DOCS: u64 = (DocId::MAX - 1) as u64;

pub fn segment_file_name(segment_id: u64) -> String {
    format!("_{segment_id:x}.{SEGMENT_EXTENSION}")
}

pub fn parse_segment_file_name(name: &str) -> Option<u64> {
    let stem = name
        .strip_prefix('_')?
        .strip_suffix(SEGMENT_EXTENSION)?
        .strip_suffix('.')?;
    u64::from_str_radix(stem, 16).ok()
}

/// Maps a short read while decoding `element` to a format error.
pub(crate) fn truncated(element: &'static str) -> impl Fn(std::io::Error) -> Error {
    move |_| Error::invalid_format(format!("{element}: unexpected end of data"))
}

/// One entry of the segment column directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEntry {
    pub name: String,
    pub kind: FieldKind,
    pub offset: u64,
    pub len: u64,
}

impl ColumnEntry {
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        let name = self.name.as_bytes();
        if name.len() > u16::MAX as usize {
            return Err(Error::invalid_arg("field name", "longer than 65535 bytes"));
        }
        out.write_u16::<LE>(name.len() as u16)?;
        out.extend_from_slice(name);
        out.write_u8(self.kind.to_u8())?;
        out.write_u64::<LE>(self.offset)?;
        out.write_u64::<LE>(self.len)?;
        Ok(())
    }

    pub fn read_from(input: &mut &[u8]) -> Result<ColumnEntry> {
        let name_len = input.read_u16::<LE>().map_err(truncated("column name"))? as usize;
        let mut name = vec![0u8; name_len];
        input.read_exact(&mut name).map_err(truncated("column name"))?;
        let name = String::from_utf8(name)
            .map_err(|_| Error::invalid_format("column name is not valid UTF-8"))?;
        let kind = input.read_u8().map_err(truncated("column kind"))?;
        let kind = FieldKind::from_u8(kind)
            .ok_or_else(|| Error::invalid_format(format!("unknown column kind {kind}")))?;
        let offset = input.read_u64::<LE>().map_err(truncated("column offset"))?;
        let len = input.read_u64::<LE>().map_err(truncated("column length"))?;
        Ok(ColumnEntry {
            name,
            kind,
            offset,
            len,
        })
    }
}

pub fn write_directory(entries: &[ColumnEntry]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.write_u32::<LE>(entries.len() as u32)?;
    for entry in entries {
        entry.write_to(&mut out)?;
    }
    Ok(out)
}

pub fn read_directory(mut input: &[u8], data_end: u64) -> Result<Vec<ColumnEntry>> {
    let count = input.read_u32::<LE>().map_err(truncated("column directory"))?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let entry = ColumnEntry::read_from(&mut input)?;
        let end = entry.offset.checked_add(entry.len);
        verify_data!(column_range, end.is_some_and(|end| end <= data_end));
        entries.push(entry);
    }
    verify_data!(column_directory, input.is_empty());
    Ok(entries)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trailer {
    pub doc_count: u32,
    pub directory_offset: u64,
    pub checksum: u32,
}

impl Trailer {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(TRAILER_SIZE as usize);
        out.extend_from_slice(&self.doc_count.to_le_bytes());
        out.extend_from_slice(&self.directory_offset.to_le_bytes());
        out.extend_from_slice(&self.checksum.to_le_bytes());
        out.extend_from_slice(SEGMENT_MAGIC);
        out
    }

    pub fn decode(mut buf: &[u8]) -> Result<Trailer> {
        verify_data!(trailer, buf.len() as u64 == TRAILER_SIZE);
        let doc_count = buf.read_u32::<LE>().map_err(truncated("trailer"))?;
        let directory_offset = buf.read_u64::<LE>().map_err(truncated("trailer"))?;
        let checksum = buf.read_u32::<LE>().map_err(truncated("trailer"))?;
        verify_data!(segment_magic, buf == SEGMENT_MAGIC);
        Ok(Trailer {
            doc_count,
            directory_offset,
            checksum,
        })
    }
}

/// Sorted, deduplicated byte strings addressed by ordinal.
///
/// Layout: `count:u32 offsets:u64[count + 1] bytes`.
#[derive(Debug, Clone)]
pub struct TermDictionary {
    offsets: Vec<u64>,
    bytes: Vec<u8>,
}

impl Default for TermDictionary {
    fn default() -> Self {
        TermDictionary {
            offsets: vec![0],
            bytes: Vec::new(),
        }
    }
}

impl TermDictionary {
    /// Encodes already sorted and deduplicated terms.
    pub fn write_sorted<'a>(
        terms: impl ExactSizeIterator<Item = &'a [u8]>,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        out.write_u32::<LE>(terms.len() as u32)?;
        let mut offsets = Vec::with_capacity(terms.len() + 1);
        let mut bytes = Vec::new();
        offsets.push(0u64);
        for term in terms {
            bytes.extend_from_slice(term);
            offsets.push(bytes.len() as u64);
        }
        for offset in offsets {
            out.write_u64::<LE>(offset)?;
        }
        out.extend_from_slice(&bytes);
        Ok(())
    }

    pub fn read_from(input: &mut &[u8]) -> Result<TermDictionary> {
        let count = input.read_u32::<LE>().map_err(truncated("term dictionary"))? as usize;
        verify_data!(term_count, (count + 1) * 8 <= input.len());
        let mut offsets = vec![0u64; count + 1];
        input
            .read_u64_into::<LE>(&mut offsets)
            .map_err(truncated("term offsets"))?;
        verify_data!(term_offsets, offsets[0] == 0);
        verify_data!(term_offsets, offsets.windows(2).all(|w| w[0] <= w[1]));
        let len = offsets[count] as usize;
        verify_data!(term_bytes, len <= input.len());
        let bytes = input[..len].to_vec();
        *input = &input[len..];
        let dictionary = TermDictionary { offsets, bytes };
        verify_data!(
            term_order,
            (1..dictionary.len()).all(|ord| dictionary.term(ord - 1) < dictionary.term(ord))
        );
        Ok(dictionary)
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn term(&self, ord: usize) -> &[u8] {
        &self.bytes[self.offsets[ord] as usize..self.offsets[ord + 1] as usize]
    }

    /// Exact lookup of a term's ordinal.
    pub fn find(&self, term: &[u8]) -> Option<u32> {
        let ord = self.seek_ceil(0, term);
        (ord < self.len() && self.term(ord) == term).then_some(ord as u32)
    }

    /// Returns the first ordinal at or after `from` whose term is not less than `term`.
    ///
    /// Repeated calls with ascending terms and the previous result as `from` walk the
    /// dictionary once, which is how sorted candidate sets are resolved.
    pub fn seek_ceil(&self, from: usize, term: &[u8]) -> usize {
        let mut lo = from;
        let mut hi = self.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.term(mid) < term {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.len()).map(|ord| self.term(ord))
    }
}

/// Reads exactly `count` little-endian `u32` values.
pub(crate) fn read_u32_vec(
    input: &mut &[u8],
    count: usize,
    element: &'static str,
) -> Result<Vec<u32>> {
    if count.saturating_mul(4) > input.len() {
        return Err(truncated(element)(std::io::ErrorKind::UnexpectedEof.into()));
    }
    let mut values = vec![0u32; count];
    input
        .read_u32_into::<LE>(&mut values)
        .map_err(truncated(element))?;
    Ok(values)
}

/// Reads exactly `count` little-endian `u64` values.
pub(crate) fn read_u64_vec(
    input: &mut &[u8],
    count: usize,
    element: &'static str,
) -> Result<Vec<u64>> {
    if count.saturating_mul(8) > input.len() {
        return Err(truncated(element)(std::io::ErrorKind::UnexpectedEof.into()));
    }
    let mut values = vec![0u64; count];
    input
        .read_u64_into::<LE>(&mut values)
        .map_err(truncated(element))?;
    Ok(values)
}

/// Reads exactly `count` little-endian `i64` values.
pub(crate) fn read_i64_vec(
    input: &mut &[u8],
    count: usize,
    element: &'static str,
) -> Result<Vec<i64>> {
    if count.saturating_mul(8) > input.len() {
        return Err(truncated(element)(std::io::ErrorKind::UnexpectedEof.into()));
    }
    let mut values = vec![0i64; count];
    input
        .read_i64_into::<LE>(&mut values)
        .map_err(truncated(element))?;
    Ok(values)
}
