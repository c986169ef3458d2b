//! Commit manifests.
//!
//! Every commit writes a new `segments_<generation>` file listing the segments
//! that make up the index. Readers open the highest generation present.
//!
//! ```text
//! manifest := MAGIC generation:u64 segment_count:u32 (segment_id:u64 doc_count:u32)* checksum:u32
//! ```

use byteorder::{LE, ReadBytesExt, WriteBytesExt};

use keyprobe_common::{Result, verify_data};
use keyprobe_io::SealingWrite;

use crate::{
    checksum,
    directory::FsDirectory,
    segment::{SegmentInfo, format::truncated},
};

pub const MANIFEST_MAGIC: &[u8; 8] = b"KPIDX001";

pub const MANIFEST_PREFIX: &str = "segments_";

pub fn manifest_file_name(generation: u64) -> String {
    format!("{MANIFEST_PREFIX}{generation:x}")
}

pub fn parse_manifest_file_name(name: &str) -> Option<u64> {
    u64::from_str_radix(name.strip_prefix(MANIFEST_PREFIX)?, 16).ok()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub generation: u64,
    pub segments: Vec<SegmentInfo>,
}

impl Manifest {
    pub fn file_name(&self) -> String {
        manifest_file_name(self.generation)
    }

    pub fn doc_count(&self) -> u64 {
        self.segments.iter().map(|s| s.doc_count as u64).sum()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(24 + self.segments.len() * 12);
        out.extend_from_slice(MANIFEST_MAGIC);
        out.write_u64::<LE>(self.generation)?;
        out.write_u32::<LE>(self.segments.len() as u32)?;
        for segment in &self.segments {
            out.write_u64::<LE>(segment.segment_id)?;
            out.write_u32::<LE>(segment.doc_count)?;
        }
        let checksum = checksum::compute(&out);
        out.write_u32::<LE>(checksum)?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Manifest> {
        verify_data!(manifest_size, buf.len() >= MANIFEST_MAGIC.len() + 8 + 4 + 4);
        let (body, stored) = buf.split_at(buf.len() - 4);
        let stored = u32::from_le_bytes([stored[0], stored[1], stored[2], stored[3]]);
        checksum::validate_buffer(body, stored, "manifest")?;

        verify_data!(manifest_magic, &body[..MANIFEST_MAGIC.len()] == MANIFEST_MAGIC);
        let mut input = &body[MANIFEST_MAGIC.len()..];
        let generation = input.read_u64::<LE>().map_err(truncated("generation"))?;
        let count = input.read_u32::<LE>().map_err(truncated("segment count"))? as usize;
        verify_data!(segment_count, input.len() == count * 12);
        let mut segments = Vec::with_capacity(count);
        for _ in 0..count {
            let segment_id = input.read_u64::<LE>().map_err(truncated("segment id"))?;
            let doc_count = input.read_u32::<LE>().map_err(truncated("segment docs"))?;
            segments.push(SegmentInfo {
                segment_id,
                doc_count,
            });
        }
        Ok(Manifest {
            generation,
            segments,
        })
    }

    /// Writes the manifest as a new file of `directory`.
    pub fn write(&self, directory: &FsDirectory) -> Result<()> {
        let mut out = directory.create_output(&self.file_name())?;
        out.write_all(&self.encode()?)?;
        out.seal()?;
        Ok(())
    }

    /// Highest manifest generation present in the directory, judged by file names.
    pub fn latest_generation(directory: &FsDirectory) -> Result<Option<u64>> {
        Ok(directory
            .list()?
            .iter()
            .filter_map(|name| parse_manifest_file_name(name))
            .max())
    }

    /// Reads the latest committed manifest, if any.
    pub fn read_latest(directory: &FsDirectory) -> Result<Option<Manifest>> {
        let Some(generation) = Self::latest_generation(directory)? else {
            return Ok(None);
        };
        let bytes = directory.open_input(&manifest_file_name(generation))?.read_all()?;
        let manifest = Manifest::decode(&bytes)?;
        verify_data!(manifest_generation, manifest.generation == generation);
        Ok(Some(manifest))
    }
}

#[cfg(test)]
mod tests {
    use keyprobe_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_manifest_file_names() {
        assert_eq!(manifest_file_name(26), "segments_1a");
        assert_eq!(parse_manifest_file_name("segments_1a"), Some(26));
        assert_eq!(parse_manifest_file_name("_1a.kpseg"), None);
        assert_eq!(parse_manifest_file_name("segments_"), None);
    }

    #[test]
    fn test_manifest_encoding() {
        let manifest = Manifest {
            generation: 3,
            segments: vec![
                SegmentInfo {
                    segment_id: 1,
                    doc_count: 10,
                },
                SegmentInfo {
                    segment_id: 4,
                    doc_count: 2,
                },
            ],
        };
        let mut encoded = manifest.encode().unwrap();
        assert_eq!(Manifest::decode(&encoded).unwrap(), manifest);
        assert_eq!(manifest.doc_count(), 12);

        encoded[MANIFEST_MAGIC.len()] ^= 1;
        let err = Manifest::decode(&encoded).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ChecksumMismatch { .. }));
        assert!(Manifest::decode(&encoded[..10]).is_err());
    }

    #[test]
    fn test_read_latest_generation() {
        let tempdir = tempfile::tempdir().unwrap();
        let directory = FsDirectory::open(tempdir.path()).unwrap();
        assert_eq!(Manifest::read_latest(&directory).unwrap(), None);

        for generation in [1, 2, 0x10] {
            Manifest {
                generation,
                segments: Vec::new(),
            }
            .write(&directory)
            .unwrap();
        }
        let latest = Manifest::read_latest(&directory).unwrap().unwrap();
        assert_eq!(latest.generation, 0x10);
        assert!(latest.segments.is_empty());
    }
}
