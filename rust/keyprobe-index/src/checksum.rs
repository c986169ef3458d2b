//! 32-bit checksums of persisted index files: xxh3-64 folded to 32 bits.

use keyprobe_common::{Result, error::Error};

pub fn compute(buf: &[u8]) -> u32 {
    fold(xxhash_rust::xxh3::xxh3_64(buf))
}

/// Fails with `ChecksumMismatch` naming `name` unless `buf` hashes to `checksum`.
pub fn validate_buffer(buf: &[u8], checksum: u32, name: &str) -> Result<()> {
    validate(compute(buf), checksum, name)
}

pub fn validate(actual: u32, expected: u32, name: &str) -> Result<()> {
    if actual != expected {
        return Err(Error::checksum_mismatch(name));
    }
    Ok(())
}

/// Incremental [`compute`]; the result does not depend on how the input is chunked.
#[derive(Clone)]
pub struct Hasher(xxhash_rust::xxh3::Xxh3);

impl Hasher {
    pub fn new() -> Hasher {
        Hasher(xxhash_rust::xxh3::Xxh3::new())
    }

    pub fn update(&mut self, buf: &[u8]) {
        self.0.update(buf);
    }

    pub fn finish(&self) -> u32 {
        fold(self.0.digest())
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Hasher::new()
    }
}

#[inline]
fn fold(h: u64) -> u32 {
    (h as u32) ^ ((h >> 32) as u32)
}

#[cfg(test)]
mod tests {
    use keyprobe_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_checksum_validation() {
        let buf = b"sorted doc values".to_vec();
        let checksum = compute(&buf);
        assert!(validate_buffer(&buf, checksum, "buf").is_ok());

        let mut corrupted = buf.clone();
        corrupted[3] ^= 0x01;
        let err = validate_buffer(&corrupted, checksum, "buf").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        fastrand::seed(8123741);
        let buf: Vec<u8> = (0..10_000).map(|_| fastrand::u8(..)).collect();
        let mut hasher = Hasher::new();
        for chunk in buf.chunks(777) {
            hasher.update(chunk);
        }
        assert_eq!(hasher.finish(), compute(&buf));
    }
}
