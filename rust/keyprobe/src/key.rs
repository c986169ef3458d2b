//! Deterministic document keys.
//!
//! A key is derived from the document ordinal alone: the ordinal, as a 32-bit
//! little-endian integer, is hashed with murmur3 x64_128 (seed 0) and the first
//! 64-bit half becomes the key, either as lowercase hex text or reinterpreted as a
//! signed integer. Both encodings of one ordinal therefore carry the same bits.

use std::{collections::hash_map::Entry, fmt, io::Cursor, str::FromStr};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use keyprobe_common::error::Error;

/// Seed of the key hash. Changing it changes every generated key.
pub const KEY_HASH_SEED: u32 = 0;

/// Physical representation of a key in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEncoding {
    /// Lowercase hex text.
    String,
    /// Signed 64-bit integer.
    Numeric,
}

impl KeyEncoding {
    pub const ALL: [KeyEncoding; 2] = [KeyEncoding::String, KeyEncoding::Numeric];

    pub fn name(self) -> &'static str {
        match self {
            KeyEncoding::String => "string",
            KeyEncoding::Numeric => "numeric",
        }
    }
}

impl fmt::Display for KeyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(KeyEncoding::String),
            "numeric" => Ok(KeyEncoding::Numeric),
            _ => Err(Error::invalid_arg(
                "encoding",
                format!("'{s}' is not one of: string, numeric"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    String(String),
    Numeric(i64),
}

impl Key {
    pub fn encoding(&self) -> KeyEncoding {
        match self {
            Key::String(_) => KeyEncoding::String,
            Key::Numeric(_) => KeyEncoding::Numeric,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::String(key) => f.write_str(key),
            Key::Numeric(key) => write!(f, "{key}"),
        }
    }
}

/// 128-bit hash of a document ordinal; `h1` occupies the low 64 bits.
///
/// Only the low 32 bits of the ordinal are hashed, so ordinals `2^32` apart share
/// a key. Index ordinals stay below `MAX_DOCS`.
#[inline]
pub fn key_hash(ordinal: u64) -> u128 {
    let bytes = (ordinal as u32).to_le_bytes();
    // Reading from an in-memory slice cannot fail.
    murmur3::murmur3_x64_128(&mut Cursor::new(&bytes[..]), KEY_HASH_SEED).unwrap_or(0)
}

#[inline]
fn key_bits(ordinal: u64) -> u64 {
    key_hash(ordinal) as u64
}

/// Hex text of the key bits, without zero padding.
pub fn string_key(ordinal: u64) -> String {
    format!("{:x}", key_bits(ordinal))
}

pub fn numeric_key(ordinal: u64) -> i64 {
    key_bits(ordinal) as i64
}

pub fn generate_key(ordinal: u64, encoding: KeyEncoding) -> Key {
    match encoding {
        KeyEncoding::String => Key::String(string_key(ordinal)),
        KeyEncoding::Numeric => Key::Numeric(numeric_key(ordinal)),
    }
}

/// Returns the ordinal pairs in `0..count` that map to the same key, in order of
/// discovery. Index builds never call this; key uniqueness is assumed there.
pub fn find_key_collisions(encoding: KeyEncoding, count: u64) -> Vec<(u64, u64)> {
    let mut seen = AHashMap::with_capacity(count.min(1 << 24) as usize);
    let mut collisions = Vec::new();
    for ordinal in 0..count {
        match seen.entry(generate_key(ordinal, encoding)) {
            Entry::Occupied(first) => collisions.push((*first.get(), ordinal)),
            Entry::Vacant(slot) => {
                slot.insert(ordinal);
            }
        }
    }
    collisions
}
