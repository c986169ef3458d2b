//! Key codecs: how a key encoding maps onto index fields and membership queries.

use std::fmt::Debug;

use keyprobe_index::{Field, Query, SortedBytesSetQuery, SortedNumericSetQuery};

use crate::key::{KeyEncoding, numeric_key, string_key};

/// Field holding the document key.
pub const KEY_FIELD: &str = "uid";

/// Stored-only field holding the document payload.
pub const PAYLOAD_FIELD: &str = "payload";

/// One physical key encoding, covering key generation, field layout and the
/// batched `key ∈ set` query over that layout.
pub trait KeyCodec {
    type Key: Clone + Debug;

    fn encoding(&self) -> KeyEncoding;

    /// Key of the document with the given ordinal.
    fn encode(&self, ordinal: u64) -> Self::Key;

    /// Fields that index `key` in a document.
    fn key_fields(&self, key: &Self::Key) -> Vec<Field>;

    /// A single query matching every document whose key is in `candidates`.
    fn membership_query(&self, candidates: Vec<Self::Key>) -> Box<dyn Query>;
}

/// Hex text keys: an exact-match keyword (stored) plus a sorted-bytes column.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringKeyCodec;

impl KeyCodec for StringKeyCodec {
    type Key = String;

    fn encoding(&self) -> KeyEncoding {
        KeyEncoding::String
    }

    fn encode(&self, ordinal: u64) -> String {
        string_key(ordinal)
    }

    fn key_fields(&self, key: &String) -> Vec<Field> {
        vec![
            Field::keyword(KEY_FIELD, key.as_str(), true),
            Field::sorted_bytes(KEY_FIELD, key.as_str()),
        ]
    }

    fn membership_query(&self, candidates: Vec<String>) -> Box<dyn Query> {
        Box::new(SortedBytesSetQuery::new(KEY_FIELD, candidates))
    }
}

/// Signed 64-bit keys: a point field plus a sorted-numeric column.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericKeyCodec;

impl KeyCodec for NumericKeyCodec {
    type Key = i64;

    fn encoding(&self) -> KeyEncoding {
        KeyEncoding::Numeric
    }

    fn encode(&self, ordinal: u64) -> i64 {
        numeric_key(ordinal)
    }

    fn key_fields(&self, key: &i64) -> Vec<Field> {
        vec![
            Field::long_point(KEY_FIELD, *key),
            Field::sorted_numeric(KEY_FIELD, *key),
        ]
    }

    fn membership_query(&self, candidates: Vec<i64>) -> Box<dyn Query> {
        Box::new(SortedNumericSetQuery::new(KEY_FIELD, candidates))
    }
}

/// Regenerates the keys of ordinals `0..doc_count`.
pub fn candidate_keys<C: KeyCodec + ?Sized>(codec: &C, doc_count: u64) -> Vec<C::Key> {
    (0..doc_count).map(|ordinal| codec.encode(ordinal)).collect()
}
