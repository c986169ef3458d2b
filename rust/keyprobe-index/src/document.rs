//! Documents and typed fields accepted by the index writer.

/// Physical layout of a field inside a segment.
///
/// A single field name may be indexed under several kinds at once (for instance a key
/// that is both an exact-match keyword and a sorted-bytes column); each `(name, kind)`
/// pair is stored as an independent column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    /// Opaque value stored verbatim, retrievable per document, never searched.
    Stored,
    /// Exact-match term backed by an inverted index (term dictionary and postings).
    Keyword,
    /// Single-valued byte column with a sorted value dictionary.
    SortedBytes,
    /// Single-valued signed 64-bit column.
    SortedNumeric,
    /// Signed 64-bit point, indexed for range lookups.
    LongPoint,
}

impl FieldKind {
    pub fn to_u8(self) -> u8 {
        match self {
            FieldKind::Stored => 0,
            FieldKind::Keyword => 1,
            FieldKind::SortedBytes => 2,
            FieldKind::SortedNumeric => 3,
            FieldKind::LongPoint => 4,
        }
    }

    pub fn from_u8(value: u8) -> Option<FieldKind> {
        match value {
            0 => Some(FieldKind::Stored),
            1 => Some(FieldKind::Keyword),
            2 => Some(FieldKind::SortedBytes),
            3 => Some(FieldKind::SortedNumeric),
            4 => Some(FieldKind::LongPoint),
            _ => None,
        }
    }

    /// Whether a document may carry at most one value of this kind per field name.
    pub fn is_single_valued(self) -> bool {
        matches!(self, FieldKind::SortedBytes | FieldKind::SortedNumeric)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Bytes(Vec<u8>),
    I64(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    kind: FieldKind,
    value: FieldValue,
    stored: bool,
}

impl Field {
    pub fn stored(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Field {
        Field {
            name: name.into(),
            kind: FieldKind::Stored,
            value: FieldValue::Bytes(value.into()),
            stored: true,
        }
    }

    /// An untokenized term. When `stored` is set, the value is also kept in the
    /// stored column of the same name.
    pub fn keyword(name: impl Into<String>, value: impl Into<Vec<u8>>, stored: bool) -> Field {
        Field {
            name: name.into(),
            kind: FieldKind::Keyword,
            value: FieldValue::Bytes(value.into()),
            stored,
        }
    }

    pub fn sorted_bytes(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Field {
        Field {
            name: name.into(),
            kind: FieldKind::SortedBytes,
            value: FieldValue::Bytes(value.into()),
            stored: false,
        }
    }

    pub fn sorted_numeric(name: impl Into<String>, value: i64) -> Field {
        Field {
            name: name.into(),
            kind: FieldKind::SortedNumeric,
            value: FieldValue::I64(value),
            stored: false,
        }
    }

    pub fn long_point(name: impl Into<String>, value: i64) -> Field {
        Field {
            name: name.into(),
            kind: FieldKind::LongPoint,
            value: FieldValue::I64(value),
            stored: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn is_stored(&self) -> bool {
        self.stored
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.value {
            FieldValue::Bytes(bytes) => Some(bytes),
            FieldValue::I64(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.value {
            FieldValue::I64(value) => Some(value),
            FieldValue::Bytes(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    fields: Vec<Field>,
}

impl Document {
    pub fn new() -> Document {
        Document::default()
    }

    pub fn with_capacity(capacity: usize) -> Document {
        Document {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn with_field(mut self, field: Field) -> Document {
        self.add(field);
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Extend<Field> for Document {
    fn extend<T: IntoIterator<Item = Field>>(&mut self, iter: T) {
        self.fields.extend(iter);
    }
}

/// Stored values of a single document, as returned by the index reader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredDocument {
    values: Vec<(String, Vec<u8>)>,
}

impl StoredDocument {
    pub(crate) fn push(&mut self, name: &str, value: Vec<u8>) {
        self.values.push((name.to_string(), value));
    }

    /// Returns the first stored value for the field.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.values
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_slice())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.values
            .iter()
            .filter(move |(field, _)| field == name)
            .map(|(_, value)| value.as_slice())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_kind_roundtrip() {
        for kind in [
            FieldKind::Stored,
            FieldKind::Keyword,
            FieldKind::SortedBytes,
            FieldKind::SortedNumeric,
            FieldKind::LongPoint,
        ] {
            assert_eq!(FieldKind::from_u8(kind.to_u8()), Some(kind));
        }
        assert_eq!(FieldKind::from_u8(42), None);
    }

    #[test]
    fn test_document_fields() {
        let doc = Document::new()
            .with_field(Field::keyword("uid", "abc", true))
            .with_field(Field::sorted_numeric("uid", -7));
        assert_eq!(doc.fields().len(), 2);
        assert_eq!(doc.fields()[0].as_bytes(), Some(b"abc".as_slice()));
        assert!(doc.fields()[0].is_stored());
        assert_eq!(doc.fields()[1].as_i64(), Some(-7));
        assert_eq!(doc.fields()[1].as_bytes(), None);
        assert!(doc.fields()[1].kind().is_single_valued());
    }
}
