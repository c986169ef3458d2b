//! Minimal columnar document index.
//!
//! An index is a directory of immutable segment files plus commit manifests.
//! Documents are lists of typed fields; each `(field, kind)` pair is stored as a
//! column inside every segment. Supported lookups are exact term matches,
//! point ranges and set membership over sorted columns, evaluated segment by
//! segment with constant scoring.

pub mod checksum;
pub mod collector;
pub mod directory;
pub mod document;
pub mod manifest;
pub mod query;
pub mod reader;
pub mod searcher;
pub mod segment;
pub mod writer;

/// Document id: segment-local inside a segment, index-wide at the reader level.
pub type DocId = u32;

pub use collector::{
    CollectFlow, Collector, CountCollector, TopDocs, TopDocsCollector, TotalHits,
    TotalHitsRelation,
};
pub use directory::FsDirectory;
pub use document::{Document, Field, FieldKind, StoredDocument};
pub use query::{
    DocSet, MatchAllQuery, PointRangeQuery, Query, SortedBytesSetQuery, SortedNumericSetQuery,
    TERMINATED, TermQuery, TermSetQuery,
};
pub use reader::IndexReader;
pub use searcher::IndexSearcher;
pub use writer::{IndexWriter, IndexWriterConfig, OpenMode};
