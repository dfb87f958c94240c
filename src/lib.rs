//! Facade crate for the GeoStore ingestion and query engine.
//!
//! This crate re-exports the core domain types, the ingestion dispatcher and
//! the store coordinator. Parsers for each source format sit behind feature
//! flags.

#![forbid(unsafe_code)]

pub use geostore_core::{
    AcceptAllStyle, BoundingBox, CancellationToken, Element, ElementStore, ElementVisitor,
    Geometry, InMemoryElementStore, LodRange, LodRangeError, MAX_LEVEL_OF_DETAIL, QuadKey,
    QuadKeyError, StoreError, StyleProvider, TagKeyStyle, Tags, TermQuery,
};

#[cfg(feature = "test-support")]
pub use geostore_core::test_support::{RecordingStore, StoreCall, StoreJournal};

pub use geostore_data::{
    ElementSink, FormatType, GeoStore, GeoStoreError, IngestError, IngestSummary, ParseError,
    detect_format, ingest_path,
};
