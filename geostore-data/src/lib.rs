//! Ingestion and coordination for the geostore workspace.
//!
//! Responsibilities:
//! - detect the encoding of a source file from its path;
//! - decode shapefiles and OpenStreetMap XML, JSON and PBF into
//!   [`geostore_core::Element`]s, one callback per element; and
//! - own a registry of named element stores, route ingested elements into
//!   one of them and fan queries out across all of them.
//!
//! Boundaries:
//! - parsers never touch a store; they only call the supplied callback.
//! - stores decide how elements are indexed; the coordinator only chooses
//!   which store operation to call.
//!
//! Invariants:
//! - a cancelled path ingestion issues exactly one erase scoped to the run
//!   before returning; a failed one does the same once any element was
//!   offered.
//! - registry iteration is ordered by key.

mod format;
mod geo_store;
mod ingest;

pub use format::{FormatType, detect_format};
pub use geo_store::{GeoStore, GeoStoreError};
pub use ingest::{ElementSink, IngestError, IngestSummary, ParseError, ingest_path};
