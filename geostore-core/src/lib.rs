//! Core domain types for the GeoStore engine.
//!
//! Responsibilities:
//! - Model elements, levels of detail, tiles and geographic extents.
//! - Define the collaborator traits the coordinator fans out across
//!   ([`ElementStore`], [`StyleProvider`], [`ElementVisitor`]).
//! - Ship a reference in-memory store keyed by [`QuadKey`].
//!
//! Coordinates are WGS84 throughout, with `x = longitude` and
//! `y = latitude`.

pub mod bbox;
pub mod cancel;
pub mod element;
pub mod lod;
pub mod quadkey;
pub mod search;
pub mod store;
pub mod style;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use bbox::BoundingBox;
pub use cancel::CancellationToken;
pub use element::{Element, Geometry, Tags};
pub use lod::{LodRange, LodRangeError, MAX_LEVEL_OF_DETAIL};
pub use quadkey::{QuadKey, QuadKeyError};
pub use search::{ElementVisitor, TermQuery};
pub use store::{ElementStore, InMemoryElementStore, StoreError};
pub use style::{AcceptAllStyle, StyleProvider, TagKeyStyle};
