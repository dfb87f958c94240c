//! Element store abstraction.
//!
//! An [`ElementStore`] is a named, independently indexed sink the coordinator
//! writes to and searches across. How it indexes or persists elements is its
//! own business; the trait only fixes the scopes data is written, erased and
//! looked up under.

use thiserror::Error;

use crate::{
    BoundingBox, CancellationToken, Element, ElementVisitor, LodRange, QuadKey, StyleProvider,
    TermQuery,
};

mod memory;

pub use memory::InMemoryElementStore;

/// Boxed error raised by a store backend.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by [`ElementStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not derive tiles for the requested level.
    #[error("invalid tile scope: {0}")]
    InvalidScope(#[from] crate::QuadKeyError),
    /// Failure inside the store's own index or storage.
    #[error("element store backend failed: {0}")]
    Backend(#[source] BackendError),
}

/// Named backend that indexes elements and answers spatial queries.
///
/// Store operations return `true` when the element was retained; a store may
/// reject elements based on its [`StyleProvider`] or other filtering.
///
/// # Examples
///
/// ```rust
/// use geo::Coord;
/// use geostore_core::{
///     CancellationToken, Element, ElementStore, InMemoryElementStore, LodRange, QuadKey, Tags,
///     style::AcceptAllStyle,
/// };
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = InMemoryElementStore::default();
/// let element = Element::point(1, Tags::new(), Coord { x: 13.4, y: 52.5 });
///
/// assert!(store.store_in_range(&element, LodRange::single(1)?, &AcceptAllStyle)?);
/// let tile = QuadKey::from_coordinate(Coord { x: 13.4, y: 52.5 }, 1)?;
/// assert!(store.has_data(&tile));
///
/// let mut found = Vec::new();
/// store.search_tile(&tile, &mut |e: &Element| found.push(e.id), &CancellationToken::new())?;
/// assert_eq!(found, vec![1]);
/// # Ok(())
/// # }
/// ```
pub trait ElementStore: Send {
    /// Store `element` in every tile it covers at each level of `range`.
    fn store_in_range(
        &mut self,
        element: &Element,
        range: LodRange,
        style: &dyn StyleProvider,
    ) -> Result<bool, StoreError>;

    /// Store `element` in the single tile `quad_key`.
    fn store_in_tile(
        &mut self,
        element: &Element,
        quad_key: &QuadKey,
        style: &dyn StyleProvider,
    ) -> Result<bool, StoreError>;

    /// Store `element` in the tiles covering `bbox` at each level of `range`.
    fn store_in_bbox(
        &mut self,
        element: &Element,
        bbox: &BoundingBox,
        range: LodRange,
        style: &dyn StyleProvider,
    ) -> Result<bool, StoreError>;

    /// Remove everything stored for `quad_key`.
    fn erase_tile(&mut self, quad_key: &QuadKey) -> Result<(), StoreError>;

    /// Remove everything stored within `bbox` at the levels of `range`.
    fn erase_bbox(&mut self, bbox: &BoundingBox, range: LodRange) -> Result<(), StoreError>;

    /// Whether any element is stored for `quad_key`.
    fn has_data(&self, quad_key: &QuadKey) -> bool;

    /// Visit elements within `bbox` at the levels of `range` matching `query`.
    ///
    /// Implementations should poll `cancel` and stop early once it trips.
    fn search(
        &self,
        query: &TermQuery,
        bbox: &BoundingBox,
        range: LodRange,
        visitor: &mut dyn ElementVisitor,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError>;

    /// Visit every element stored for `quad_key`.
    fn search_tile(
        &self,
        quad_key: &QuadKey,
        visitor: &mut dyn ElementVisitor,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError>;
}
