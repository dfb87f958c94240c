//! Store registry and federated query coordinator.
//!
//! [`GeoStore`] owns a set of named [`ElementStore`]s. Ingestion entry points
//! route decoded elements into one store and roll back the run's scope when it
//! is cancelled or fails part-way; queries fan out across every store.

use std::{
    collections::{BTreeMap, btree_map::Entry},
    path::Path,
};

use geostore_core::{
    BoundingBox, CancellationToken, Element, ElementStore, ElementVisitor, LodRange, QuadKey,
    StoreError, StyleProvider, TermQuery,
};
use log::{info, warn};
use thiserror::Error;

use crate::{IngestError, IngestSummary, ingest_path};

/// Errors raised by [`GeoStore`] operations.
#[derive(Debug, Error)]
pub enum GeoStoreError {
    /// No store is registered under the requested key.
    #[error("no store is registered under {key:?}")]
    MissingStore {
        /// Requested key.
        key: String,
    },
    /// Parsing the input failed.
    #[error("ingestion into store {key:?} failed: {source}")]
    Ingest {
        /// Target store.
        key: String,
        /// Underlying failure.
        #[source]
        source: IngestError,
    },
    /// The store rejected an operation.
    #[error("store {key:?} failed: {source}")]
    Store {
        /// Store that failed.
        key: String,
        /// Underlying failure.
        #[source]
        source: StoreError,
    },
}

impl GeoStoreError {
    fn store(key: &str, source: StoreError) -> Self {
        Self::Store {
            key: key.to_owned(),
            source,
        }
    }
}

/// Where the elements of one path ingestion are written.
#[derive(Debug, Clone, Copy)]
enum IngestScope<'a> {
    Tile(&'a QuadKey),
    Range(LodRange),
    Bbox(&'a BoundingBox, LodRange),
}

impl IngestScope<'_> {
    fn store(
        self,
        store: &mut dyn ElementStore,
        element: &Element,
        style: &dyn StyleProvider,
    ) -> Result<bool, StoreError> {
        match self {
            Self::Tile(quad_key) => store.store_in_tile(element, quad_key, style),
            Self::Range(range) => store.store_in_range(element, range, style),
            Self::Bbox(bbox, range) => store.store_in_bbox(element, bbox, range, style),
        }
    }

    /// Erase what this scope wrote; `offered` is the extent of offered elements.
    fn erase(self, store: &mut dyn ElementStore, offered: &BoundingBox) -> Result<(), StoreError> {
        match self {
            Self::Tile(quad_key) => store.erase_tile(quad_key),
            Self::Range(range) => store.erase_bbox(offered, range),
            Self::Bbox(bbox, range) => store.erase_bbox(bbox, range),
        }
    }
}

/// Registry of named element stores.
///
/// Stores are visited in key order.
///
/// # Examples
/// ```
/// use geostore_core::{
///     CancellationToken, Element, InMemoryElementStore, LodRange, QuadKey, AcceptAllStyle,
/// };
/// use geo::Coord;
/// use geostore_data::GeoStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut geo_store = GeoStore::new();
/// geo_store.register_store("roads", Box::new(InMemoryElementStore::new()));
///
/// let element = Element::point(1, Default::default(), Coord { x: 13.4, y: 52.5 });
/// let cancel = CancellationToken::new();
/// geo_store.add_element("roads", &element, LodRange::single(1)?, &AcceptAllStyle, &cancel)?;
///
/// let tile = QuadKey::from_coordinate(Coord { x: 13.4, y: 52.5 }, 1)?;
/// assert!(geo_store.has_data(&tile));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct GeoStore {
    stores: BTreeMap<String, Box<dyn ElementStore>>,
}

impl GeoStore {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `store` under `key`.
    ///
    /// Returns `false` and drops `store` when the key is already taken; the
    /// original store stays registered.
    pub fn register_store(&mut self, key: impl Into<String>, store: Box<dyn ElementStore>) -> bool {
        match self.stores.entry(key.into()) {
            Entry::Occupied(entry) => {
                warn!("store {:?} is already registered; keeping the original", entry.key());
                false
            }
            Entry::Vacant(entry) => {
                info!("registered store {:?}", entry.key());
                entry.insert(store);
                true
            }
        }
    }

    /// The store registered under `key`.
    #[must_use]
    pub fn store(&self, key: &str) -> Option<&dyn ElementStore> {
        self.stores.get(key).map(AsRef::as_ref)
    }

    /// Registered keys in visiting order.
    pub fn store_keys(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }

    /// Store one element in store `key` across the levels of `range`.
    ///
    /// The write goes straight to the store's range operation; the token is
    /// not consulted.
    pub fn add_element(
        &mut self,
        key: &str,
        element: &Element,
        range: LodRange,
        style: &dyn StyleProvider,
        _cancel: &CancellationToken,
    ) -> Result<bool, GeoStoreError> {
        self.store_mut(key)?
            .store_in_range(element, range, style)
            .map_err(|source| GeoStoreError::store(key, source))
    }

    /// Ingest `path` into the single tile `quad_key` of store `key`.
    ///
    /// Cancellation erases `quad_key`.
    pub fn add_path_to_tile(
        &mut self,
        key: &str,
        path: impl AsRef<Path>,
        quad_key: &QuadKey,
        style: &dyn StyleProvider,
        cancel: &CancellationToken,
    ) -> Result<IngestSummary, GeoStoreError> {
        self.ingest_scoped(key, path.as_ref(), IngestScope::Tile(quad_key), style, cancel)
    }

    /// Ingest `path` into store `key` across the levels of `range`.
    ///
    /// Cancellation erases the extent of the elements offered during this run
    /// at the levels of `range`.
    pub fn add_path_in_range(
        &mut self,
        key: &str,
        path: impl AsRef<Path>,
        range: LodRange,
        style: &dyn StyleProvider,
        cancel: &CancellationToken,
    ) -> Result<IngestSummary, GeoStoreError> {
        self.ingest_scoped(key, path.as_ref(), IngestScope::Range(range), style, cancel)
    }

    /// Ingest `path` into store `key`, limited to `bbox` at the levels of `range`.
    ///
    /// Cancellation erases `bbox` at the levels of `range`.
    pub fn add_path_in_bbox(
        &mut self,
        key: &str,
        path: impl AsRef<Path>,
        bbox: &BoundingBox,
        range: LodRange,
        style: &dyn StyleProvider,
        cancel: &CancellationToken,
    ) -> Result<IngestSummary, GeoStoreError> {
        self.ingest_scoped(
            key,
            path.as_ref(),
            IngestScope::Bbox(bbox, range),
            style,
            cancel,
        )
    }

    /// Run `query` against every store in key order.
    ///
    /// The token is handed to each store; the coordinator does not poll it.
    pub fn search(
        &self,
        query: &TermQuery,
        bbox: &BoundingBox,
        range: LodRange,
        visitor: &mut dyn ElementVisitor,
        cancel: &CancellationToken,
    ) -> Result<(), GeoStoreError> {
        for (key, store) in &self.stores {
            store
                .search(query, bbox, range, visitor, cancel)
                .map_err(|source| GeoStoreError::store(key, source))?;
        }
        Ok(())
    }

    /// Visit the contents of `quad_key` in every store that reports data for it.
    ///
    /// `_style` is not forwarded; each store visits its tile unfiltered.
    pub fn search_tile(
        &self,
        quad_key: &QuadKey,
        _style: &dyn StyleProvider,
        visitor: &mut dyn ElementVisitor,
        cancel: &CancellationToken,
    ) -> Result<(), GeoStoreError> {
        for (key, store) in &self.stores {
            if !store.has_data(quad_key) {
                continue;
            }
            store
                .search_tile(quad_key, visitor, cancel)
                .map_err(|source| GeoStoreError::store(key, source))?;
        }
        Ok(())
    }

    /// Whether any registered store holds data for `quad_key`.
    #[must_use]
    pub fn has_data(&self, quad_key: &QuadKey) -> bool {
        self.stores.values().any(|store| store.has_data(quad_key))
    }

    fn store_mut(&mut self, key: &str) -> Result<&mut dyn ElementStore, GeoStoreError> {
        match self.stores.get_mut(key) {
            Some(store) => Ok(&mut **store),
            None => Err(GeoStoreError::MissingStore {
                key: key.to_owned(),
            }),
        }
    }

    fn ingest_scoped(
        &mut self,
        key: &str,
        path: &Path,
        scope: IngestScope<'_>,
        style: &dyn StyleProvider,
        cancel: &CancellationToken,
    ) -> Result<IngestSummary, GeoStoreError> {
        let store = self.store_mut(key)?;
        let mut offered = BoundingBox::empty();
        let mut any_offered = false;
        let outcome = ingest_path(path, cancel, &mut |element: &Element| {
            any_offered = true;
            offered.expand(&element.bounding_box());
            scope.store(&mut *store, element, style)
        });

        match outcome {
            Ok(summary) => {
                if summary.cancelled {
                    info!(
                        "ingestion of {path:?} into {key:?} cancelled after {} elements; rolling back",
                        summary.offered
                    );
                    scope
                        .erase(store, &summary.bounds)
                        .map_err(|source| GeoStoreError::store(key, source))?;
                }
                Ok(summary)
            }
            Err(error) => {
                if any_offered {
                    match scope.erase(store, &offered) {
                        Ok(()) => info!("rolled back partial ingestion of {path:?} into {key:?}"),
                        Err(rollback) => {
                            warn!("rollback of {path:?} in {key:?} failed: {rollback}");
                        }
                    }
                }
                Err(match error {
                    IngestError::Sink(source) => GeoStoreError::store(key, source),
                    source => GeoStoreError::Ingest {
                        key: key.to_owned(),
                        source,
                    },
                })
            }
        }
    }
}

#[cfg(all(test, feature = "osm-json"))]
mod tests;
