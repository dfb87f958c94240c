//! Tile-keyed in-memory element store.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use super::{ElementStore, StoreError};
use crate::{
    BoundingBox, CancellationToken, Element, ElementVisitor, LodRange, QuadKey, StyleProvider,
    TermQuery,
};

/// Element store holding copies of elements per tile.
///
/// Each element is copied into every tile it is stored under, so erasing a
/// tile never affects neighbouring tiles. Intended for tests, small datasets
/// and the command-line tools.
#[derive(Debug, Default)]
pub struct InMemoryElementStore {
    tiles: BTreeMap<QuadKey, Vec<Element>>,
}

impl InMemoryElementStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of populated tiles.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Elements stored for `quad_key`.
    #[must_use]
    pub fn elements(&self, quad_key: &QuadKey) -> &[Element] {
        self.tiles
            .get(quad_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Populated tiles in key order.
    pub fn tiles(&self) -> impl Iterator<Item = (&QuadKey, &[Element])> {
        self.tiles
            .iter()
            .map(|(key, elements)| (key, elements.as_slice()))
    }

    fn insert(&mut self, quad_key: QuadKey, element: &Element) {
        self.tiles.entry(quad_key).or_default().push(element.clone());
    }

    fn store_in_tiles(
        &mut self,
        element: &Element,
        scope: &BoundingBox,
        range: LodRange,
        style: &dyn StyleProvider,
    ) -> Result<bool, StoreError> {
        let element_bounds = element.bounding_box();
        let mut stored = false;
        for level in range.levels() {
            if !style.has_style(element, level) {
                continue;
            }
            for quad_key in QuadKey::covering(scope, level)? {
                if quad_key.bounding_box().intersects(&element_bounds) {
                    self.insert(quad_key, element);
                    stored = true;
                }
            }
        }
        Ok(stored)
    }
}

impl ElementStore for InMemoryElementStore {
    fn store_in_range(
        &mut self,
        element: &Element,
        range: LodRange,
        style: &dyn StyleProvider,
    ) -> Result<bool, StoreError> {
        let bounds = element.bounding_box();
        self.store_in_tiles(element, &bounds, range, style)
    }

    fn store_in_tile(
        &mut self,
        element: &Element,
        quad_key: &QuadKey,
        style: &dyn StyleProvider,
    ) -> Result<bool, StoreError> {
        if !style.has_style(element, quad_key.level_of_detail())
            || !quad_key
                .bounding_box()
                .intersects(&element.bounding_box())
        {
            return Ok(false);
        }
        self.insert(*quad_key, element);
        Ok(true)
    }

    fn store_in_bbox(
        &mut self,
        element: &Element,
        bbox: &BoundingBox,
        range: LodRange,
        style: &dyn StyleProvider,
    ) -> Result<bool, StoreError> {
        let scope = bbox.intersection(&element.bounding_box());
        self.store_in_tiles(element, &scope, range, style)
    }

    fn erase_tile(&mut self, quad_key: &QuadKey) -> Result<(), StoreError> {
        if self.tiles.remove(quad_key).is_some() {
            debug!("erased tile {quad_key}");
        }
        Ok(())
    }

    fn erase_bbox(&mut self, bbox: &BoundingBox, range: LodRange) -> Result<(), StoreError> {
        let before = self.tiles.len();
        self.tiles.retain(|quad_key, _| {
            !(range.contains(quad_key.level_of_detail())
                && quad_key.bounding_box().intersects(bbox))
        });
        debug!(
            "erased {} tiles within {bbox:?} at levels {}..={}",
            before - self.tiles.len(),
            range.start(),
            range.end()
        );
        Ok(())
    }

    fn has_data(&self, quad_key: &QuadKey) -> bool {
        self.tiles
            .get(quad_key)
            .is_some_and(|elements| !elements.is_empty())
    }

    fn search(
        &self,
        query: &TermQuery,
        bbox: &BoundingBox,
        range: LodRange,
        visitor: &mut dyn ElementVisitor,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        // Copies of one element live in several tiles; ids alone may repeat
        // across inputs, so equal ids are told apart by content.
        let mut visited: HashMap<u64, Vec<&Element>> = HashMap::new();
        for (quad_key, elements) in &self.tiles {
            if cancel.is_cancelled() {
                break;
            }
            if !range.contains(quad_key.level_of_detail())
                || !quad_key.bounding_box().intersects(bbox)
            {
                continue;
            }
            for element in elements {
                if !element.bounding_box().intersects(bbox) || !query.matches(element) {
                    continue;
                }
                let seen = visited.entry(element.id).or_default();
                if seen.contains(&element) {
                    continue;
                }
                seen.push(element);
                visitor.visit(element);
            }
        }
        Ok(())
    }

    fn search_tile(
        &self,
        quad_key: &QuadKey,
        visitor: &mut dyn ElementVisitor,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        for element in self.elements(quad_key) {
            if cancel.is_cancelled() {
                break;
            }
            visitor.visit(element);
        }
        Ok(())
    }
}
