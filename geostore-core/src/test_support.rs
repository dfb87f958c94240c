//! Test-only `ElementStore` double that records every call it receives.
//!
//! The store is moved into the coordinator, so observations go through a
//! shared [`StoreJournal`] handed out alongside it.

use std::{collections::HashSet, sync::Arc};

use parking_lot::Mutex;

use crate::{
    BoundingBox, CancellationToken, Element, ElementStore, ElementVisitor, LodRange, QuadKey,
    StoreError, StyleProvider, TermQuery,
};

/// One call made against a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    /// `store_in_range`.
    StoreInRange {
        /// Element identifier.
        id: u64,
        /// Requested levels.
        range: LodRange,
    },
    /// `store_in_tile`.
    StoreInTile {
        /// Element identifier.
        id: u64,
        /// Requested tile.
        quad_key: QuadKey,
    },
    /// `store_in_bbox`.
    StoreInBbox {
        /// Element identifier.
        id: u64,
        /// Requested extent.
        bbox: BoundingBox,
        /// Requested levels.
        range: LodRange,
    },
    /// `erase_tile`.
    EraseTile(QuadKey),
    /// `erase_bbox`.
    EraseBbox {
        /// Erased extent.
        bbox: BoundingBox,
        /// Erased levels.
        range: LodRange,
    },
    /// `has_data`.
    HasData(QuadKey),
    /// `search`.
    Search {
        /// Searched extent.
        bbox: BoundingBox,
        /// Searched levels.
        range: LodRange,
    },
    /// `search_tile`.
    SearchTile(QuadKey),
}

impl StoreCall {
    /// Whether the call wrote an element.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(
            self,
            Self::StoreInRange { .. } | Self::StoreInTile { .. } | Self::StoreInBbox { .. }
        )
    }

    /// Whether the call erased data.
    #[must_use]
    pub const fn is_erase(&self) -> bool {
        matches!(self, Self::EraseTile(_) | Self::EraseBbox { .. })
    }
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    Tile(QuadKey),
    Area(BoundingBox, LodRange),
}

#[derive(Debug, Default)]
struct JournalState {
    calls: Vec<StoreCall>,
    resident: Vec<(Element, Scope)>,
}

/// Shared view onto a [`RecordingStore`]'s history and contents.
#[derive(Debug, Clone, Default)]
pub struct StoreJournal {
    state: Arc<Mutex<JournalState>>,
}

impl StoreJournal {
    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().calls.clone()
    }

    /// Number of write calls received.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.is_write())
            .count()
    }

    /// Erase calls received, in order.
    #[must_use]
    pub fn erases(&self) -> Vec<StoreCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.is_erase())
            .cloned()
            .collect()
    }

    /// Number of search calls (either kind) received.
    #[must_use]
    pub fn searches(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, StoreCall::Search { .. } | StoreCall::SearchTile(_)))
            .count()
    }

    /// Identifiers of elements currently held, in write order.
    #[must_use]
    pub fn resident_ids(&self) -> Vec<u64> {
        self.state
            .lock()
            .resident
            .iter()
            .map(|(element, _)| element.id)
            .collect()
    }

    fn record(&self, call: StoreCall) {
        self.state.lock().calls.push(call);
    }
}

/// Scriptable `ElementStore` that records calls and keeps written elements.
///
/// Written elements stay resident until an erase whose scope covers them.
#[derive(Debug, Default)]
pub struct RecordingStore {
    journal: StoreJournal,
    tiles_with_data: HashSet<QuadKey>,
    cancel_after: Option<(usize, CancellationToken)>,
    fail_after: Option<usize>,
    rejecting: bool,
    writes: usize,
}

impl RecordingStore {
    /// Create a store and the journal observing it.
    #[must_use]
    pub fn new() -> (Self, StoreJournal) {
        let store = Self::default();
        let journal = store.journal.clone();
        (store, journal)
    }

    /// Report data for `quad_key` regardless of writes.
    #[must_use]
    pub fn with_data_in(mut self, quad_key: QuadKey) -> Self {
        self.tiles_with_data.insert(quad_key);
        self
    }

    /// Cancel `token` while handling the `writes`-th write.
    #[must_use]
    pub fn cancelling_after(mut self, writes: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((writes, token));
        self
    }

    /// Fail every write after the first `writes`.
    #[must_use]
    pub const fn failing_after(mut self, writes: usize) -> Self {
        self.fail_after = Some(writes);
        self
    }

    /// Report every element as rejected while still recording it.
    #[must_use]
    pub const fn rejecting(mut self) -> Self {
        self.rejecting = true;
        self
    }

    fn write(&mut self, call: StoreCall, element: &Element, scope: Scope) -> Result<bool, StoreError> {
        self.journal.record(call);
        self.writes += 1;
        if self.fail_after.is_some_and(|limit| self.writes > limit) {
            return Err(StoreError::Backend(
                format!("scripted failure on write {}", self.writes).into(),
            ));
        }
        self.journal
            .state
            .lock()
            .resident
            .push((element.clone(), scope));
        if let Some((limit, token)) = &self.cancel_after {
            if self.writes == *limit {
                token.cancel();
            }
        }
        Ok(!self.rejecting)
    }
}

impl ElementStore for RecordingStore {
    fn store_in_range(
        &mut self,
        element: &Element,
        range: LodRange,
        _style: &dyn StyleProvider,
    ) -> Result<bool, StoreError> {
        let call = StoreCall::StoreInRange {
            id: element.id,
            range,
        };
        self.write(call, element, Scope::Area(element.bounding_box(), range))
    }

    fn store_in_tile(
        &mut self,
        element: &Element,
        quad_key: &QuadKey,
        _style: &dyn StyleProvider,
    ) -> Result<bool, StoreError> {
        let call = StoreCall::StoreInTile {
            id: element.id,
            quad_key: *quad_key,
        };
        self.write(call, element, Scope::Tile(*quad_key))
    }

    fn store_in_bbox(
        &mut self,
        element: &Element,
        bbox: &BoundingBox,
        range: LodRange,
        _style: &dyn StyleProvider,
    ) -> Result<bool, StoreError> {
        let call = StoreCall::StoreInBbox {
            id: element.id,
            bbox: *bbox,
            range,
        };
        self.write(call, element, Scope::Area(*bbox, range))
    }

    fn erase_tile(&mut self, quad_key: &QuadKey) -> Result<(), StoreError> {
        self.journal.record(StoreCall::EraseTile(*quad_key));
        self.journal
            .state
            .lock()
            .resident
            .retain(|(_, scope)| !matches!(scope, Scope::Tile(key) if key == quad_key));
        Ok(())
    }

    fn erase_bbox(&mut self, bbox: &BoundingBox, range: LodRange) -> Result<(), StoreError> {
        self.journal.record(StoreCall::EraseBbox { bbox: *bbox, range });
        self.journal.state.lock().resident.retain(|(_, scope)| match scope {
            Scope::Area(stored, levels) => {
                let overlapping_levels =
                    levels.start() <= range.end() && range.start() <= levels.end();
                !(overlapping_levels && stored.intersects(bbox))
            }
            Scope::Tile(_) => true,
        });
        Ok(())
    }

    fn has_data(&self, quad_key: &QuadKey) -> bool {
        self.journal.record(StoreCall::HasData(*quad_key));
        self.tiles_with_data.contains(quad_key)
            || self
                .journal
                .state
                .lock()
                .resident
                .iter()
                .any(|(_, scope)| matches!(scope, Scope::Tile(key) if key == quad_key))
    }

    fn search(
        &self,
        query: &TermQuery,
        bbox: &BoundingBox,
        range: LodRange,
        visitor: &mut dyn ElementVisitor,
        _cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        self.journal.record(StoreCall::Search { bbox: *bbox, range });
        let matching: Vec<Element> = self
            .journal
            .state
            .lock()
            .resident
            .iter()
            .filter(|(element, _)| query.matches(element))
            .map(|(element, _)| element.clone())
            .collect();
        for element in &matching {
            visitor.visit(element);
        }
        Ok(())
    }

    fn search_tile(
        &self,
        quad_key: &QuadKey,
        visitor: &mut dyn ElementVisitor,
        _cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        self.journal.record(StoreCall::SearchTile(*quad_key));
        let matching: Vec<Element> = self
            .journal
            .state
            .lock()
            .resident
            .iter()
            .filter(|(_, scope)| matches!(scope, Scope::Tile(key) if key == quad_key))
            .map(|(element, _)| element.clone())
            .collect();
        for element in &matching {
            visitor.visit(element);
        }
        Ok(())
    }
}
