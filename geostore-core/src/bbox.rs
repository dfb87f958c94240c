//! Axis-aligned geographic extents.

use geo::{Coord, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned extent in WGS84 (`x = longitude`, `y = latitude`).
///
/// Unlike [`geo::Rect`], a bounding box may be empty. Aggregating elements
/// starts from [`BoundingBox::empty`] and grows through
/// [`BoundingBox::expand`]; an empty box intersects and contains nothing.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use geostore_core::BoundingBox;
///
/// let mut bounds = BoundingBox::empty();
/// bounds.expand_to_coord(Coord { x: 13.4, y: 52.5 });
/// bounds.expand_to_coord(Coord { x: 13.5, y: 52.4 });
///
/// assert!(!bounds.is_empty());
/// assert!(bounds.contains(Coord { x: 13.45, y: 52.45 }));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    extent: Option<Rect<f64>>,
}

impl BoundingBox {
    /// The whole WGS84 coordinate space.
    #[must_use]
    pub fn world() -> Self {
        Self::from_bounds(-180.0, -90.0, 180.0, 90.0)
    }

    /// A box covering nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self { extent: None }
    }

    /// Construct a box from two corners; `Rect::new` normalises the order.
    #[must_use]
    pub fn new(first: Coord<f64>, second: Coord<f64>) -> Self {
        Self {
            extent: Some(Rect::new(first, second)),
        }
    }

    /// Construct a box from `min_lon, min_lat, max_lon, max_lat`.
    #[must_use]
    pub fn from_bounds(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self::new(
            Coord {
                x: min_lon,
                y: min_lat,
            },
            Coord {
                x: max_lon,
                y: max_lat,
            },
        )
    }

    /// Returns `true` when no coordinate has been included.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.extent.is_none()
    }

    /// The underlying rectangle, if any.
    #[must_use]
    pub const fn as_rect(&self) -> Option<Rect<f64>> {
        self.extent
    }

    /// Minimum corner (south-west), if any.
    #[must_use]
    pub fn min(&self) -> Option<Coord<f64>> {
        self.extent.map(|rect| rect.min())
    }

    /// Maximum corner (north-east), if any.
    #[must_use]
    pub fn max(&self) -> Option<Coord<f64>> {
        self.extent.map(|rect| rect.max())
    }

    /// Grow the box so it covers `coord`. Non-finite coordinates are ignored.
    pub fn expand_to_coord(&mut self, coord: Coord<f64>) {
        if !(coord.x.is_finite() && coord.y.is_finite()) {
            return;
        }
        self.expand(&Self::new(coord, coord));
    }

    /// Grow the box so it covers `other`.
    pub fn expand(&mut self, other: &Self) {
        let Some(bounds) = other.extent else {
            return;
        };
        match &mut self.extent {
            Some(existing) => {
                let min = Coord {
                    x: existing.min().x.min(bounds.min().x),
                    y: existing.min().y.min(bounds.min().y),
                };
                let max = Coord {
                    x: existing.max().x.max(bounds.max().x),
                    y: existing.max().y.max(bounds.max().y),
                };
                *existing = Rect::new(min, max);
            }
            None => self.extent = Some(bounds),
        }
    }

    /// Whether the two boxes share at least one point. Edges count.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        match (self.extent, other.extent) {
            (Some(lhs), Some(rhs)) => {
                lhs.min().x <= rhs.max().x
                    && rhs.min().x <= lhs.max().x
                    && lhs.min().y <= rhs.max().y
                    && rhs.min().y <= lhs.max().y
            }
            _ => false,
        }
    }

    /// Whether `coord` lies inside the box, boundary included.
    #[must_use]
    pub fn contains(&self, coord: Coord<f64>) -> bool {
        self.extent.is_some_and(|rect| {
            (rect.min().x..=rect.max().x).contains(&coord.x)
                && (rect.min().y..=rect.max().y).contains(&coord.y)
        })
    }

    /// The overlap of two boxes; empty when they do not intersect.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        if !self.intersects(other) {
            return Self::empty();
        }
        match (self.extent, other.extent) {
            (Some(lhs), Some(rhs)) => Self::new(
                Coord {
                    x: lhs.min().x.max(rhs.min().x),
                    y: lhs.min().y.max(rhs.min().y),
                },
                Coord {
                    x: lhs.max().x.min(rhs.max().x),
                    y: lhs.max().y.min(rhs.max().y),
                },
            ),
            _ => Self::empty(),
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        Self { extent: Some(rect) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn unit_box() -> BoundingBox {
        BoundingBox::from_bounds(-1.0, -1.0, 1.0, 1.0)
    }

    #[rstest]
    fn empty_box_intersects_nothing() {
        let empty = BoundingBox::empty();
        assert!(!empty.intersects(&unit_box()));
        assert!(!unit_box().intersects(&empty));
        assert!(!empty.contains(Coord { x: 0.0, y: 0.0 }));
    }

    #[rstest]
    fn expanding_empty_adopts_other() {
        let mut bounds = BoundingBox::empty();
        bounds.expand(&unit_box());
        assert_eq!(bounds, unit_box());
    }

    #[rstest]
    fn expand_grows_to_cover_both() {
        let mut bounds = unit_box();
        bounds.expand(&BoundingBox::from_bounds(2.0, 3.0, 4.0, 5.0));
        assert_eq!(bounds, BoundingBox::from_bounds(-1.0, -1.0, 4.0, 5.0));
    }

    #[rstest]
    fn non_finite_coordinates_are_ignored() {
        let mut bounds = BoundingBox::empty();
        bounds.expand_to_coord(Coord {
            x: f64::NAN,
            y: 1.0,
        });
        assert!(bounds.is_empty());
    }

    #[rstest]
    #[case(BoundingBox::from_bounds(1.0, 1.0, 2.0, 2.0), true)] // shared corner
    #[case(BoundingBox::from_bounds(0.5, -3.0, 0.6, 3.0), true)] // crossing strip
    #[case(BoundingBox::from_bounds(1.1, 1.1, 2.0, 2.0), false)]
    fn intersection_includes_edges(#[case] other: BoundingBox, #[case] expected: bool) {
        assert_eq!(unit_box().intersects(&other), expected);
    }

    #[rstest]
    fn intersection_clips_to_overlap() {
        let overlap = unit_box().intersection(&BoundingBox::from_bounds(0.0, 0.0, 5.0, 5.0));
        assert_eq!(overlap, BoundingBox::from_bounds(0.0, 0.0, 1.0, 1.0));
        assert!(
            unit_box()
                .intersection(&BoundingBox::from_bounds(3.0, 3.0, 4.0, 4.0))
                .is_empty()
        );
    }
}
