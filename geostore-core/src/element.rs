use std::collections::HashMap;

use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Free-form key/value attributes, mirroring OpenStreetMap tags.
pub type Tags = HashMap<String, String>;

/// Shape of an [`Element`].
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Geometry {
    /// A single position.
    Point(Coord<f64>),
    /// An open polyline.
    Line(Vec<Coord<f64>>),
    /// A closed ring enclosing an area.
    Area(Vec<Coord<f64>>),
    /// A group of member elements.
    Relation(Vec<Element>),
}

/// A decoded geospatial feature handed from a parser to a store.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use geostore_core::{Element, Tags};
///
/// let tags = Tags::from([("highway".into(), "primary".into())]);
/// let road = Element::line(7, tags, vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 2.0 }]);
///
/// let bounds = road.bounding_box();
/// assert_eq!(bounds.max(), Some(Coord { x: 1.0, y: 2.0 }));
/// assert_eq!(road.tag("highway"), Some("primary"));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Element {
    /// Identifier, unique within one source.
    pub id: u64,
    /// Attributes.
    pub tags: Tags,
    /// Shape.
    pub geometry: Geometry,
}

impl Element {
    /// Construct an element from its parts.
    #[must_use]
    pub fn new(id: u64, tags: Tags, geometry: Geometry) -> Self {
        Self { id, tags, geometry }
    }

    /// Construct a point element.
    #[must_use]
    pub fn point(id: u64, tags: Tags, location: Coord<f64>) -> Self {
        Self::new(id, tags, Geometry::Point(location))
    }

    /// Construct a polyline element.
    #[must_use]
    pub fn line(id: u64, tags: Tags, coordinates: Vec<Coord<f64>>) -> Self {
        Self::new(id, tags, Geometry::Line(coordinates))
    }

    /// Construct an area element.
    #[must_use]
    pub fn area(id: u64, tags: Tags, coordinates: Vec<Coord<f64>>) -> Self {
        Self::new(id, tags, Geometry::Area(coordinates))
    }

    /// Construct a relation element.
    #[must_use]
    pub fn relation(id: u64, tags: Tags, members: Vec<Self>) -> Self {
        Self::new(id, tags, Geometry::Relation(members))
    }

    /// Value of the tag `key`, if present.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Extent of every coordinate, relation members included.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        self.extend_bounds(&mut bounds);
        bounds
    }

    fn extend_bounds(&self, bounds: &mut BoundingBox) {
        match &self.geometry {
            Geometry::Point(location) => bounds.expand_to_coord(*location),
            Geometry::Line(coordinates) | Geometry::Area(coordinates) => {
                for coordinate in coordinates {
                    bounds.expand_to_coord(*coordinate);
                }
            }
            Geometry::Relation(members) => {
                for member in members {
                    member.extend_bounds(bounds);
                }
            }
        }
    }
}
