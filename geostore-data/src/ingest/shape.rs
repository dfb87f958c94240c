//! ESRI shapefile reader.
//!
//! Each shape record becomes one element whose identifier is the record's
//! position in the file and whose tags are the record's dBase attributes.

use std::path::Path;

use geo::Coord;
use geostore_core::{Element, Geometry, Tags};
use log::warn;
use shapefile::{
    PolygonRing, Reader, Shape,
    dbase::{FieldValue, Record},
    record::traits::HasXY,
};

use super::{ElementIntake, IngestError};
use crate::FormatType;

pub(super) fn parse(path: &Path, intake: &mut ElementIntake<'_>) -> Result<(), IngestError> {
    let mut reader =
        Reader::from_path(path).map_err(|source| IngestError::open(FormatType::Shape, path, source))?;
    for (id, item) in (0_u64..).zip(reader.iter_shapes_and_records()) {
        let (shape, record) =
            item.map_err(|source| IngestError::decode(FormatType::Shape, path, source))?;
        let Some(geometry) = to_geometry(id, &shape) else {
            continue;
        };
        let element = Element::new(id, record_tags(record), geometry);
        if intake.offer(&element)?.is_break() {
            break;
        }
    }
    Ok(())
}

/// Planar position of a shapefile point; Z and M measures are dropped.
fn coord<P: HasXY>(point: &P) -> Coord<f64> {
    Coord {
        x: point.x(),
        y: point.y(),
    }
}

fn to_geometry(id: u64, shape: &Shape) -> Option<Geometry> {
    match shape {
        Shape::Point(point) => Some(Geometry::Point(coord(point))),
        Shape::PointM(point) => Some(Geometry::Point(coord(point))),
        Shape::PointZ(point) => Some(Geometry::Point(coord(point))),
        Shape::Multipoint(multipoint) => Some(points(id, multipoint.points())),
        Shape::MultipointM(multipoint) => Some(points(id, multipoint.points())),
        Shape::MultipointZ(multipoint) => Some(points(id, multipoint.points())),
        Shape::Polyline(polyline) => lines(id, polyline.parts()),
        Shape::PolylineM(polyline) => lines(id, polyline.parts()),
        Shape::PolylineZ(polyline) => lines(id, polyline.parts()),
        Shape::Polygon(polygon) => areas(id, polygon.rings()),
        Shape::PolygonM(polygon) => areas(id, polygon.rings()),
        Shape::PolygonZ(polygon) => areas(id, polygon.rings()),
        Shape::NullShape => None,
        Shape::Multipatch(_) => {
            warn!("skipping shape record {id}: multipatch geometry is not supported");
            None
        }
    }
}

fn points<P: HasXY>(id: u64, points: &[P]) -> Geometry {
    Geometry::Relation(
        points
            .iter()
            .map(|point| Element::point(id, Tags::new(), coord(point)))
            .collect(),
    )
}

/// One part is a line; several become a relation of lines.
fn lines<P: HasXY>(id: u64, parts: &[Vec<P>]) -> Option<Geometry> {
    let mut parts: Vec<Vec<Coord<f64>>> = parts
        .iter()
        .map(|part| part.iter().map(coord).collect())
        .collect();
    match parts.len() {
        0 => None,
        1 => parts.pop().map(Geometry::Line),
        _ => Some(Geometry::Relation(
            parts
                .into_iter()
                .map(|part| Element::line(id, Tags::new(), part))
                .collect(),
        )),
    }
}

/// One ring is an area; several become a relation of areas.
fn areas<P: HasXY>(id: u64, rings: &[PolygonRing<P>]) -> Option<Geometry> {
    let mut rings: Vec<Vec<Coord<f64>>> = rings
        .iter()
        .map(|ring| ring.points().iter().map(coord).collect())
        .collect();
    match rings.len() {
        0 => None,
        1 => rings.pop().map(Geometry::Area),
        _ => Some(Geometry::Relation(
            rings
                .into_iter()
                .map(|ring| Element::area(id, Tags::new(), ring))
                .collect(),
        )),
    }
}

fn record_tags(record: Record) -> Tags {
    record
        .into_iter()
        .filter_map(|(name, value)| field_text(value).map(|text| (name, text)))
        .collect()
}

fn field_text(value: FieldValue) -> Option<String> {
    match value {
        FieldValue::Character(text) => text.map(|text| text.trim().to_owned()),
        FieldValue::Memo(text) => Some(text),
        FieldValue::Numeric(number) => number.map(|number| number.to_string()),
        FieldValue::Float(number) => number.map(|number| number.to_string()),
        FieldValue::Double(number) | FieldValue::Currency(number) => Some(number.to_string()),
        FieldValue::Integer(number) => Some(number.to_string()),
        FieldValue::Logical(flag) => flag.map(|flag| flag.to_string()),
        _ => None,
    }
    .filter(|text| !text.is_empty())
}
