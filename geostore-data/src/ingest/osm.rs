//! Shared OpenStreetMap accumulator.
//!
//! OSM inputs reference node coordinates from ways and members from
//! relations, so the XML, JSON and PBF readers record raw primitives here and
//! emit resolved [`Element`]s once the document has been read. Emission order
//! is tagged nodes, then tagged ways, then tagged relations, each in source
//! order.

use std::collections::HashMap;

use geo::Coord;
use geostore_core::{Element, Tags};
use log::{debug, warn};
use serde::Deserialize;

use super::ids::{OsmKind, element_id};
use super::{ElementIntake, IngestError};

/// Kind of a relation member as written in the source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(super) enum MemberKind {
    Node,
    Way,
    Relation,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) struct RawMember {
    pub(super) kind: MemberKind,
    pub(super) reference: i64,
}

#[derive(Debug)]
struct NodeRecord {
    id: u64,
    location: Coord<f64>,
    tags: Tags,
}

#[derive(Debug)]
struct WayRecord {
    raw_id: i64,
    refs: Vec<i64>,
    tags: Tags,
}

#[derive(Debug)]
struct RelationRecord {
    raw_id: i64,
    members: Vec<RawMember>,
    tags: Tags,
}

#[derive(Debug, Default)]
pub(super) struct OsmAccumulator {
    coordinates: HashMap<i64, Coord<f64>>,
    nodes: Vec<NodeRecord>,
    ways: Vec<WayRecord>,
    relations: Vec<RelationRecord>,
}

impl OsmAccumulator {
    pub(super) fn add_node(&mut self, raw_id: i64, lon: f64, lat: f64, tags: Tags) {
        let Some(location) = validated_coord(lon, lat) else {
            warn!("skipping OSM node {raw_id}: invalid coordinate ({lon}, {lat})");
            return;
        };
        self.coordinates.insert(raw_id, location);
        if tags.is_empty() {
            return;
        }
        if let Some(id) = element_id(OsmKind::Node, raw_id) {
            self.nodes.push(NodeRecord { id, location, tags });
        }
    }

    pub(super) fn add_way(&mut self, raw_id: i64, refs: Vec<i64>, tags: Tags) {
        self.ways.push(WayRecord { raw_id, refs, tags });
    }

    pub(super) fn add_relation(&mut self, raw_id: i64, members: Vec<RawMember>, tags: Tags) {
        self.relations.push(RelationRecord {
            raw_id,
            members,
            tags,
        });
    }

    /// Resolve references and offer every tagged element to `intake`.
    pub(super) fn emit(self, intake: &mut ElementIntake<'_>) -> Result<(), IngestError> {
        let Self {
            coordinates,
            nodes,
            ways,
            relations,
        } = self;

        for node in nodes {
            let element = Element::point(node.id, node.tags, node.location);
            if intake.offer(&element)?.is_break() {
                return Ok(());
            }
        }

        let mut resolved_ways = HashMap::with_capacity(ways.len());
        let mut tagged_ways = Vec::new();
        for way in ways {
            let tagged = !way.tags.is_empty();
            let raw_id = way.raw_id;
            let Some(element) = resolve_way(&coordinates, way) else {
                continue;
            };
            if tagged {
                tagged_ways.push(raw_id);
            }
            resolved_ways.insert(raw_id, element);
        }
        for raw_id in tagged_ways {
            let Some(element) = resolved_ways.get(&raw_id) else {
                continue;
            };
            if intake.offer(element)?.is_break() {
                return Ok(());
            }
        }

        let mut resolved_relations: HashMap<i64, Element> = HashMap::new();
        for relation in relations {
            let Some(id) = element_id(OsmKind::Relation, relation.raw_id) else {
                continue;
            };
            let members: Vec<Element> = relation
                .members
                .iter()
                .filter_map(|member| match member.kind {
                    MemberKind::Node => {
                        let location = coordinates.get(&member.reference)?;
                        let id = element_id(OsmKind::Node, member.reference)?;
                        Some(Element::point(id, Tags::new(), *location))
                    }
                    MemberKind::Way => resolved_ways.get(&member.reference).cloned(),
                    MemberKind::Relation => resolved_relations.get(&member.reference).cloned(),
                })
                .collect();
            if members.is_empty() {
                debug!("skipping OSM relation {}: no resolvable members", relation.raw_id);
                continue;
            }
            let tagged = !relation.tags.is_empty();
            let element = Element::relation(id, relation.tags, members);
            if tagged && intake.offer(&element)?.is_break() {
                return Ok(());
            }
            resolved_relations.insert(relation.raw_id, element);
        }
        Ok(())
    }
}

fn resolve_way(coordinates: &HashMap<i64, Coord<f64>>, way: WayRecord) -> Option<Element> {
    let id = element_id(OsmKind::Way, way.raw_id)?;
    let path: Vec<Coord<f64>> = way
        .refs
        .iter()
        .filter_map(|node| coordinates.get(node).copied())
        .collect();
    if path.len() < way.refs.len() {
        warn!(
            "OSM way {} references {} unknown nodes",
            way.raw_id,
            way.refs.len() - path.len()
        );
    }
    if path.len() < 2 {
        debug!("skipping OSM way {}: fewer than two resolved nodes", way.raw_id);
        return None;
    }
    let closed = path.len() >= 4 && path.first() == path.last();
    Some(if closed {
        Element::area(id, way.tags, path)
    } else {
        Element::line(id, way.tags, path)
    })
}

pub(super) fn collect_tags<'a, T>(tags: T) -> Tags
where
    T: IntoIterator<Item = (&'a str, &'a str)>,
{
    tags.into_iter()
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .collect()
}

pub(super) fn validated_coord(lon: f64, lat: f64) -> Option<Coord<f64>> {
    (lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat))
    .then_some(Coord { x: lon, y: lat })
}
