//! OpenStreetMap JSON reader for Overpass-style documents.

use std::{fs::File, io::BufReader, path::Path};

use geostore_core::Tags;
use serde::Deserialize;

use super::osm::{MemberKind, OsmAccumulator, RawMember};
use super::{ElementIntake, IngestError};
use crate::FormatType;

#[derive(Debug, Deserialize)]
struct OsmJsonDocument {
    #[serde(default)]
    elements: Vec<OsmJsonElement>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OsmJsonElement {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: Tags,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags: Tags,
    },
    Relation {
        id: i64,
        #[serde(default)]
        members: Vec<OsmJsonMember>,
        #[serde(default)]
        tags: Tags,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct OsmJsonMember {
    #[serde(rename = "type")]
    kind: MemberKind,
    #[serde(rename = "ref")]
    reference: i64,
}

pub(super) fn parse(path: &Path, intake: &mut ElementIntake<'_>) -> Result<(), IngestError> {
    let file = File::open(path).map_err(|source| IngestError::open(FormatType::Json, path, source))?;
    let document: OsmJsonDocument = serde_json::from_reader(BufReader::new(file))
        .map_err(|source| IngestError::decode(FormatType::Json, path, source))?;

    let mut accumulator = OsmAccumulator::default();
    for element in document.elements {
        if intake.is_cancelled() {
            break;
        }
        match element {
            OsmJsonElement::Node { id, lat, lon, tags } => accumulator.add_node(id, lon, lat, tags),
            OsmJsonElement::Way { id, nodes, tags } => accumulator.add_way(id, nodes, tags),
            OsmJsonElement::Relation { id, members, tags } => {
                let members = members
                    .into_iter()
                    .map(|member| RawMember {
                        kind: member.kind,
                        reference: member.reference,
                    })
                    .collect();
                accumulator.add_relation(id, members, tags);
            }
            OsmJsonElement::Other => {}
        }
    }
    accumulator.emit(intake)
}
