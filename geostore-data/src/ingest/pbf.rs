//! OpenStreetMap PBF reader.
//!
//! Blobs are decoded one at a time so cancellation is observed between blobs
//! as well as between emitted elements.

use std::path::Path;

use osmpbf::{BlobDecode, BlobReader, Element as PbfElement, RelMemberType};

use super::osm::{MemberKind, OsmAccumulator, RawMember, collect_tags};
use super::{ElementIntake, IngestError};
use crate::FormatType;

pub(super) fn parse(path: &Path, intake: &mut ElementIntake<'_>) -> Result<(), IngestError> {
    let reader =
        BlobReader::from_path(path).map_err(|source| IngestError::open(FormatType::Pbf, path, source))?;
    let mut accumulator = OsmAccumulator::default();
    for blob in reader {
        if intake.is_cancelled() {
            break;
        }
        let blob = blob.map_err(|source| IngestError::decode(FormatType::Pbf, path, source))?;
        let decoded = blob
            .decode()
            .map_err(|source| IngestError::decode(FormatType::Pbf, path, source))?;
        if let BlobDecode::OsmData(block) = decoded {
            for element in block.elements() {
                record(&mut accumulator, element);
            }
        }
    }
    accumulator.emit(intake)
}

fn record(accumulator: &mut OsmAccumulator, element: PbfElement<'_>) {
    match element {
        PbfElement::Node(node) => {
            accumulator.add_node(node.id(), node.lon(), node.lat(), collect_tags(node.tags()));
        }
        PbfElement::DenseNode(node) => {
            accumulator.add_node(node.id(), node.lon(), node.lat(), collect_tags(node.tags()));
        }
        PbfElement::Way(way) => {
            accumulator.add_way(way.id(), way.refs().collect(), collect_tags(way.tags()));
        }
        PbfElement::Relation(relation) => {
            let members = relation
                .members()
                .map(|member| RawMember {
                    kind: match member.member_type {
                        RelMemberType::Node => MemberKind::Node,
                        RelMemberType::Way => MemberKind::Way,
                        RelMemberType::Relation => MemberKind::Relation,
                    },
                    reference: member.member_id,
                })
                .collect();
            accumulator.add_relation(relation.id(), members, collect_tags(relation.tags()));
        }
    }
}
