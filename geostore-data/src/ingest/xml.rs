//! OpenStreetMap XML reader.
//!
//! Streams the document with `quick-xml`, collecting `node`, `way` and
//! `relation` elements together with their `tag`, `nd` and `member` children.

use std::{fs::File, io::BufRead, io::BufReader, path::Path, str::FromStr};

use geostore_core::Tags;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use super::osm::{MemberKind, OsmAccumulator, RawMember};
use super::{ElementIntake, IngestError, ParseError};
use crate::FormatType;

#[derive(Debug)]
enum Pending {
    Node {
        id: i64,
        lon: f64,
        lat: f64,
        tags: Tags,
    },
    Way {
        id: i64,
        refs: Vec<i64>,
        tags: Tags,
    },
    Relation {
        id: i64,
        members: Vec<RawMember>,
        tags: Tags,
    },
}

impl Pending {
    fn tags_mut(&mut self) -> &mut Tags {
        match self {
            Self::Node { tags, .. } | Self::Way { tags, .. } | Self::Relation { tags, .. } => tags,
        }
    }

    fn finish(self, accumulator: &mut OsmAccumulator) {
        match self {
            Self::Node { id, lon, lat, tags } => accumulator.add_node(id, lon, lat, tags),
            Self::Way { id, refs, tags } => accumulator.add_way(id, refs, tags),
            Self::Relation { id, members, tags } => accumulator.add_relation(id, members, tags),
        }
    }
}

pub(super) fn parse(path: &Path, intake: &mut ElementIntake<'_>) -> Result<(), IngestError> {
    let file = File::open(path).map_err(|source| IngestError::open(FormatType::Xml, path, source))?;
    let mut accumulator = OsmAccumulator::default();
    read_document(BufReader::new(file), intake, &mut accumulator)
        .map_err(|source| IngestError::decode(FormatType::Xml, path, source))?;
    accumulator.emit(intake)
}

fn read_document<R: BufRead>(
    source: R,
    intake: &ElementIntake<'_>,
    accumulator: &mut OsmAccumulator,
) -> Result<(), ParseError> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);
    let mut pending: Option<Pending> = None;
    let mut buffer = Vec::new();
    loop {
        if intake.is_cancelled() {
            return Ok(());
        }
        match reader.read_event_into(&mut buffer)? {
            Event::Start(start) => open(&start, &mut pending)?,
            Event::Empty(start) => {
                open(&start, &mut pending)?;
                if is_primitive(start.name().as_ref()) {
                    close(&mut pending, accumulator);
                }
            }
            Event::End(end) => {
                if is_primitive(end.name().as_ref()) {
                    close(&mut pending, accumulator);
                }
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
        buffer.clear();
    }
}

fn is_primitive(name: &[u8]) -> bool {
    matches!(name, b"node" | b"way" | b"relation")
}

fn close(pending: &mut Option<Pending>, accumulator: &mut OsmAccumulator) {
    if let Some(primitive) = pending.take() {
        primitive.finish(accumulator);
    }
}

fn open(start: &BytesStart<'_>, pending: &mut Option<Pending>) -> Result<(), ParseError> {
    match start.name().as_ref() {
        b"node" => {
            *pending = Some(Pending::Node {
                id: required(start, b"id", "node id")?,
                lon: required(start, b"lon", "node longitude")?,
                lat: required(start, b"lat", "node latitude")?,
                tags: Tags::new(),
            });
        }
        b"way" => {
            *pending = Some(Pending::Way {
                id: required(start, b"id", "way id")?,
                refs: Vec::new(),
                tags: Tags::new(),
            });
        }
        b"relation" => {
            *pending = Some(Pending::Relation {
                id: required(start, b"id", "relation id")?,
                members: Vec::new(),
                tags: Tags::new(),
            });
        }
        b"tag" => {
            if let Some(primitive) = pending.as_mut() {
                let key = required::<String>(start, b"k", "tag key")?;
                let value = required::<String>(start, b"v", "tag value")?;
                primitive.tags_mut().insert(key, value);
            }
        }
        b"nd" => {
            if let Some(Pending::Way { refs, .. }) = pending.as_mut() {
                refs.push(required(start, b"ref", "way node reference")?);
            }
        }
        b"member" => {
            if let Some(Pending::Relation { members, .. }) = pending.as_mut() {
                let kind = match attribute(start, b"type")?.as_deref() {
                    Some("node") => MemberKind::Node,
                    Some("way") => MemberKind::Way,
                    Some("relation") => MemberKind::Relation,
                    other => {
                        return Err(ParseError::Malformed {
                            what: "relation member type",
                            detail: format!("{other:?}"),
                        });
                    }
                };
                members.push(RawMember {
                    kind,
                    reference: required(start, b"ref", "relation member reference")?,
                });
            }
        }
        _ => {}
    }
    Ok(())
}

fn attribute(start: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, ParseError> {
    for attribute in start.attributes() {
        let attribute = attribute?;
        if attribute.key.as_ref() == name {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn required<T: FromStr>(
    start: &BytesStart<'_>,
    name: &[u8],
    what: &'static str,
) -> Result<T, ParseError> {
    let raw = attribute(start, name)?.ok_or_else(|| ParseError::Malformed {
        what,
        detail: "attribute is missing".to_owned(),
    })?;
    raw.parse().map_err(|_| ParseError::Malformed {
        what,
        detail: format!("cannot interpret {raw:?}"),
    })
}
