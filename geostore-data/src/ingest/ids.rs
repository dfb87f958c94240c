//! Identifier packing for OpenStreetMap elements.
//!
//! Nodes, ways and relations share one `u64` space: the top two bits hold the
//! kind and the low 62 bits hold the source identifier.

use log::warn;

const WAY_PREFIX: u64 = 1 << 62;
const RELATION_PREFIX: u64 = 1 << 63;
const RAW_ID_MASK: u64 = (1 << 62) - 1;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum OsmKind {
    Node,
    Way,
    Relation,
}

/// Pack `raw_id` with its kind, or `None` when it cannot be represented.
pub(super) fn element_id(kind: OsmKind, raw_id: i64) -> Option<u64> {
    let Ok(raw) = u64::try_from(raw_id) else {
        warn!("skipping OSM {kind:?} {raw_id}: negative identifiers are unsupported");
        return None;
    };
    if raw > RAW_ID_MASK {
        warn!("skipping OSM {kind:?} {raw_id}: identifier exceeds {RAW_ID_MASK}");
        return None;
    }
    let prefix = match kind {
        OsmKind::Node => 0,
        OsmKind::Way => WAY_PREFIX,
        OsmKind::Relation => RELATION_PREFIX,
    };
    Some(prefix | raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OsmKind::Node, 42, Some(42))]
    #[case(OsmKind::Way, 42, Some((1 << 62) | 42))]
    #[case(OsmKind::Relation, 7, Some((1 << 63) | 7))]
    #[case(OsmKind::Node, -1, None)]
    #[case(OsmKind::Way, 1 << 62, None)]
    fn packs_kind_into_high_bits(
        #[case] kind: OsmKind,
        #[case] raw: i64,
        #[case] expected: Option<u64>,
    ) {
        assert_eq!(element_id(kind, raw), expected);
    }
}
