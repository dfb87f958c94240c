// Fixture writers shared by unit and behaviour tests.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use base64::{Engine as _, engine::general_purpose};
use tempfile::{Builder, TempPath};

/// Epsilon for floating-point coordinate comparisons in tests.
const COORDINATE_EPSILON: f64 = 1.0e-9;

/// Small OSM XML document: one tagged node, a closed building way and a
/// route relation referencing both.
pub const OSM_XML_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="fixture">
  <bounds minlat="52.5" minlon="13.3" maxlat="52.6" maxlon="13.5"/>
  <node id="1" lat="52.50" lon="13.30"/>
  <node id="2" lat="52.50" lon="13.40"/>
  <node id="3" lat="52.60" lon="13.40"/>
  <node id="4" lat="52.60" lon="13.30">
    <tag k="name" v="Caf&#233; Kranzler"/>
    <tag k="amenity" v="cafe"/>
  </node>
  <node id="5" lat="52.55" lon="13.50"/>
  <way id="10">
    <nd ref="1"/>
    <nd ref="2"/>
    <nd ref="3"/>
    <nd ref="4"/>
    <nd ref="1"/>
    <tag k="building" v="yes"/>
  </way>
  <way id="11">
    <nd ref="3"/>
    <nd ref="5"/>
    <tag k="highway" v="footway"/>
  </way>
  <relation id="20">
    <member type="way" ref="10" role="outer"/>
    <member type="node" ref="5" role="stop"/>
    <tag k="type" v="route"/>
  </relation>
</osm>
"#;

/// Write `contents` to a temporary file ending in `suffix`.
pub fn write_fixture(stem: &str, suffix: &str, contents: &[u8]) -> TempPath {
    let mut tempfile = Builder::new()
        .prefix(stem)
        .suffix(suffix)
        .tempfile()
        .unwrap_or_else(|err| {
            panic!("failed to create temporary fixture for {stem}: {err}");
        });
    tempfile.write_all(contents).unwrap_or_else(|err| {
        panic!("failed to write fixture for {stem}: {err}");
    });
    tempfile.flush().unwrap_or_else(|err| {
        panic!("failed to flush fixture for {stem}: {err}");
    });
    tempfile.into_temp_path()
}

/// Overpass-style JSON with `count` tagged nodes stepping north-east from
/// (13.40, 52.50) by 0.01 degrees.
pub fn osm_json_nodes(count: u32) -> String {
    let elements: Vec<String> = (1..=count)
        .map(|index| {
            let offset = f64::from(index) * 0.01;
            format!(
                r#"{{"type":"node","id":{index},"lat":{lat},"lon":{lon},"tags":{{"name":"Stop {index}","highway":"bus_stop"}}}}"#,
                lat = 52.50 + offset,
                lon = 13.40 + offset,
            )
        })
        .collect();
    format!(r#"{{"version":0.6,"elements":[{}]}}"#, elements.join(","))
}

/// Write [`osm_json_nodes`] to a temporary `.json` file.
pub fn json_nodes_fixture(count: u32) -> TempPath {
    write_fixture("nodes", ".json", osm_json_nodes(count).as_bytes())
}

/// Directory containing the encoded fixture blobs.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Decode a Base64-encoded fixture into a temporary `.osm.pbf` file.
pub fn decode_fixture(dir: &Path, stem: &str) -> TempPath {
    let encoded_path = dir.join(format!("{stem}.osm.pbf.b64"));
    let encoded = fs::read_to_string(&encoded_path).unwrap_or_else(|err| {
        panic!("failed to read base64 fixture {encoded_path:?}: {err}");
    });
    let cleaned: String = encoded
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();
    let decoded = general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .unwrap_or_else(|err| {
            panic!("failed to decode base64 fixture {encoded_path:?}: {err}");
        });
    write_fixture(stem, ".osm.pbf", &decoded)
}

/// The [`OSM_XML_SAMPLE`] content encoded as PBF, mixing dense and plain
/// nodes.
pub fn pbf_sample_fixture() -> TempPath {
    decode_fixture(&fixtures_dir(), "sample")
}

/// Write [`OSM_XML_SAMPLE`] to a temporary `.osm.xml` file.
pub fn xml_sample_fixture() -> TempPath {
    write_fixture("sample", ".osm.xml", OSM_XML_SAMPLE.as_bytes())
}

/// Compare floating-point coordinates within a small epsilon.
pub fn assert_close(actual: f64, expected: f64) {
    let delta = (actual - expected).abs();
    assert!(
        delta <= COORDINATE_EPSILON,
        "expected {expected}, got {actual} (|delta| = {delta})"
    );
}
