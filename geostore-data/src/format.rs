//! Source format detection.

use std::{fmt, path::Path};

use serde::Serialize;

/// Encodings the ingestion dispatcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    /// ESRI shapefile; the fallback for unrecognised paths.
    Shape,
    /// OpenStreetMap XML.
    Xml,
    /// OpenStreetMap protocol buffer binary format.
    Pbf,
    /// OpenStreetMap JSON as served by Overpass.
    Json,
}

impl fmt::Display for FormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Shape => "shape",
            Self::Xml => "xml",
            Self::Pbf => "pbf",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

/// Map a path onto its [`FormatType`] by textual suffix.
///
/// Matching is case-sensitive and checks `pbf`, `xml` and `json` in that
/// order; every other path, including one without a suffix, is a shapefile.
///
/// # Examples
/// ```
/// use geostore_data::{FormatType, detect_format};
///
/// assert_eq!(detect_format("berlin.osm.pbf"), FormatType::Pbf);
/// assert_eq!(detect_format("roads.shp"), FormatType::Shape);
/// ```
pub fn detect_format(path: impl AsRef<Path>) -> FormatType {
    let path = path.as_ref().to_string_lossy();
    if path.ends_with("pbf") {
        FormatType::Pbf
    } else if path.ends_with("xml") {
        FormatType::Xml
    } else if path.ends_with("json") {
        FormatType::Json
    } else {
        FormatType::Shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("planet.osm.pbf", FormatType::Pbf)]
    #[case("extract.pbf", FormatType::Pbf)]
    #[case("/data/city.osm.xml", FormatType::Xml)]
    #[case("overpass.json", FormatType::Json)]
    #[case("geojson", FormatType::Json)]
    #[case("coastline.shp", FormatType::Shape)]
    #[case("README", FormatType::Shape)]
    #[case("", FormatType::Shape)]
    #[case("city.OSM.XML", FormatType::Shape)]
    #[case("archive.xml.json", FormatType::Json)]
    fn maps_suffixes(#[case] path: &str, #[case] expected: FormatType) {
        assert_eq!(detect_format(path), expected);
    }
}
