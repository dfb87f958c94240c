//! Scope, style and in-memory ingestion shared by the `ingest` and `search`
//! commands.

use std::io;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use geostore_core::{
    AcceptAllStyle, BoundingBox, CancellationToken, InMemoryElementStore, LodRange, QuadKey,
    StyleProvider, TagKeyStyle,
};
use geostore_data::{GeoStore, IngestSummary};
use log::info;

use crate::CliError;

pub(crate) const DEFAULT_STORE: &str = "default";
pub(crate) const DEFAULT_LOD_START: u8 = 1;
pub(crate) const DEFAULT_LOD_END: u8 = 12;

/// Where ingested elements are written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Scope {
    Tile(QuadKey),
    Range(LodRange),
    Bbox(BoundingBox, LodRange),
}

impl Scope {
    /// Resolve the merged scope options.
    ///
    /// `quadkey` and `bbox` are mutually exclusive. Without either the range
    /// variant is used; a missing end level defaults to the larger of the
    /// start level and [`DEFAULT_LOD_END`].
    pub(crate) fn resolve(
        lod_start: Option<u8>,
        lod_end: Option<u8>,
        bbox: Option<&str>,
        quadkey: Option<&str>,
    ) -> Result<Self, CliError> {
        if bbox.is_some() && quadkey.is_some() {
            return Err(CliError::ConflictingScope);
        }
        if let Some(value) = quadkey {
            let quad_key = value
                .trim()
                .parse::<QuadKey>()
                .map_err(|source| CliError::InvalidQuadKey {
                    value: value.to_owned(),
                    source,
                })?;
            return Ok(Self::Tile(quad_key));
        }
        let start = lod_start.unwrap_or(DEFAULT_LOD_START);
        let end = lod_end.unwrap_or_else(|| start.max(DEFAULT_LOD_END));
        let range = LodRange::new(start, end)?;
        match bbox {
            Some(value) => Ok(Self::Bbox(parse_bbox(value)?, range)),
            None => Ok(Self::Range(range)),
        }
    }
}

fn parse_bbox(value: &str) -> Result<BoundingBox, CliError> {
    let invalid = || CliError::InvalidBoundingBox {
        value: value.to_owned(),
    };
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        &[min_lon, min_lat, max_lon, max_lat]
            if parts.iter().all(|part| part.is_finite()) && min_lon <= max_lon && min_lat <= max_lat =>
        {
            Ok(BoundingBox::from_bounds(min_lon, min_lat, max_lon, max_lat))
        }
        _ => Err(invalid()),
    }
}

/// Split a comma-separated list of tag keys.
pub(crate) fn parse_style_keys(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Keep everything, or only elements carrying one of `keys`.
pub(crate) fn style_for(keys: &[String]) -> Box<dyn StyleProvider> {
    if keys.is_empty() {
        Box::new(AcceptAllStyle)
    } else {
        Box::new(TagKeyStyle::new(keys.iter().cloned()))
    }
}

/// Ingest `input` into a fresh in-memory store registered as `store`.
pub(crate) fn ingest_into_memory(
    input: &Utf8Path,
    store: &str,
    scope: Scope,
    style: &dyn StyleProvider,
    cancel: &CancellationToken,
) -> Result<(GeoStore, IngestSummary), CliError> {
    let mut geo_store = GeoStore::new();
    geo_store.register_store(store, Box::new(InMemoryElementStore::new()));
    let summary = match scope {
        Scope::Tile(quad_key) => geo_store.add_path_to_tile(store, input, &quad_key, style, cancel)?,
        Scope::Range(range) => geo_store.add_path_in_range(store, input, range, style, cancel)?,
        Scope::Bbox(bbox, range) => {
            geo_store.add_path_in_bbox(store, input, &bbox, range, style, cancel)?
        }
    };
    info!(
        "ingested {} of {} elements from {input} into {store:?}",
        summary.retained, summary.offered
    );
    Ok((geo_store, summary))
}

/// Fail unless `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Whether `path` is a regular file, inspected through its parent directory
/// with capability-based IO.
fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let Some(name) = path.file_name() else {
        return Ok(false);
    };
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.metadata(name).map(|metadata| metadata.is_file())
}
