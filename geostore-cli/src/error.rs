//! Error types emitted by the GeoStore CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use geostore_core::{LodRangeError, QuadKeyError};
use geostore_data::GeoStoreError;
use thiserror::Error;

/// Errors emitted by the GeoStore CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Both a tile and a bounding box were requested.
    #[error("--bbox and --quadkey cannot be combined")]
    ConflictingScope,
    /// The bounding box was not four comma-separated coordinates.
    #[error("invalid bounding box {value:?} (expected minlon,minlat,maxlon,maxlat)")]
    InvalidBoundingBox { value: String },
    /// The quadkey could not be parsed.
    #[error("invalid quadkey {value:?}: {source}")]
    InvalidQuadKey {
        value: String,
        #[source]
        source: QuadKeyError,
    },
    /// The level-of-detail bounds were rejected.
    #[error("invalid level-of-detail range: {0}")]
    InvalidLevels(#[from] LodRangeError),
    /// Ingestion or querying failed.
    #[error(transparent)]
    GeoStore(#[from] GeoStoreError),
    /// Serialising the report failed.
    #[error("failed to serialise report: {0}")]
    SerialiseReport(#[source] serde_json::Error),
    /// Writing the report failed.
    #[error("failed to write report: {0}")]
    WriteOutput(#[source] std::io::Error),
}
