//! Ingestion dispatcher.
//!
//! [`ingest_path`] detects a file's format, drives the matching parser and
//! hands each decoded [`Element`] to a caller-supplied callback. It never
//! touches a store itself.

use std::path::{Path, PathBuf};

use geostore_core::{BoundingBox, CancellationToken, Element, StoreError};
use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::{FormatType, detect_format};

#[cfg(any(feature = "osm-xml", feature = "osm-json", feature = "osm-pbf"))]
mod ids;
mod intake;
#[cfg(feature = "osm-json")]
mod json;
#[cfg(any(feature = "osm-xml", feature = "osm-json", feature = "osm-pbf"))]
mod osm;
#[cfg(feature = "osm-pbf")]
mod pbf;
#[cfg(feature = "shape")]
mod shape;
#[cfg(feature = "osm-xml")]
mod xml;

pub(crate) use intake::ElementIntake;

/// Callback receiving each decoded element; returns whether it was retained.
pub type ElementSink<'a> = dyn FnMut(&Element) -> Result<bool, StoreError> + 'a;

/// Outcome of one ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSummary {
    /// Format the input was parsed as.
    pub format: FormatType,
    /// Extent of every element offered to the callback.
    pub bounds: BoundingBox,
    /// Number of elements offered to the callback.
    pub offered: u64,
    /// Number of elements the callback reported as retained.
    pub retained: u64,
    /// Whether the run stopped because the token was cancelled.
    pub cancelled: bool,
}

/// Decoding failures surfaced by the format parsers.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Reading the input failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The OSM JSON document was invalid.
    #[cfg(feature = "osm-json")]
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The OSM XML document was invalid.
    #[cfg(feature = "osm-xml")]
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    /// An OSM XML attribute was invalid.
    #[cfg(feature = "osm-xml")]
    #[error(transparent)]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),
    /// The OSM PBF data was invalid.
    #[cfg(feature = "osm-pbf")]
    #[error(transparent)]
    Pbf(#[from] osmpbf::Error),
    /// The shapefile or its attribute table was invalid.
    #[cfg(feature = "shape")]
    #[error(transparent)]
    Shape(#[from] shapefile::Error),
    /// A value was missing or could not be interpreted.
    #[error("malformed {what}: {detail}")]
    Malformed {
        /// The part of the document that was malformed.
        what: &'static str,
        /// Description of the problem.
        detail: String,
    },
}

/// Errors returned by [`ingest_path`].
#[derive(Debug, Error)]
pub enum IngestError {
    /// No parser for the detected format was compiled into this build.
    #[error("no {format} parser is available for {path:?}")]
    UnsupportedFormat {
        /// Detected format.
        format: FormatType,
        /// Input path.
        path: PathBuf,
    },
    /// The input could not be opened.
    #[error("failed to open {format} input at {path:?}: {source}")]
    Open {
        /// Detected format.
        format: FormatType,
        /// Input path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: ParseError,
    },
    /// The input could not be decoded.
    #[error("failed to decode {format} input at {path:?}: {source}")]
    Decode {
        /// Detected format.
        format: FormatType,
        /// Input path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: ParseError,
    },
    /// The element callback failed.
    #[error("element callback failed: {0}")]
    Sink(#[source] StoreError),
}

impl IngestError {
    pub(crate) fn open(format: FormatType, path: &Path, source: impl Into<ParseError>) -> Self {
        Self::Open {
            format,
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub(crate) fn decode(format: FormatType, path: &Path, source: impl Into<ParseError>) -> Self {
        Self::Decode {
            format,
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

/// Parse `path` and offer every decoded element to `on_element`.
///
/// The token is polled between elements. Cancellation stops parsing without
/// an error and the summary gathered so far is returned with
/// `cancelled = true`. Elements are offered in parser emission order, one at a
/// time, without buffering on this side of the callback.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use geostore_core::{CancellationToken, Element};
/// use geostore_data::ingest_path;
///
/// # fn main() -> Result<(), geostore_data::IngestError> {
/// let mut names = Vec::new();
/// let summary = ingest_path(
///     Path::new("berlin.osm.pbf"),
///     &CancellationToken::new(),
///     &mut |element: &Element| {
///         names.extend(element.tag("name").map(str::to_owned));
///         Ok(true)
///     },
/// )?;
/// println!("{} elements within {:?}", summary.offered, summary.bounds);
/// # Ok(())
/// # }
/// ```
pub fn ingest_path(
    path: &Path,
    cancel: &CancellationToken,
    on_element: &mut ElementSink<'_>,
) -> Result<IngestSummary, IngestError> {
    let format = detect_format(path);
    debug!("ingesting {path:?} as {format}");
    let mut intake = ElementIntake::new(format, cancel, on_element);
    match format {
        #[cfg(feature = "shape")]
        FormatType::Shape => shape::parse(path, &mut intake)?,
        #[cfg(feature = "osm-xml")]
        FormatType::Xml => xml::parse(path, &mut intake)?,
        #[cfg(feature = "osm-pbf")]
        FormatType::Pbf => pbf::parse(path, &mut intake)?,
        #[cfg(feature = "osm-json")]
        FormatType::Json => json::parse(path, &mut intake)?,
        #[cfg(not(all(
            feature = "shape",
            feature = "osm-xml",
            feature = "osm-pbf",
            feature = "osm-json"
        )))]
        unsupported => {
            return Err(IngestError::UnsupportedFormat {
                format: unsupported,
                path: path.to_path_buf(),
            });
        }
    }
    Ok(intake.complete())
}
