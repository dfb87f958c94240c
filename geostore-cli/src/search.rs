//! Search command implementation for the GeoStore CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use geostore_core::{BoundingBox, CancellationToken, Element, TermQuery};
use geostore_data::IngestSummary;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::ingest::{IngestArgs, IngestConfig};
use crate::scope::{Scope, ingest_into_memory, style_for};
use crate::{
    ARG_AND_TERMS, ARG_BBOX, ARG_INPUT, ARG_LOD_END, ARG_LOD_START, ARG_NOT_TERMS, ARG_OR_TERMS,
    ARG_QUADKEY, ARG_STORE, ARG_STYLE_KEYS, CliError, ENV_SEARCH_INPUT, write_report,
};

/// CLI arguments for the `search` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Ingest a file into an in-memory store, then list matching \
                 elements. With --quadkey the tile's contents are listed; \
                 otherwise the term query runs over --bbox (or the whole \
                 world) at the requested levels of detail.",
    about = "Ingest a geospatial file and query it"
)]
#[ortho_config(prefix = "GEOSTORE")]
pub(crate) struct SearchArgs {
    /// Path to the file to ingest.
    #[arg(long = ARG_INPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Key the in-memory store is registered under.
    #[arg(long = ARG_STORE, value_name = "key")]
    #[serde(default)]
    pub(crate) store: Option<String>,
    /// First level of detail to store and search at.
    #[arg(long = ARG_LOD_START, value_name = "level")]
    #[serde(default)]
    pub(crate) lod_start: Option<u8>,
    /// Last level of detail to store and search at.
    #[arg(long = ARG_LOD_END, value_name = "level")]
    #[serde(default)]
    pub(crate) lod_end: Option<u8>,
    /// Limit storage and search to `minlon,minlat,maxlon,maxlat`.
    #[arg(long = ARG_BBOX, value_name = "extent")]
    #[serde(default)]
    pub(crate) bbox: Option<String>,
    /// List the single tile named by these base-4 digits.
    #[arg(long = ARG_QUADKEY, value_name = "digits")]
    #[serde(default)]
    pub(crate) quadkey: Option<String>,
    /// Comma-separated tag keys; elements without any of them are dropped.
    #[arg(long = ARG_STYLE_KEYS, value_name = "keys")]
    #[serde(default)]
    pub(crate) style_keys: Option<String>,
    /// Terms every match must contain.
    #[arg(long = ARG_AND_TERMS, value_name = "terms")]
    #[serde(default)]
    pub(crate) and_terms: Option<String>,
    /// Terms of which a match must contain at least one.
    #[arg(long = ARG_OR_TERMS, value_name = "terms")]
    #[serde(default)]
    pub(crate) or_terms: Option<String>,
    /// Terms no match may contain.
    #[arg(long = ARG_NOT_TERMS, value_name = "terms")]
    #[serde(default)]
    pub(crate) not_terms: Option<String>,
}

impl SearchArgs {
    pub(crate) fn into_config(self) -> Result<SearchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SearchConfig::try_from(merged)
    }
}

/// Resolved `search` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchConfig {
    /// Input and storage settings.
    pub(crate) source: IngestConfig,
    /// Term predicate applied to results.
    pub(crate) query: TermQuery,
}

impl TryFrom<SearchArgs> for SearchConfig {
    type Error = CliError;

    fn try_from(args: SearchArgs) -> Result<Self, Self::Error> {
        let query = TermQuery::new(
            args.not_terms.as_deref().unwrap_or_default(),
            args.and_terms.as_deref().unwrap_or_default(),
            args.or_terms.as_deref().unwrap_or_default(),
        );
        let source = IngestConfig::resolve(
            IngestArgs {
                input: args.input,
                store: args.store,
                lod_start: args.lod_start,
                lod_end: args.lod_end,
                bbox: args.bbox,
                quadkey: args.quadkey,
                style_keys: args.style_keys,
            },
            ENV_SEARCH_INPUT,
        )?;
        Ok(Self { source, query })
    }
}

/// JSON report written by `geostore search`.
#[derive(Debug, Serialize)]
pub(crate) struct SearchReport {
    pub(crate) store: String,
    pub(crate) summary: IngestSummary,
    pub(crate) matches: Vec<Element>,
}

pub(crate) fn run_search_with(args: SearchArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.source.validate_sources()?;
    let report = execute_search(&config, &CancellationToken::new())?;
    write_report(writer, &report)
}

pub(crate) fn execute_search(
    config: &SearchConfig,
    cancel: &CancellationToken,
) -> Result<SearchReport, CliError> {
    let source = &config.source;
    let style = style_for(&source.style_keys);
    let (geo_store, summary) =
        ingest_into_memory(&source.input, &source.store, source.scope, style.as_ref(), cancel)?;

    let mut matches = Vec::new();
    let mut collect = |element: &Element| {
        if config.query.matches(element) {
            matches.push(element.clone());
        }
    };
    match source.scope {
        Scope::Tile(quad_key) => {
            geo_store.search_tile(&quad_key, style.as_ref(), &mut collect, cancel)?;
        }
        Scope::Range(range) => {
            geo_store.search(&config.query, &BoundingBox::world(), range, &mut collect, cancel)?;
        }
        Scope::Bbox(bbox, range) => {
            geo_store.search(&config.query, &bbox, range, &mut collect, cancel)?;
        }
    }
    Ok(SearchReport {
        store: source.store.clone(),
        summary,
        matches,
    })
}
