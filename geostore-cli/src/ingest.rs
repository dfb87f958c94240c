//! Ingest command implementation for the GeoStore CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use geostore_core::CancellationToken;
use geostore_data::IngestSummary;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::scope::{DEFAULT_STORE, Scope, ingest_into_memory, parse_style_keys, require_existing, style_for};
use crate::{
    ARG_BBOX, ARG_INPUT, ARG_LOD_END, ARG_LOD_START, ARG_QUADKEY, ARG_STORE, ARG_STYLE_KEYS,
    CliError, ENV_INGEST_INPUT, write_report,
};

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Ingest a shapefile or an OpenStreetMap extract into an \
                 in-memory tiled store. The format is chosen from the file \
                 suffix (pbf, xml, json; anything else is a shapefile). \
                 Options can come from CLI flags, configuration files, or \
                 environment variables.",
    about = "Ingest a geospatial file and report what was stored"
)]
#[ortho_config(prefix = "GEOSTORE")]
pub(crate) struct IngestArgs {
    /// Path to the file to ingest.
    #[arg(long = ARG_INPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Key the in-memory store is registered under.
    #[arg(long = ARG_STORE, value_name = "key")]
    #[serde(default)]
    pub(crate) store: Option<String>,
    /// First level of detail to store at.
    #[arg(long = ARG_LOD_START, value_name = "level")]
    #[serde(default)]
    pub(crate) lod_start: Option<u8>,
    /// Last level of detail to store at.
    #[arg(long = ARG_LOD_END, value_name = "level")]
    #[serde(default)]
    pub(crate) lod_end: Option<u8>,
    /// Limit storage to `minlon,minlat,maxlon,maxlat`.
    #[arg(long = ARG_BBOX, value_name = "extent")]
    #[serde(default)]
    pub(crate) bbox: Option<String>,
    /// Store everything in the single tile named by these base-4 digits.
    #[arg(long = ARG_QUADKEY, value_name = "digits")]
    #[serde(default)]
    pub(crate) quadkey: Option<String>,
    /// Comma-separated tag keys; elements without any of them are dropped.
    #[arg(long = ARG_STYLE_KEYS, value_name = "keys")]
    #[serde(default)]
    pub(crate) style_keys: Option<String>,
}

impl IngestArgs {
    pub(crate) fn into_config(self) -> Result<IngestConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IngestConfig::try_from(merged)
    }
}

/// Resolved `ingest` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IngestConfig {
    /// File to ingest.
    pub(crate) input: Utf8PathBuf,
    /// Store key.
    pub(crate) store: String,
    /// Where elements are written.
    pub(crate) scope: Scope,
    /// Tag keys selecting retained elements; empty keeps everything.
    pub(crate) style_keys: Vec<String>,
}

impl IngestConfig {
    /// Build a configuration, naming `input_env` when the input is missing.
    pub(crate) fn resolve(args: IngestArgs, input_env: &'static str) -> Result<Self, CliError> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: input_env,
        })?;
        let scope = Scope::resolve(
            args.lod_start,
            args.lod_end,
            args.bbox.as_deref(),
            args.quadkey.as_deref(),
        )?;
        Ok(Self {
            input,
            store: args.store.unwrap_or_else(|| DEFAULT_STORE.to_owned()),
            scope,
            style_keys: parse_style_keys(args.style_keys.as_deref()),
        })
    }

    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.input, ARG_INPUT)
    }
}

impl TryFrom<IngestArgs> for IngestConfig {
    type Error = CliError;

    fn try_from(args: IngestArgs) -> Result<Self, Self::Error> {
        Self::resolve(args, ENV_INGEST_INPUT)
    }
}

/// JSON report written by `geostore ingest`.
#[derive(Debug, Serialize)]
pub(crate) struct IngestReport {
    pub(crate) store: String,
    pub(crate) summary: IngestSummary,
    /// Whether the target tile holds data afterwards; tile scope only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) has_data: Option<bool>,
}

pub(crate) fn run_ingest_with(args: IngestArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let report = execute_ingest(&config, &CancellationToken::new())?;
    write_report(writer, &report)
}

pub(crate) fn execute_ingest(
    config: &IngestConfig,
    cancel: &CancellationToken,
) -> Result<IngestReport, CliError> {
    let style = style_for(&config.style_keys);
    let (geo_store, summary) =
        ingest_into_memory(&config.input, &config.store, config.scope, style.as_ref(), cancel)?;
    let has_data = match config.scope {
        Scope::Tile(quad_key) => Some(geo_store.has_data(&quad_key)),
        Scope::Range(_) | Scope::Bbox(..) => None,
    };
    Ok(IngestReport {
        store: config.store.clone(),
        summary,
        has_data,
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<IngestConfig, CliError> {
    let merged = IngestArgs::merge_from_layers(layers).map_err(CliError::from)?;
    IngestConfig::try_from(merged)
}
