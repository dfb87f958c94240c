//! Command-line interface for loading geospatial files into GeoStore and
//! querying them.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use serde::Serialize;

mod error;
mod ingest;
mod scope;
mod search;

pub use error::CliError;
use ingest::{IngestArgs, run_ingest_with};
use search::{SearchArgs, run_search_with};

pub(crate) const ARG_INPUT: &str = "input";
pub(crate) const ARG_STORE: &str = "store";
pub(crate) const ARG_LOD_START: &str = "lod-start";
pub(crate) const ARG_LOD_END: &str = "lod-end";
pub(crate) const ARG_BBOX: &str = "bbox";
pub(crate) const ARG_QUADKEY: &str = "quadkey";
pub(crate) const ARG_STYLE_KEYS: &str = "style-keys";
pub(crate) const ARG_AND_TERMS: &str = "and-terms";
pub(crate) const ARG_OR_TERMS: &str = "or-terms";
pub(crate) const ARG_NOT_TERMS: &str = "not-terms";
pub(crate) const ENV_INGEST_INPUT: &str = "GEOSTORE_CMDS_INGEST_INPUT";
pub(crate) const ENV_SEARCH_INPUT: &str = "GEOSTORE_CMDS_SEARCH_INPUT";

/// Run the GeoStore CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_command(cli.command, &mut stdout)
}

fn run_command(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Ingest(args) => run_ingest_with(args, writer),
        Command::Search(args) => run_search_with(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "geostore",
    about = "Load geospatial files into tiled element stores and query them",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ingest a shapefile or OSM extract and report what was stored.
    Ingest(IngestArgs),
    /// Ingest a file, then list the elements matching a tile or term query.
    Search(SearchArgs),
}

fn write_report<T: Serialize>(writer: &mut dyn Write, report: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(report).map_err(CliError::SerialiseReport)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
