//! Tooling for the DCAT-AP-LU metadata schema: entity extraction and coverage
//! reports over RDF and SHACL, UML/XMI entity extraction, SHACL validation and
//! draft fixture generation.

pub mod commands;
pub mod config;
pub mod coverage;
pub mod entities;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod rdf;
pub mod report;
pub mod shacl;
pub mod uml;

pub use config::{CliArgs, Command, ToolConfig};
pub use coverage::CoverageResult;
pub use entities::{EntityExtractor, EntityInventory, ExtractionMode, PropertyUsage};
pub use error::{ToolError, find_tool_error};
pub use logging::{LoggingConfig, init_logging};
pub use normalize::PrefixNormalizer;
pub use rdf::{GraphStore, RdfGraph, load_graph_from_path};

use anyhow::Result;
use std::io::Write;

/// Resolve configuration for `args` and run its subcommand, writing report
/// output to `out`.
pub fn run(args: CliArgs, out: &mut dyn Write) -> Result<()> {
    let config = ToolConfig::from_args(&args)?;
    tracing::debug!(?config, "configuration resolved");
    commands::dispatch(&args.command, &config, out)?;
    out.flush()?;
    Ok(())
}
