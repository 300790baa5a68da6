//! Loading RDF files and directory trees.
//!
//! A single file must parse. In a directory, files that fail to parse are
//! logged and skipped; a failing file contributes no triples because every
//! document is parsed to completion before anything is inserted.

use crate::error::ToolError;
use crate::rdf::graph::RdfGraph;
use crate::rdf::namespaces::NamespaceMap;
use anyhow::{Context, Result};
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{NamedNode, Quad};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Serializations understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfSyntax {
    Turtle,
    RdfXml,
    NTriples,
    N3,
    JsonLd,
}

impl RdfSyntax {
    /// Guess the syntax from a file extension. Unknown extensions are treated
    /// as RDF/XML.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "ttl" => RdfSyntax::Turtle,
            "rdf" => RdfSyntax::RdfXml,
            "nt" => RdfSyntax::NTriples,
            "n3" => RdfSyntax::N3,
            "jsonld" => RdfSyntax::JsonLd,
            _ => RdfSyntax::RdfXml,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RdfSyntax::Turtle => "turtle",
            RdfSyntax::RdfXml => "xml",
            RdfSyntax::NTriples => "nt",
            RdfSyntax::N3 => "n3",
            RdfSyntax::JsonLd => "json-ld",
        }
    }

    fn format(&self) -> Result<RdfFormat> {
        Ok(match self {
            RdfSyntax::Turtle => RdfFormat::Turtle,
            RdfSyntax::RdfXml => RdfFormat::RdfXml,
            RdfSyntax::NTriples => RdfFormat::NTriples,
            RdfSyntax::N3 => RdfFormat::N3,
            RdfSyntax::JsonLd => RdfFormat::from_extension("jsonld")
                .context("JSON-LD is not supported by this build of oxigraph")?,
        })
    }
}

impl fmt::Display for RdfSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything one document contributed: its quads and prefix declarations.
#[derive(Debug, Default)]
pub struct ParsedDocument {
    pub quads: Vec<Quad>,
    pub prefixes: Vec<(String, String)>,
}

/// Outcome of a load.
#[derive(Debug, Default, Clone)]
pub struct LoadSummary {
    pub loaded: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
    pub triples: usize,
}

impl LoadSummary {
    pub fn has_skipped(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Parse a whole document from `reader`.
pub fn parse_reader(
    reader: impl Read,
    syntax: RdfSyntax,
    base_iri: Option<&str>,
) -> Result<ParsedDocument> {
    let mut parser = RdfParser::from_format(syntax.format()?);
    if let Some(base) = base_iri {
        parser = parser
            .with_base_iri(base)
            .with_context(|| format!("invalid base IRI {base}"))?;
    }

    let mut document_parser = parser.for_reader(reader);
    let mut quads = Vec::new();
    for quad in &mut document_parser {
        quads.push(quad?);
    }
    let prefixes = document_parser
        .prefixes()
        .map(|(prefix, namespace)| (prefix.to_string(), namespace.to_string()))
        .collect();

    Ok(ParsedDocument { quads, prefixes })
}

/// Parse one file, guessing its syntax from the extension.
pub fn parse_file(path: &Path) -> Result<ParsedDocument, ToolError> {
    let syntax = RdfSyntax::from_path(path);
    let file = File::open(path).map_err(|e| ToolError::parse(path, e))?;
    let base = file_base_iri(path);
    debug!(path = %path.display(), syntax = %syntax, "parsing RDF file");
    parse_reader(BufReader::new(file), syntax, base.as_deref())
        .map_err(|e| ToolError::parse(path, format!("{e:#}")))
}

/// Load a file or a directory tree into a fresh graph.
pub fn load_graph_from_path(
    path: &Path,
    namespaces: NamespaceMap,
) -> Result<(RdfGraph, LoadSummary)> {
    let graph = RdfGraph::new(namespaces)?;
    let mut summary = LoadSummary::default();

    if path.is_file() {
        let document = parse_file(path)?;
        graph.insert_document(document)?;
        summary.loaded.push(path.to_path_buf());
    } else if path.is_dir() {
        for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    let at = error
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| path.to_path_buf());
                    warn!(path = %at.display(), %error, "failed to read directory entry, skipping");
                    summary.skipped.push((at, error.to_string()));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match parse_file(entry.path()) {
                Ok(document) => {
                    graph.insert_document(document)?;
                    summary.loaded.push(entry.path().to_path_buf());
                }
                Err(error) => {
                    warn!(path = %entry.path().display(), %error, "failed to parse file, skipping");
                    summary
                        .skipped
                        .push((entry.path().to_path_buf(), error.to_string()));
                }
            }
        }
    } else {
        return Err(ToolError::InvalidInput {
            path: path.to_path_buf(),
        }
        .into());
    }

    summary.triples = graph.len()?;
    info!(
        path = %path.display(),
        files = summary.loaded.len(),
        skipped = summary.skipped.len(),
        triples = summary.triples,
        "graph loaded"
    );
    Ok((graph, summary))
}

fn file_base_iri(path: &Path) -> Option<String> {
    let absolute = std::path::absolute(path).ok()?;
    let candidate = format!("file://{}", absolute.to_str()?);
    NamedNode::new(candidate.as_str()).ok()?;
    Some(candidate)
}
