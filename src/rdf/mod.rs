//! RDF graph access.
//!
//! - **loader**: parses files or directory trees into an in-memory graph
//! - **graph**: the oxigraph-backed [`RdfGraph`]
//! - **namespaces**: prefix bindings and short-name (`prefix:local`) resolution
//!
//! Extraction code never touches oxigraph directly. It talks to the narrow
//! [`GraphStore`] capability below, which only knows how to match triple
//! patterns and shorten IRIs.

pub mod graph;
pub mod loader;
pub mod namespaces;

pub use graph::RdfGraph;
pub use loader::{LoadSummary, ParsedDocument, RdfSyntax, load_graph_from_path, parse_file};
pub use namespaces::NamespaceMap;

use anyhow::Result;
use std::fmt;

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const SH_NS: &str = "http://www.w3.org/ns/shacl#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

/// SHACL vocabulary used by the extractor, the validator and the fixture
/// generator.
pub mod sh {
    pub const NODE_SHAPE: &str = "http://www.w3.org/ns/shacl#NodeShape";
    pub const PROPERTY_SHAPE: &str = "http://www.w3.org/ns/shacl#PropertyShape";
    pub const TARGET_CLASS: &str = "http://www.w3.org/ns/shacl#targetClass";
    pub const TARGET_NODE: &str = "http://www.w3.org/ns/shacl#targetNode";
    pub const TARGET_SUBJECTS_OF: &str = "http://www.w3.org/ns/shacl#targetSubjectsOf";
    pub const TARGET_OBJECTS_OF: &str = "http://www.w3.org/ns/shacl#targetObjectsOf";
    pub const PROPERTY: &str = "http://www.w3.org/ns/shacl#property";
    pub const PATH: &str = "http://www.w3.org/ns/shacl#path";
    pub const MIN_COUNT: &str = "http://www.w3.org/ns/shacl#minCount";
    pub const MAX_COUNT: &str = "http://www.w3.org/ns/shacl#maxCount";
    pub const DATATYPE: &str = "http://www.w3.org/ns/shacl#datatype";
    pub const CLASS: &str = "http://www.w3.org/ns/shacl#class";
    pub const NODE_KIND: &str = "http://www.w3.org/ns/shacl#nodeKind";
    pub const PATTERN: &str = "http://www.w3.org/ns/shacl#pattern";
    pub const FLAGS: &str = "http://www.w3.org/ns/shacl#flags";
    pub const MIN_LENGTH: &str = "http://www.w3.org/ns/shacl#minLength";
    pub const MAX_LENGTH: &str = "http://www.w3.org/ns/shacl#maxLength";
    pub const MIN_INCLUSIVE: &str = "http://www.w3.org/ns/shacl#minInclusive";
    pub const MAX_INCLUSIVE: &str = "http://www.w3.org/ns/shacl#maxInclusive";
    pub const IN: &str = "http://www.w3.org/ns/shacl#in";
    pub const HAS_VALUE: &str = "http://www.w3.org/ns/shacl#hasValue";
    pub const UNIQUE_LANG: &str = "http://www.w3.org/ns/shacl#uniqueLang";
    pub const MESSAGE: &str = "http://www.w3.org/ns/shacl#message";
    pub const SEVERITY: &str = "http://www.w3.org/ns/shacl#severity";
    pub const DEACTIVATED: &str = "http://www.w3.org/ns/shacl#deactivated";
    pub const NAME: &str = "http://www.w3.org/ns/shacl#name";
}

/// A graph term as seen by extraction code.
///
/// Literals only keep their lexical form; nothing in the extractor looks at
/// datatypes or language tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Iri(String),
    Blank(String),
    Literal(String),
}

impl Node {
    pub fn iri(iri: impl Into<String>) -> Self {
        Node::Iri(iri.into())
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Node::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn is_resource(&self) -> bool {
        !matches!(self, Node::Literal(_))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Iri(iri) => write!(f, "<{iri}>"),
            Node::Blank(id) => write!(f, "_:{id}"),
            Node::Literal(value) => write!(f, "\"{value}\""),
        }
    }
}

/// One (subject, predicate, object) statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Statement {
    pub subject: Node,
    pub predicate: String,
    pub object: Node,
}

/// Minimal read-only graph capability needed by the entity extractor.
pub trait GraphStore {
    /// All statements matching the pattern; `None` is a wildcard.
    fn statements(
        &self,
        subject: Option<&Node>,
        predicate: Option<&str>,
        object: Option<&Node>,
    ) -> Result<Vec<Statement>>;

    /// `prefix:local` form of `iri`, or `None` when no prefix applies.
    fn short_name(&self, iri: &str) -> Option<String>;

    fn objects(&self, subject: &Node, predicate: &str) -> Result<Vec<Node>> {
        Ok(self
            .statements(Some(subject), Some(predicate), None)?
            .into_iter()
            .map(|statement| statement.object)
            .collect())
    }

    fn subjects(&self, predicate: &str, object: &Node) -> Result<Vec<Node>> {
        Ok(self
            .statements(None, Some(predicate), Some(object))?
            .into_iter()
            .map(|statement| statement.subject)
            .collect())
    }

    /// First object for `(subject, predicate)`, in a stable order.
    fn value(&self, subject: &Node, predicate: &str) -> Result<Option<Node>> {
        Ok(self.objects(subject, predicate)?.into_iter().min())
    }
}
