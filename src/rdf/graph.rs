//! In-memory graph backed by an oxigraph [`Store`].

use crate::rdf::loader::{ParsedDocument, RdfSyntax, parse_reader};
use crate::rdf::namespaces::NamespaceMap;
use crate::rdf::{GraphStore, Node, Statement};
use anyhow::Result;
use oxigraph::model::{BlankNode, Literal, NamedNode, NamedOrBlankNode, Quad, Term};
use oxigraph::store::Store;
use std::cell::RefCell;

/// Triples loaded for one run plus the namespace bindings seen while loading.
pub struct RdfGraph {
    store: Store,
    namespaces: RefCell<NamespaceMap>,
}

impl std::fmt::Debug for RdfGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RdfGraph")
            .field("namespaces", &self.namespaces)
            .finish_non_exhaustive()
    }
}

impl RdfGraph {
    pub fn new(namespaces: NamespaceMap) -> Result<Self> {
        Ok(Self {
            store: Store::new()?,
            namespaces: RefCell::new(namespaces),
        })
    }

    /// Parse `content` into a new graph with the default namespace bindings.
    pub fn parse(content: &str, syntax: RdfSyntax) -> Result<Self> {
        let graph = Self::new(NamespaceMap::with_defaults())?;
        graph.insert_document(parse_reader(content.as_bytes(), syntax, None)?)?;
        Ok(graph)
    }

    pub fn from_turtle(content: &str) -> Result<Self> {
        Self::parse(content, RdfSyntax::Turtle)
    }

    /// Insert a fully parsed document and bind its prefixes.
    pub fn insert_document(&self, document: ParsedDocument) -> Result<()> {
        for quad in &document.quads {
            self.store.insert(quad.as_ref())?;
        }
        let mut namespaces = self.namespaces.borrow_mut();
        for (prefix, namespace) in &document.prefixes {
            namespaces.bind_declared(prefix, namespace);
        }
        Ok(())
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.store.len()?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.store.is_empty()?)
    }

    /// Snapshot of the current namespace bindings.
    pub fn namespaces(&self) -> NamespaceMap {
        self.namespaces.borrow().clone()
    }

    /// Every quad in the store, sorted for stable comparisons.
    pub fn sorted_quads(&self) -> Result<Vec<Quad>> {
        let mut quads = self.store.iter().collect::<Result<Vec<_>, _>>()?;
        quads.sort_by_key(|quad| quad.to_string());
        Ok(quads)
    }
}

impl GraphStore for RdfGraph {
    fn statements(
        &self,
        subject: Option<&Node>,
        predicate: Option<&str>,
        object: Option<&Node>,
    ) -> Result<Vec<Statement>> {
        let subject = match subject {
            Some(node) => match resource_from_node(node)? {
                Some(resource) => Some(resource),
                None => return Ok(Vec::new()),
            },
            None => None,
        };
        let predicate = predicate.map(|iri| NamedNode::new(iri)).transpose()?;
        let object = object.map(term_from_node).transpose()?;

        let mut statements = Vec::new();
        for quad in self.store.quads_for_pattern(
            subject.as_ref().map(|s| s.as_ref()),
            predicate.as_ref().map(|p| p.as_ref()),
            object.as_ref().map(|o| o.as_ref()),
            None,
        ) {
            let quad = quad?;
            let Some(object) = node_from_term(&quad.object) else {
                continue;
            };
            statements.push(Statement {
                subject: node_from_resource(&quad.subject),
                predicate: quad.predicate.as_str().to_string(),
                object,
            });
        }
        Ok(statements)
    }

    fn short_name(&self, iri: &str) -> Option<String> {
        self.namespaces.borrow_mut().compute_short_name(iri)
    }
}

fn resource_from_node(node: &Node) -> Result<Option<NamedOrBlankNode>> {
    Ok(match node {
        Node::Iri(iri) => Some(NamedNode::new(iri.as_str())?.into()),
        Node::Blank(id) => Some(BlankNode::new(id.as_str())?.into()),
        Node::Literal(_) => None,
    })
}

fn term_from_node(node: &Node) -> Result<Term> {
    Ok(match node {
        Node::Iri(iri) => NamedNode::new(iri.as_str())?.into(),
        Node::Blank(id) => BlankNode::new(id.as_str())?.into(),
        Node::Literal(value) => Literal::new_simple_literal(value.as_str()).into(),
    })
}

fn node_from_resource(resource: &NamedOrBlankNode) -> Node {
    match resource {
        NamedOrBlankNode::NamedNode(node) => Node::Iri(node.as_str().to_string()),
        NamedOrBlankNode::BlankNode(node) => Node::Blank(node.as_str().to_string()),
    }
}

#[allow(unreachable_patterns)]
fn node_from_term(term: &Term) -> Option<Node> {
    match term {
        Term::NamedNode(node) => Some(Node::Iri(node.as_str().to_string())),
        Term::BlankNode(node) => Some(Node::Blank(node.as_str().to_string())),
        Term::Literal(literal) => Some(Node::Literal(literal.value().to_string())),
        _ => None,
    }
}
