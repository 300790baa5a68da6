//! Reading node and property shapes out of a shapes graph.

use crate::rdf::{RDF_NS, RDF_TYPE, sh};
use crate::shacl::report::Severity;
use anyhow::{Context, Result};
use oxigraph::model::{Literal, NamedNode, NamedOrBlankNode, Term};
use oxigraph::store::Store;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Iri,
    BlankNode,
    Literal,
    BlankNodeOrIri,
    BlankNodeOrLiteral,
    IriOrLiteral,
}

impl NodeKind {
    pub fn from_iri(iri: &str) -> Option<Self> {
        Some(match iri.strip_prefix(crate::rdf::SH_NS)? {
            "IRI" => NodeKind::Iri,
            "BlankNode" => NodeKind::BlankNode,
            "Literal" => NodeKind::Literal,
            "BlankNodeOrIRI" => NodeKind::BlankNodeOrIri,
            "BlankNodeOrLiteral" => NodeKind::BlankNodeOrLiteral,
            "IRIOrLiteral" => NodeKind::IriOrLiteral,
            _ => return None,
        })
    }

    pub fn matches(&self, term: &Term) -> bool {
        let (iri, blank, literal) = match term {
            Term::NamedNode(_) => (true, false, false),
            Term::BlankNode(_) => (false, true, false),
            Term::Literal(_) => (false, false, true),
            #[allow(unreachable_patterns)]
            _ => (false, false, false),
        };
        match self {
            NodeKind::Iri => iri,
            NodeKind::BlankNode => blank,
            NodeKind::Literal => literal,
            NodeKind::BlankNodeOrIri => blank || iri,
            NodeKind::BlankNodeOrLiteral => blank || literal,
            NodeKind::IriOrLiteral => iri || literal,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Iri => "sh:IRI",
            NodeKind::BlankNode => "sh:BlankNode",
            NodeKind::Literal => "sh:Literal",
            NodeKind::BlankNodeOrIri => "sh:BlankNodeOrIRI",
            NodeKind::BlankNodeOrLiteral => "sh:BlankNodeOrLiteral",
            NodeKind::IriOrLiteral => "sh:IRIOrLiteral",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PropertyShape {
    pub id: NamedOrBlankNode,
    pub path: NamedNode,
    pub datatype: Option<NamedNode>,
    pub class: Option<NamedNode>,
    pub node_kind: Option<NodeKind>,
    pub min_count: Option<usize>,
    pub max_count: Option<usize>,
    pub pattern: Option<Regex>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_inclusive: Option<Literal>,
    pub max_inclusive: Option<Literal>,
    pub in_values: Vec<Term>,
    pub has_value: Option<Term>,
    pub unique_lang: bool,
    pub message: Option<String>,
    pub severity: Option<Severity>,
}

impl PropertyShape {
    fn new(id: NamedOrBlankNode, path: NamedNode) -> Self {
        Self {
            id,
            path,
            datatype: None,
            class: None,
            node_kind: None,
            min_count: None,
            max_count: None,
            pattern: None,
            min_length: None,
            max_length: None,
            min_inclusive: None,
            max_inclusive: None,
            in_values: Vec::new(),
            has_value: None,
            unique_lang: false,
            message: None,
            severity: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeShape {
    pub id: NamedOrBlankNode,
    pub target_classes: Vec<NamedNode>,
    pub target_nodes: Vec<Term>,
    pub target_subjects_of: Vec<NamedNode>,
    pub target_objects_of: Vec<NamedNode>,
    pub properties: Vec<PropertyShape>,
    pub severity: Severity,
}

impl NodeShape {
    fn new(id: NamedOrBlankNode) -> Self {
        Self {
            id,
            target_classes: Vec::new(),
            target_nodes: Vec::new(),
            target_subjects_of: Vec::new(),
            target_objects_of: Vec::new(),
            properties: Vec::new(),
            severity: Severity::Violation,
        }
    }

    pub fn has_targets(&self) -> bool {
        !(self.target_classes.is_empty()
            && self.target_nodes.is_empty()
            && self.target_subjects_of.is_empty()
            && self.target_objects_of.is_empty())
    }
}

/// Finds shapes in a shapes store.
pub struct ShapeDiscovery<'a> {
    shapes_store: &'a Store,
}

impl<'a> ShapeDiscovery<'a> {
    pub fn new(shapes_store: &'a Store) -> Self {
        Self { shapes_store }
    }

    /// Every active node shape, sorted by identifier. A node shape is a
    /// subject typed `sh:NodeShape` or one that declares a target.
    pub fn node_shapes(&self) -> Result<Vec<NodeShape>> {
        let mut ids: Vec<NamedOrBlankNode> = Vec::new();
        let mut seen = HashSet::new();
        let rdf_type = NamedNode::new_unchecked(RDF_TYPE);
        let node_shape = NamedNode::new_unchecked(sh::NODE_SHAPE);

        for quad in self.shapes_store.quads_for_pattern(
            None,
            Some(rdf_type.as_ref()),
            Some(node_shape.as_ref().into()),
            None,
        ) {
            let quad = quad?;
            if seen.insert(quad.subject.clone()) {
                ids.push(quad.subject);
            }
        }
        for target in [
            sh::TARGET_CLASS,
            sh::TARGET_NODE,
            sh::TARGET_SUBJECTS_OF,
            sh::TARGET_OBJECTS_OF,
        ] {
            let predicate = NamedNode::new_unchecked(target);
            for quad in self
                .shapes_store
                .quads_for_pattern(None, Some(predicate.as_ref()), None, None)
            {
                let quad = quad?;
                if seen.insert(quad.subject.clone()) {
                    ids.push(quad.subject);
                }
            }
        }
        ids.sort_by_key(|id| id.to_string());

        let mut shapes = Vec::new();
        for id in ids {
            if self.is_deactivated(&id)? {
                continue;
            }
            shapes.push(self.load_node_shape(id)?);
        }
        Ok(shapes)
    }

    fn load_node_shape(&self, id: NamedOrBlankNode) -> Result<NodeShape> {
        let mut shape = NodeShape::new(id.clone());

        if let Some(Term::NamedNode(severity)) = self.get_object(&id, sh::SEVERITY)? {
            shape.severity = Severity::from_iri(severity.as_str());
        }
        shape.target_classes = self.get_named_node_values(&id, sh::TARGET_CLASS)?;
        shape.target_nodes = self.get_objects(&id, sh::TARGET_NODE)?;
        shape.target_subjects_of = self.get_named_node_values(&id, sh::TARGET_SUBJECTS_OF)?;
        shape.target_objects_of = self.get_named_node_values(&id, sh::TARGET_OBJECTS_OF)?;

        let mut properties = self.get_objects(&id, sh::PROPERTY)?;
        properties.sort_by_key(|term| term.to_string());
        for object in properties {
            let Some(property_id) = resource(&object) else {
                continue;
            };
            if self.is_deactivated(&property_id)? {
                continue;
            }
            if let Some(property) = self.load_property_shape(property_id)? {
                shape.properties.push(property);
            }
        }
        Ok(shape)
    }

    /// Property shapes without an IRI `sh:path` are ignored.
    pub fn load_property_shape(&self, id: NamedOrBlankNode) -> Result<Option<PropertyShape>> {
        let path = match self.get_object(&id, sh::PATH)? {
            Some(Term::NamedNode(path)) => path,
            _ => return Ok(None),
        };
        let mut prop = PropertyShape::new(id.clone(), path);

        prop.datatype = self.get_named_node_value(&id, sh::DATATYPE)?;
        prop.class = self.get_named_node_value(&id, sh::CLASS)?;
        prop.node_kind = self
            .get_named_node_value(&id, sh::NODE_KIND)?
            .and_then(|kind| NodeKind::from_iri(kind.as_str()));
        prop.min_count = self.get_count_value(&id, sh::MIN_COUNT)?;
        prop.max_count = self.get_count_value(&id, sh::MAX_COUNT)?;
        prop.min_length = self.get_count_value(&id, sh::MIN_LENGTH)?;
        prop.max_length = self.get_count_value(&id, sh::MAX_LENGTH)?;
        prop.min_inclusive = self.get_literal_value(&id, sh::MIN_INCLUSIVE)?;
        prop.max_inclusive = self.get_literal_value(&id, sh::MAX_INCLUSIVE)?;
        prop.message = self.get_string_value(&id, sh::MESSAGE)?;
        prop.has_value = self.get_object(&id, sh::HAS_VALUE)?;

        if let Some(pattern) = self.get_string_value(&id, sh::PATTERN)? {
            let flags = self.get_string_value(&id, sh::FLAGS)?.unwrap_or_default();
            let regex = RegexBuilder::new(&pattern)
                .case_insensitive(flags.contains('i'))
                .multi_line(flags.contains('m'))
                .dot_matches_new_line(flags.contains('s'))
                .ignore_whitespace(flags.contains('x'))
                .build()
                .with_context(|| format!("invalid sh:pattern '{pattern}' on shape {id}"))?;
            prop.pattern = Some(regex);
        }

        if let Some(list_head) = self.get_object(&id, sh::IN)? {
            prop.in_values = self.parse_rdf_list(&list_head)?;
        }

        if let Some(unique_lang) = self.get_boolean_value(&id, sh::UNIQUE_LANG)? {
            prop.unique_lang = unique_lang;
        }

        if let Some(Term::NamedNode(severity)) = self.get_object(&id, sh::SEVERITY)? {
            prop.severity = Some(Severity::from_iri(severity.as_str()));
        }

        Ok(Some(prop))
    }

    fn is_deactivated(&self, id: &NamedOrBlankNode) -> Result<bool> {
        Ok(self.get_boolean_value(id, sh::DEACTIVATED)?.unwrap_or(false))
    }

    /// First object in a stable order, so repeated loads agree.
    fn get_object(&self, subject: &NamedOrBlankNode, predicate_iri: &str) -> Result<Option<Term>> {
        let mut objects = self.get_objects(subject, predicate_iri)?;
        objects.sort_by_key(|term| term.to_string());
        Ok(objects.into_iter().next())
    }

    fn get_objects(&self, subject: &NamedOrBlankNode, predicate_iri: &str) -> Result<Vec<Term>> {
        let predicate = NamedNode::new_unchecked(predicate_iri);
        let mut values = Vec::new();
        for quad in self.shapes_store.quads_for_pattern(
            Some(subject.as_ref()),
            Some(predicate.as_ref()),
            None,
            None,
        ) {
            values.push(quad?.object);
        }
        Ok(values)
    }

    fn get_string_value(
        &self,
        subject: &NamedOrBlankNode,
        predicate_iri: &str,
    ) -> Result<Option<String>> {
        if let Some(Term::Literal(lit)) = self.get_object(subject, predicate_iri)? {
            Ok(Some(lit.value().to_string()))
        } else {
            Ok(None)
        }
    }

    fn get_count_value(
        &self,
        subject: &NamedOrBlankNode,
        predicate_iri: &str,
    ) -> Result<Option<usize>> {
        match self.get_string_value(subject, predicate_iri)? {
            Some(s) => Ok(Some(s.trim().parse::<usize>().with_context(|| {
                format!("failed to parse {predicate_iri} value '{s}' on shape {subject}")
            })?)),
            None => Ok(None),
        }
    }

    fn get_boolean_value(
        &self,
        subject: &NamedOrBlankNode,
        predicate_iri: &str,
    ) -> Result<Option<bool>> {
        match self.get_object(subject, predicate_iri)? {
            Some(Term::Literal(lit)) => {
                let value = match lit.value() {
                    "true" | "1" => true,
                    "false" | "0" => false,
                    other => {
                        return Err(anyhow::anyhow!(
                            "invalid boolean '{other}' for {predicate_iri} on shape {subject}"
                        ));
                    }
                };
                Ok(Some(value))
            }
            _ => Ok(None),
        }
    }

    fn get_named_node_value(
        &self,
        subject: &NamedOrBlankNode,
        predicate_iri: &str,
    ) -> Result<Option<NamedNode>> {
        if let Some(Term::NamedNode(node)) = self.get_object(subject, predicate_iri)? {
            Ok(Some(node))
        } else {
            Ok(None)
        }
    }

    fn get_named_node_values(
        &self,
        subject: &NamedOrBlankNode,
        predicate_iri: &str,
    ) -> Result<Vec<NamedNode>> {
        let mut values: Vec<NamedNode> = self
            .get_objects(subject, predicate_iri)?
            .into_iter()
            .filter_map(|term| match term {
                Term::NamedNode(node) => Some(node),
                _ => None,
            })
            .collect();
        values.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(values)
    }

    fn get_literal_value(
        &self,
        subject: &NamedOrBlankNode,
        predicate_iri: &str,
    ) -> Result<Option<Literal>> {
        if let Some(Term::Literal(lit)) = self.get_object(subject, predicate_iri)? {
            Ok(Some(lit))
        } else {
            Ok(None)
        }
    }

    fn parse_rdf_list(&self, head: &Term) -> Result<Vec<Term>> {
        let first = format!("{RDF_NS}first");
        let rest = format!("{RDF_NS}rest");
        let mut values = Vec::new();
        let mut visited = HashSet::new();
        let mut current = head.clone();

        while let Some(node) = resource(&current) {
            if !visited.insert(node.clone()) {
                break;
            }
            if let Some(value) = self.get_object(&node, &first)? {
                values.push(value);
            }
            match self.get_object(&node, &rest)? {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(values)
    }
}

/// The term as a subject, when it can be one.
pub fn resource(term: &Term) -> Option<NamedOrBlankNode> {
    match term {
        Term::NamedNode(node) => Some(node.clone().into()),
        Term::BlankNode(node) => Some(node.clone().into()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::RdfGraph;

    const SHAPES: &str = r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix dcat: <http://www.w3.org/ns/dcat#> .
        @prefix dct: <http://purl.org/dc/terms/> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
        @prefix ex: <http://example.org/shapes#> .

        ex:DatasetShape a sh:NodeShape ;
            sh:targetClass dcat:Dataset ;
            sh:property [
                sh:path dct:title ;
                sh:minCount 1 ;
                sh:datatype xsd:string ;
                sh:pattern "^[a-z]" ;
                sh:flags "i"
            ] , ex:KeywordShape , ex:OffShape .

        ex:KeywordShape a sh:PropertyShape ;
            sh:path dcat:keyword ;
            sh:in ( "a" "b" ) ;
            sh:severity sh:Warning .

        ex:OffShape sh:path dct:issued ; sh:deactivated true .

        ex:Untyped sh:targetNode ex:thing .
        ex:Dormant a sh:NodeShape ; sh:deactivated true .
    "#;

    #[test]
    fn loads_targets_and_nested_property_shapes() {
        let graph = RdfGraph::from_turtle(SHAPES).unwrap();
        let shapes = ShapeDiscovery::new(graph.store()).node_shapes().unwrap();
        assert_eq!(shapes.len(), 2);

        let dataset = shapes
            .iter()
            .find(|s| s.id.to_string().contains("DatasetShape"))
            .unwrap();
        assert_eq!(dataset.target_classes.len(), 1);
        assert_eq!(dataset.properties.len(), 2);

        let title = dataset
            .properties
            .iter()
            .find(|p| p.path.as_str().ends_with("title"))
            .unwrap();
        assert_eq!(title.min_count, Some(1));
        assert!(title.pattern.as_ref().unwrap().is_match("Zebra"));

        let keyword = dataset
            .properties
            .iter()
            .find(|p| p.path.as_str().ends_with("keyword"))
            .unwrap();
        assert_eq!(keyword.in_values.len(), 2);
        assert_eq!(keyword.severity, Some(Severity::Warning));
    }

    #[test]
    fn node_kind_matching() {
        let iri = Term::NamedNode(NamedNode::new_unchecked("http://example.org/x"));
        let lit = Term::Literal(Literal::new_simple_literal("x"));
        assert!(NodeKind::Iri.matches(&iri));
        assert!(!NodeKind::Iri.matches(&lit));
        assert!(NodeKind::IriOrLiteral.matches(&lit));
        assert_eq!(
            NodeKind::from_iri("http://www.w3.org/ns/shacl#BlankNodeOrIRI"),
            Some(NodeKind::BlankNodeOrIri)
        );
    }
}
