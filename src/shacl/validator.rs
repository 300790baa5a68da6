//! Constraint checking and whole-graph validation.

use crate::rdf::namespaces::NamespaceMap;
use crate::rdf::{RDF_TYPE, RdfGraph, XSD_NS, load_graph_from_path};
use crate::shacl::report::{Constraint, Severity, ValidationReport, ValidationResult};
use crate::shacl::shapes::{NodeShape, PropertyShape, ShapeDiscovery, resource};
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use oxigraph::model::{Literal, NamedNode, NamedOrBlankNode, Term};
use oxigraph::store::Store;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::Path;
use tracing::{debug, info};

const RDFS_SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";

static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("decimal pattern is valid"));
static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d{4,}-\d{2}-\d{2}(Z|[+-]\d{2}:\d{2})?$").expect("date pattern is valid")
});
static DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d{4,}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$")
        .expect("dateTime pattern is valid")
});

// =============================================================================
// Constraint Checker
// =============================================================================

pub struct ConstraintChecker<'a> {
    data_store: &'a Store,
}

impl<'a> ConstraintChecker<'a> {
    pub fn new(data_store: &'a Store) -> Self {
        Self { data_store }
    }

    /// Check all constraints of one property shape against one focus node.
    pub fn check_property(
        &self,
        focus_node: &Term,
        property: &PropertyShape,
        severity: Severity,
    ) -> Result<Vec<ValidationResult>> {
        let mut results = Vec::new();
        let values = self.get_property_values(focus_node, &property.path)?;
        let report = |constraint: Constraint, default_message: String, value: Option<&Term>| {
            let message = property.message.clone().unwrap_or(default_message);
            let mut result = ValidationResult::new(
                focus_node.to_string(),
                message,
                severity,
                property.id.to_string(),
            )
            .with_path(property.path.to_string())
            .with_constraint(constraint);
            if let Some(value) = value {
                result = result.with_value(value.to_string());
            }
            result
        };

        if let Some(min_count) = property.min_count
            && values.len() < min_count
        {
            results.push(report(
                Constraint::MinCount,
                format!(
                    "Property {} must have at least {} value(s)",
                    property.path, min_count
                ),
                None,
            ));
        }

        if let Some(max_count) = property.max_count
            && values.len() > max_count
        {
            results.push(report(
                Constraint::MaxCount,
                format!(
                    "Property {} must have at most {} value(s)",
                    property.path, max_count
                ),
                None,
            ));
        }

        if let Some(expected) = &property.has_value
            && !values.contains(expected)
        {
            results.push(report(
                Constraint::HasValue,
                format!("Property {} must have value {}", property.path, expected),
                None,
            ));
        }

        for value in &values {
            for (constraint, message) in self.check_value_constraints(value, property)? {
                results.push(report(constraint, message, Some(value)));
            }
        }

        if property.unique_lang {
            let mut seen_langs = HashSet::new();
            let mut reported = HashSet::new();
            for value in &values {
                if let Term::Literal(lit) = value
                    && let Some(lang) = lit.language()
                    && !seen_langs.insert(lang.to_ascii_lowercase())
                    && reported.insert(lang.to_ascii_lowercase())
                {
                    results.push(report(
                        Constraint::UniqueLang,
                        format!("Language tag '{lang}' is used more than once"),
                        None,
                    ));
                }
            }
        }

        Ok(results)
    }

    /// Failed value-level constraints with their default messages.
    fn check_value_constraints(
        &self,
        value: &Term,
        property: &PropertyShape,
    ) -> Result<Vec<(Constraint, String)>> {
        let mut failures = Vec::new();

        if let Some(expected) = &property.datatype {
            let ok = match value {
                Term::Literal(lit) => {
                    lit.datatype() == expected.as_ref()
                        && lexically_valid(expected.as_str(), lit.value())
                }
                _ => false,
            };
            if !ok {
                failures.push((
                    Constraint::Datatype,
                    format!("Value must be a literal with datatype {expected}"),
                ));
            }
        }

        if let Some(expected) = &property.class {
            let ok = match resource(value) {
                Some(node) => self.has_type(&node, expected)?,
                None => false,
            };
            if !ok {
                failures.push((
                    Constraint::Class,
                    format!("Value must be an instance of {expected}"),
                ));
            }
        }

        if let Some(kind) = property.node_kind
            && !kind.matches(value)
        {
            failures.push((
                Constraint::NodeKind,
                format!("Value must be of node kind {}", kind.name()),
            ));
        }

        let text = match value {
            Term::Literal(lit) => Some(lit.value()),
            Term::NamedNode(node) => Some(node.as_str()),
            _ => None,
        };

        if let Some(pattern) = &property.pattern
            && !text.is_some_and(|t| pattern.is_match(t))
        {
            failures.push((
                Constraint::Pattern,
                format!("Value must match pattern: {}", pattern.as_str()),
            ));
        }

        if let Some(min_length) = property.min_length
            && !text.is_some_and(|t| t.chars().count() >= min_length)
        {
            failures.push((
                Constraint::MinLength,
                format!("Value must have at least {min_length} characters"),
            ));
        }

        if let Some(max_length) = property.max_length
            && !text.is_some_and(|t| t.chars().count() <= max_length)
        {
            failures.push((
                Constraint::MaxLength,
                format!("Value must have at most {max_length} characters"),
            ));
        }

        if let Some(min) = &property.min_inclusive
            && !matches!(
                compare_literals(value, min),
                Some(Ordering::Greater | Ordering::Equal)
            )
        {
            failures.push((
                Constraint::MinInclusive,
                format!("Value must be >= {}", min.value()),
            ));
        }

        if let Some(max) = &property.max_inclusive
            && !matches!(
                compare_literals(value, max),
                Some(Ordering::Less | Ordering::Equal)
            )
        {
            failures.push((
                Constraint::MaxInclusive,
                format!("Value must be <= {}", max.value()),
            ));
        }

        if !property.in_values.is_empty() && !property.in_values.contains(value) {
            let allowed: Vec<String> = property.in_values.iter().map(|v| v.to_string()).collect();
            failures.push((
                Constraint::In,
                format!("Value must be one of: {}", allowed.join(", ")),
            ));
        }

        Ok(failures)
    }

    fn get_property_values(&self, focus_node: &Term, path: &NamedNode) -> Result<Vec<Term>> {
        let Some(subject) = resource(focus_node) else {
            return Ok(Vec::new());
        };
        let mut values = Vec::new();
        for quad in self.data_store.quads_for_pattern(
            Some(subject.as_ref()),
            Some(path.as_ref()),
            None,
            None,
        ) {
            values.push(quad?.object);
        }
        Ok(values)
    }

    /// `rdf:type` membership, following `rdfs:subClassOf` in the data graph.
    fn has_type(&self, node: &NamedOrBlankNode, class: &NamedNode) -> Result<bool> {
        let rdf_type = NamedNode::new_unchecked(RDF_TYPE);
        let sub_class_of = NamedNode::new_unchecked(RDFS_SUB_CLASS_OF);

        let mut queue: VecDeque<NamedOrBlankNode> = VecDeque::new();
        for quad in
            self.data_store
                .quads_for_pattern(Some(node.as_ref()), Some(rdf_type.as_ref()), None, None)
        {
            if let Some(ty) = resource(&quad?.object) {
                queue.push_back(ty);
            }
        }

        let mut visited = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if let NamedOrBlankNode::NamedNode(named) = &current
                && named == class
            {
                return Ok(true);
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            for quad in self.data_store.quads_for_pattern(
                Some(current.as_ref()),
                Some(sub_class_of.as_ref()),
                None,
                None,
            ) {
                if let Some(parent) = resource(&quad?.object) {
                    queue.push_back(parent);
                }
            }
        }
        Ok(false)
    }
}

fn lexically_valid(datatype: &str, value: &str) -> bool {
    let Some(local) = datatype.strip_prefix(XSD_NS) else {
        return true;
    };
    match local {
        "integer" | "int" | "long" | "short" | "byte" | "nonNegativeInteger"
        | "positiveInteger" => {
            let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        }
        "decimal" => DECIMAL.is_match(value),
        "double" | "float" => {
            matches!(value, "INF" | "-INF" | "+INF" | "NaN") || value.parse::<f64>().is_ok()
        }
        "boolean" => matches!(value, "true" | "false" | "1" | "0"),
        "date" => DATE.is_match(value),
        "dateTime" => DATE_TIME.is_match(value),
        _ => true,
    }
}

/// Numeric comparison when both sides parse as numbers, otherwise lexical
/// comparison between literals of the same datatype.
fn compare_literals(value: &Term, bound: &Literal) -> Option<Ordering> {
    let Term::Literal(lit) = value else {
        return None;
    };
    if let (Ok(a), Ok(b)) = (lit.value().parse::<f64>(), bound.value().parse::<f64>()) {
        return a.partial_cmp(&b);
    }
    (lit.datatype() == bound.datatype()).then(|| lit.value().cmp(bound.value()))
}

// =============================================================================
// Shape Validator
// =============================================================================

pub struct ShapeValidator {
    shapes: Vec<NodeShape>,
}

impl ShapeValidator {
    pub fn from_store(shapes_store: &Store) -> Result<Self> {
        let shapes = ShapeDiscovery::new(shapes_store).node_shapes()?;
        debug!(shapes = shapes.len(), "loaded node shapes");
        Ok(Self { shapes })
    }

    pub fn from_graph(shapes: &RdfGraph) -> Result<Self> {
        Self::from_store(shapes.store())
    }

    /// Load shapes from a file or directory in any supported syntax.
    pub fn from_file(path: &Path) -> Result<Self> {
        let (graph, _) = load_graph_from_path(path, NamespaceMap::with_defaults())
            .with_context(|| format!("failed to load shapes from {}", path.display()))?;
        Self::from_graph(&graph)
    }

    pub fn from_turtle(turtle: &str) -> Result<Self> {
        let graph = RdfGraph::from_turtle(turtle).context("failed to parse shapes")?;
        Self::from_graph(&graph)
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn validate_graph(&self, data: &RdfGraph) -> Result<ValidationReport> {
        self.validate_store(data.store())
    }

    /// Validate every focus node of every shape.
    pub fn validate_store(&self, data_store: &Store) -> Result<ValidationReport> {
        let mut report = ValidationReport::new();
        let checker = ConstraintChecker::new(data_store);

        for shape in &self.shapes {
            let focus_nodes = self.focus_nodes(shape, data_store)?;
            debug!(
                shape = %shape.id,
                focus_nodes = focus_nodes.len(),
                properties = shape.properties.len(),
                "validating shape"
            );
            for focus_node in &focus_nodes {
                for property in &shape.properties {
                    let severity = property.severity.unwrap_or(shape.severity);
                    for result in checker.check_property(focus_node, property, severity)? {
                        report.add_result(result);
                    }
                }
            }
        }

        info!(
            conforms = report.conforms(),
            results = report.results().len(),
            violations = report.violation_count(),
            "validation finished"
        );
        Ok(report)
    }

    /// Focus nodes selected by the shape's targets, sorted and deduplicated.
    pub fn focus_nodes(&self, shape: &NodeShape, data_store: &Store) -> Result<Vec<Term>> {
        let mut nodes: BTreeMap<String, Term> = BTreeMap::new();
        let rdf_type = NamedNode::new_unchecked(RDF_TYPE);

        for class in &shape.target_classes {
            for class in subclass_closure(class, data_store)? {
                for quad in data_store.quads_for_pattern(
                    None,
                    Some(rdf_type.as_ref()),
                    Some(class.as_ref()),
                    None,
                ) {
                    let term: Term = quad?.subject.into();
                    nodes.insert(term.to_string(), term);
                }
            }
        }

        for node in &shape.target_nodes {
            nodes.insert(node.to_string(), node.clone());
        }

        for predicate in &shape.target_subjects_of {
            for quad in data_store.quads_for_pattern(None, Some(predicate.as_ref()), None, None) {
                let term: Term = quad?.subject.into();
                nodes.insert(term.to_string(), term);
            }
        }

        for predicate in &shape.target_objects_of {
            for quad in data_store.quads_for_pattern(None, Some(predicate.as_ref()), None, None) {
                let term = quad?.object;
                nodes.insert(term.to_string(), term);
            }
        }

        Ok(nodes.into_values().collect())
    }
}

/// `class` and every class declared below it with `rdfs:subClassOf`.
fn subclass_closure(class: &NamedNode, data_store: &Store) -> Result<Vec<Term>> {
    let sub_class_of = NamedNode::new_unchecked(RDFS_SUB_CLASS_OF);
    let start: Term = class.clone().into();
    let mut seen: HashSet<Term> = HashSet::from([start.clone()]);
    let mut queue = VecDeque::from([start]);
    let mut classes = Vec::new();

    while let Some(current) = queue.pop_front() {
        for quad in data_store.quads_for_pattern(
            None,
            Some(sub_class_of.as_ref()),
            Some(current.as_ref()),
            None,
        ) {
            let sub: Term = quad?.subject.into();
            if seen.insert(sub.clone()) {
                queue.push_back(sub);
            }
        }
        classes.push(current);
    }
    Ok(classes)
}
