//! Draft valid/invalid Turtle fixtures derived from SHACL shapes.
//!
//! Generated fixtures are a starting point; they still need manual curation
//! before they are used as test expectations.

use crate::rdf::namespaces::NamespaceMap;
use crate::rdf::{GraphStore, Node, RDF_TYPE, RDFS_LABEL, RdfGraph, XSD_NS, load_graph_from_path, sh};
use anyhow::{Context, Result};
use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::{BlankNode, Literal, NamedNode, NamedOrBlankNode, Triple};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

/// Prefixes bound in every generated fixture.
pub const FIXTURE_PREFIXES: &[(&str, &str)] = &[
    ("dcat", "http://www.w3.org/ns/dcat#"),
    ("dct", "http://purl.org/dc/terms/"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("adms", "http://www.w3.org/ns/adms#"),
    ("dcatap", "http://data.europa.eu/r5r/"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
];

const DCAT_DATASET: &str = "http://www.w3.org/ns/dcat#Dataset";
const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

/// One row of the Gherkin examples table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixtureExample {
    pub test_case: String,
    pub expected_valid_violation_count: usize,
    pub expected_invalid_violation_count: usize,
}

/// Constraints the generator understands, read from one shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeConstraints {
    pub target_class: Option<String>,
    pub path: Option<String>,
    pub min_count: Option<usize>,
    pub max_count: Option<usize>,
    pub datatype: Option<String>,
    pub class: Option<String>,
    pub properties: Vec<ShapeConstraints>,
}

#[derive(Debug, Clone)]
pub struct InvalidCase {
    pub description: String,
    pub triples: Vec<Triple>,
}

#[derive(Debug, Clone)]
pub struct ShapeFixture {
    pub name: String,
    pub valid: Vec<Triple>,
    pub invalid: Vec<InvalidCase>,
}

impl ShapeFixture {
    pub fn example(&self) -> FixtureExample {
        FixtureExample {
            test_case: self.name.clone(),
            expected_valid_violation_count: 0,
            expected_invalid_violation_count: self.invalid.len(),
        }
    }

    pub fn valid_turtle(&self) -> Result<String> {
        render_turtle(&self.valid)
    }

    /// All invalid cases in one document, each under a comment header.
    pub fn invalid_turtle(&self) -> Result<String> {
        let mut out = format!("# Combined invalid cases for shape: {}\n\n", self.name);
        for case in &self.invalid {
            let _ = writeln!(out, "### Invalid case: {}", case.description);
            out.push_str(&render_turtle(&case.triples)?);
            out.push_str("\n\n");
        }
        Ok(out)
    }
}

pub struct FixtureGenerator {
    shapes: RdfGraph,
}

impl FixtureGenerator {
    pub fn new(shapes: RdfGraph) -> Self {
        Self { shapes }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let (graph, _) = load_graph_from_path(path, NamespaceMap::with_defaults())
            .with_context(|| format!("failed to load shapes from {}", path.display()))?;
        Ok(Self::new(graph))
    }

    pub fn from_turtle(turtle: &str) -> Result<Self> {
        Ok(Self::new(RdfGraph::from_turtle(turtle)?))
    }

    /// Node shapes first, then property shapes (typed or referenced through
    /// `sh:property`), each group sorted by generated name.
    pub fn fixtures(&self) -> Result<Vec<ShapeFixture>> {
        let node_shapes: BTreeSet<Node> = self
            .shapes
            .subjects(RDF_TYPE, &Node::iri(sh::NODE_SHAPE))?
            .into_iter()
            .collect();

        let mut property_shapes: BTreeSet<Node> = self
            .shapes
            .subjects(RDF_TYPE, &Node::iri(sh::PROPERTY_SHAPE))?
            .into_iter()
            .collect();
        for statement in self.shapes.statements(None, Some(sh::PROPERTY), None)? {
            if statement.object.is_resource() {
                property_shapes.insert(statement.object);
            }
        }
        property_shapes.retain(|shape| !node_shapes.contains(shape));

        let mut fixtures = Vec::new();
        for group in [node_shapes, property_shapes] {
            let mut group_fixtures = group
                .iter()
                .map(|shape| self.fixture_for(shape))
                .collect::<Result<Vec<_>>>()?;
            group_fixtures.sort_by(|a, b| a.name.cmp(&b.name));
            fixtures.extend(group_fixtures);
        }
        Ok(fixtures)
    }

    /// Write `{dir}/{name}/{name}_valid.ttl` and `{name}_invalid.ttl` for every
    /// shape and return the Gherkin rows.
    pub fn write_fixtures(&self, output_dir: &Path) -> Result<Vec<FixtureExample>> {
        let mut examples = Vec::new();
        for fixture in self.fixtures()? {
            info!(shape = %fixture.name, "generating test cases for shape");
            let shape_dir = output_dir.join(&fixture.name);
            fs::create_dir_all(&shape_dir)
                .with_context(|| format!("failed to create {}", shape_dir.display()))?;

            let valid_file = shape_dir.join(format!("{}_valid.ttl", fixture.name));
            fs::write(&valid_file, fixture.valid_turtle()?)
                .with_context(|| format!("failed to write {}", valid_file.display()))?;

            let invalid_file = shape_dir.join(format!("{}_invalid.ttl", fixture.name));
            fs::write(&invalid_file, fixture.invalid_turtle()?)
                .with_context(|| format!("failed to write {}", invalid_file.display()))?;

            examples.push(fixture.example());
        }
        Ok(examples)
    }

    pub fn fixture_for(&self, shape: &Node) -> Result<ShapeFixture> {
        let constraints = self.constraints(shape, true)?;
        Ok(ShapeFixture {
            name: self.shape_name(shape)?,
            valid: valid_instance(&constraints, self.owning_class(shape)?.as_deref()),
            invalid: self.invalid_instances(shape, &constraints)?,
        })
    }

    /// Fragment of the shape IRI, else its label, else `{parent}-{path}` for
    /// anonymous property shapes, else the last IRI segment.
    pub fn shape_name(&self, shape: &Node) -> Result<String> {
        if let Some(fragment) = shape.as_iri().and_then(iri_fragment) {
            return Ok(sanitize(fragment));
        }
        if let Some(label) = self.label(shape)? {
            return Ok(sanitize(&label));
        }
        if let Node::Blank(_) = shape
            && let Some(Node::Iri(path)) = self.shapes.value(shape, sh::PATH)?
        {
            let local = local_name(&path);
            return Ok(match self.first_owner(shape)? {
                Some(parent) => sanitize(&format!("{}-{}", self.base_name(&parent)?, local)),
                None => sanitize(local),
            });
        }
        self.base_name(shape)
    }

    fn base_name(&self, shape: &Node) -> Result<String> {
        if let Some(iri) = shape.as_iri() {
            return Ok(sanitize(iri_fragment(iri).unwrap_or_else(|| local_name(iri))));
        }
        if let Some(label) = self.label(shape)? {
            return Ok(sanitize(&label));
        }
        Ok(match shape {
            Node::Blank(id) => format!("shape-{id}"),
            other => sanitize(&other.to_string()),
        })
    }

    fn label(&self, shape: &Node) -> Result<Option<String>> {
        Ok(match self.shapes.value(shape, RDFS_LABEL)? {
            Some(Node::Literal(label)) if !label.trim().is_empty() => Some(label.trim().to_string()),
            _ => None,
        })
    }

    pub fn constraints(&self, shape: &Node, with_properties: bool) -> Result<ShapeConstraints> {
        let mut constraints = ShapeConstraints {
            target_class: self.iri_value(shape, sh::TARGET_CLASS)?,
            path: self.iri_value(shape, sh::PATH)?,
            min_count: self.count_value(shape, sh::MIN_COUNT)?,
            max_count: self.count_value(shape, sh::MAX_COUNT)?,
            datatype: self.iri_value(shape, sh::DATATYPE)?,
            class: self.iri_value(shape, sh::CLASS)?,
            properties: Vec::new(),
        };
        if with_properties {
            let nested: BTreeSet<Node> = self.shapes.objects(shape, sh::PROPERTY)?.into_iter().collect();
            for property in &nested {
                let nested = self.constraints(property, false)?;
                if nested.path.is_some() {
                    constraints.properties.push(nested);
                }
            }
        }
        Ok(constraints)
    }

    fn invalid_instances(&self, shape: &Node, constraints: &ShapeConstraints) -> Result<Vec<InvalidCase>> {
        let mut cases = Vec::new();

        if constraints.target_class.is_some() {
            let instance = blank();
            cases.push(InvalidCase {
                description: "Missing required type".to_string(),
                triples: vec![Triple::new(instance, iri(RDF_TYPE), BlankNode::default())],
            });
        }

        let Some(path) = &constraints.path else {
            return Ok(cases);
        };
        let owning_class = self.owning_class(shape)?;
        let parent_triples = |parent: &NamedOrBlankNode| -> Vec<Triple> {
            owning_class
                .iter()
                .map(|class| Triple::new(parent.clone(), iri(RDF_TYPE), iri(class)))
                .collect()
        };

        if let Some(datatype) = &constraints.datatype {
            let wrong = if datatype == XSD_STRING { XSD_INTEGER } else { XSD_STRING };
            let parent = blank();
            let mut triples = parent_triples(&parent);
            triples.push(Triple::new(
                parent,
                iri(path),
                Literal::new_typed_literal("wrong type", iri(wrong)),
            ));
            cases.push(InvalidCase {
                description: format!("Wrong datatype: using {wrong} instead of {datatype}"),
                triples,
            });
        }

        if let Some(class) = &constraints.class {
            let parent = blank();
            let wrong_object = blank();
            let mut triples = parent_triples(&parent);
            triples.push(Triple::new(wrong_object.clone(), iri(RDF_TYPE), iri(DCAT_DATASET)));
            triples.push(Triple::new(parent, iri(path), wrong_object));
            cases.push(InvalidCase {
                description: format!("Wrong class: using dcat:Dataset instead of {class}"),
                triples,
            });
        }

        if let Some(min_count) = constraints.min_count.filter(|n| *n > 0) {
            let parent = blank();
            cases.push(InvalidCase {
                description: format!("Missing required property with minCount={min_count}"),
                triples: parent_triples(&parent),
            });
        }

        if let Some(max_count) = constraints.max_count {
            let parent = blank();
            let mut triples = parent_triples(&parent);
            for i in 0..=max_count {
                triples.push(Triple::new(
                    parent.clone(),
                    iri(path),
                    Literal::new_simple_literal(format!("Value {i}")),
                ));
            }
            cases.push(InvalidCase {
                description: format!(
                    "Exceeding maxCount={max_count} with {} values",
                    max_count + 1
                ),
                triples,
            });
        }

        Ok(cases)
    }

    /// Target class of the first node shape that references `shape`.
    fn owning_class(&self, shape: &Node) -> Result<Option<String>> {
        let owners: BTreeSet<Node> = self.shapes.subjects(sh::PROPERTY, shape)?.into_iter().collect();
        for owner in &owners {
            if let Some(class) = self.iri_value(owner, sh::TARGET_CLASS)? {
                return Ok(Some(class));
            }
        }
        Ok(None)
    }

    fn first_owner(&self, shape: &Node) -> Result<Option<Node>> {
        Ok(self.shapes.subjects(sh::PROPERTY, shape)?.into_iter().min())
    }

    fn iri_value(&self, shape: &Node, predicate: &str) -> Result<Option<String>> {
        Ok(self
            .shapes
            .value(shape, predicate)?
            .and_then(|node| node.as_iri().map(str::to_string)))
    }

    fn count_value(&self, shape: &Node, predicate: &str) -> Result<Option<usize>> {
        match self.shapes.value(shape, predicate)? {
            Some(Node::Literal(value)) => Ok(Some(value.trim().parse().with_context(|| {
                format!("invalid {predicate} value '{value}' on shape {shape}")
            })?)),
            _ => Ok(None),
        }
    }
}

/// A conforming instance: the target class with every nested property
/// filled, or a single property value on a parent node.
pub fn valid_instance(constraints: &ShapeConstraints, owning_class: Option<&str>) -> Vec<Triple> {
    let mut triples = Vec::new();

    if let Some(path) = &constraints.path {
        let parent = blank();
        if let Some(class) = owning_class {
            triples.push(Triple::new(parent.clone(), iri(RDF_TYPE), iri(class)));
        }
        let count = constraints.min_count.unwrap_or(1).max(1);
        for i in 0..count {
            push_valid_value(&mut triples, &parent, path, constraints, i, "Valid value");
        }
        return triples;
    }

    let instance = blank();
    if let Some(class) = &constraints.target_class {
        triples.push(Triple::new(instance.clone(), iri(RDF_TYPE), iri(class)));
    }
    for property in &constraints.properties {
        let Some(path) = &property.path else {
            continue;
        };
        let fallback = format!("Valid value for {path}");
        let count = property.min_count.unwrap_or(1).max(1);
        for i in 0..count {
            push_valid_value(&mut triples, &instance, path, property, i, &fallback);
        }
    }
    triples
}

fn push_valid_value(
    triples: &mut Vec<Triple>,
    subject: &NamedOrBlankNode,
    path: &str,
    constraints: &ShapeConstraints,
    index: usize,
    fallback: &str,
) {
    if let Some(datatype) = &constraints.datatype {
        triples.push(Triple::new(subject.clone(), iri(path), valid_value(datatype, index)));
    } else if let Some(class) = &constraints.class {
        let object = blank();
        triples.push(Triple::new(object.clone(), iri(RDF_TYPE), iri(class)));
        triples.push(Triple::new(subject.clone(), iri(path), object));
    } else {
        let text = if index == 0 {
            fallback.to_string()
        } else {
            format!("{fallback} {}", index + 1)
        };
        triples.push(Triple::new(subject.clone(), iri(path), Literal::new_simple_literal(text)));
    }
}

/// Lexical forms accepted for `xsd:boolean`.
const BOOLEAN_FORMS: [&str; 4] = ["true", "false", "1", "0"];

/// A literal that satisfies `datatype`; `index` keeps repeated values distinct.
///
/// `xsd:boolean` has four lexical forms, so from the fifth value on they
/// repeat.
pub fn valid_value(datatype: &str, index: usize) -> Literal {
    let year = 2024 + index / 8;
    let day = 20 + index % 8;
    let lexical = match datatype.strip_prefix(XSD_NS) {
        Some("string") if index == 0 => "Valid string".to_string(),
        Some("string") => format!("Valid string {}", index + 1),
        Some("dateTime") => format!("{year}-03-{day:02}T12:00:00"),
        Some("date") => format!("{year}-03-{day:02}"),
        Some("integer") => (42 + index).to_string(),
        Some("decimal") => format!("{}.0", 42 + index),
        Some("boolean") => BOOLEAN_FORMS[index % BOOLEAN_FORMS.len()].to_string(),
        _ if index == 0 => "Default value".to_string(),
        _ => format!("Default value {}", index + 1),
    };
    Literal::new_typed_literal(lexical, iri(datatype))
}

/// Serialize triples as Turtle with the fixture prefixes bound.
pub fn render_turtle(triples: &[Triple]) -> Result<String> {
    let mut serializer = RdfSerializer::from_format(RdfFormat::Turtle);
    for (prefix, namespace) in FIXTURE_PREFIXES {
        serializer = serializer.with_prefix(*prefix, *namespace)?;
    }
    let mut writer = serializer.for_writer(Vec::new());
    for triple in triples {
        writer.serialize_triple(triple.as_ref())?;
    }
    let bytes = writer.finish()?;
    Ok(String::from_utf8(bytes)?)
}

/// Markdown-style Gherkin examples table.
pub fn gherkin_table(examples: &[FixtureExample]) -> String {
    let mut out = String::from("\nGherkin Examples:\n");
    out.push_str("| test_case | expected_valid_violation_count | expected_invalid_violation_count |\n");
    out.push_str("|-----------|------------------------------|----------------------------------|\n");
    for example in examples {
        let _ = writeln!(
            out,
            "| {} | {} | {} |",
            example.test_case,
            example.expected_valid_violation_count,
            example.expected_invalid_violation_count
        );
    }
    out
}

fn iri(value: &str) -> NamedNode {
    NamedNode::new_unchecked(value)
}

fn blank() -> NamedOrBlankNode {
    BlankNode::default().into()
}

fn iri_fragment(iri: &str) -> Option<&str> {
    iri.rsplit_once('#')
        .map(|(_, fragment)| fragment)
        .filter(|fragment| !fragment.is_empty())
}

fn local_name(iri: &str) -> &str {
    iri.rsplit(['#', '/'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(iri)
}

fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c.is_whitespace() || matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect()
}
