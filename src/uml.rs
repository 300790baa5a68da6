//! UML entity extraction from Sparx EA XMI exports.
//!
//! Attributes come from `Extension/elements/element/attributes/attribute`,
//! relationships from `Extension/connectors/connector`. Attribute values are
//! decoded lossily, so guillemets in badly encoded exports may show up as
//! U+FFFD.

use crate::error::ToolError;
use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use regex::Regex;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_OUTPUT: &str = "uml_entities.csv";

const NO_QUALIFIER: &str = "None";

static LABEL_QUALIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[«\x{FFFD}](\w+)[»\x{FFFD}]").expect("qualifier pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UmlEntityKind {
    Attribute,
    Relationship,
}

/// One attribute or relationship row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UmlEntity {
    pub parent: String,
    pub entity: String,
    pub qualifier: String,
    pub cardinality: String,
    #[serde(rename = "type")]
    pub kind: UmlEntityKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UmlExtraction {
    pub entities: Vec<UmlEntity>,
}

impl UmlExtraction {
    pub fn attribute_count(&self) -> usize {
        self.count(UmlEntityKind::Attribute)
    }

    pub fn relationship_count(&self) -> usize {
        self.count(UmlEntityKind::Relationship)
    }

    fn count(&self, kind: UmlEntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind == kind).count()
    }

    /// Write `parent,entity,qualifier,cardinality,type` rows.
    pub fn write_csv(&self, out: impl Write) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        if self.entities.is_empty() {
            writer.write_record(["parent", "entity", "qualifier", "cardinality", "type"])?;
        }
        for entity in &self.entities {
            writer.serialize(entity)?;
        }
        writer.flush()?;
        Ok(())
    }
}

pub fn extract_from_path(path: &Path) -> Result<UmlExtraction> {
    if !path.is_file() {
        return Err(ToolError::InvalidInput {
            path: path.to_path_buf(),
        }
        .into());
    }
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    extract_from_reader(BufReader::new(file))
        .with_context(|| format!("failed to process XMI file {}", path.display()))
}

pub fn extract_from_reader(reader: impl BufRead) -> Result<UmlExtraction> {
    let root = XmlElement::parse(reader)?;
    let mut entities = Vec::new();

    for extension in root.children_named("Extension") {
        for element in extension
            .children_named("elements")
            .flat_map(|e| e.children_named("element"))
        {
            entities.extend(attributes_of(element));
        }
    }
    for extension in root.children_named("Extension") {
        for connector in extension
            .children_named("connectors")
            .flat_map(|c| c.children_named("connector"))
        {
            entities.extend(relationship_of(connector));
        }
    }

    let extraction = UmlExtraction { entities };
    debug!(
        attributes = extraction.attribute_count(),
        relationships = extraction.relationship_count(),
        "XMI extraction finished"
    );
    Ok(extraction)
}

fn attributes_of(element: &XmlElement) -> Vec<UmlEntity> {
    let Some(parent) = element.attr("name") else {
        return Vec::new();
    };
    element
        .children_named("attributes")
        .flat_map(|a| a.children_named("attribute"))
        .filter_map(|attribute| {
            let name = attribute.attr("name")?;
            let qualifier = attribute
                .child("stereotype")
                .and_then(|s| s.attr("stereotype"))
                .unwrap_or(NO_QUALIFIER);
            let bounds = attribute.child("bounds");
            let cardinality = attribute_cardinality(
                bounds.and_then(|b| b.attr("lower")),
                bounds.and_then(|b| b.attr("upper")),
            );
            Some(UmlEntity {
                parent: parent.to_string(),
                entity: name.to_string(),
                qualifier: qualifier.to_string(),
                cardinality,
                kind: UmlEntityKind::Attribute,
            })
        })
        .collect()
}

fn relationship_of(connector: &XmlElement) -> Option<UmlEntity> {
    let parent = connector.child("source")?.child("model")?.attr("name")?;
    let target = connector.child("target")?;
    let name = target.child("role")?.attr("name")?;
    let cardinality =
        connector_cardinality(target.child("type").and_then(|t| t.attr("multiplicity")));

    let qualifier = connector
        .child("labels")
        .and_then(|labels| labels.attr("mb"))
        .and_then(label_qualifier)
        .or_else(|| {
            connector
                .child("properties")
                .map(|p| p.attr("stereotype").unwrap_or(NO_QUALIFIER).to_string())
        })
        .unwrap_or_else(|| NO_QUALIFIER.to_string());

    Some(UmlEntity {
        parent: parent.to_string(),
        entity: name.to_string(),
        qualifier,
        cardinality,
        kind: UmlEntityKind::Relationship,
    })
}

/// `lower..upper` with defaults `0` and `1`; an unbounded upper is `n`.
pub fn attribute_cardinality(lower: Option<&str>, upper: Option<&str>) -> String {
    let lower = lower.unwrap_or("0");
    let upper = match upper.unwrap_or("1") {
        "*" => "n",
        other => other,
    };
    format!("{lower}..{upper}")
}

pub fn connector_cardinality(multiplicity: Option<&str>) -> String {
    match multiplicity {
        None | Some("") => "0..1".to_string(),
        Some("0..*") => "0..n".to_string(),
        Some("1..*") => "1..n".to_string(),
        Some(other) => other.replace('*', "n"),
    }
}

fn label_qualifier(label: &str) -> Option<String> {
    LABEL_QUALIFIER
        .captures(label)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Minimal owned element tree; only local names and attributes are kept.
#[derive(Debug, Default)]
struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn parse(reader: impl BufRead) -> Result<Self> {
        let mut reader = Reader::from_reader(reader);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => stack.push(Self::from_start(&e)?),
                Event::Empty(e) => {
                    let element = Self::from_start(&e)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| anyhow!("unbalanced closing tag"))?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(anyhow!("unexpected end of document"));
        }
        root.ok_or_else(|| anyhow!("document has no root element"))
    }

    fn from_start(start: &BytesStart) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            let value = quick_xml::escape::unescape(&raw)
                .map(|v| v.into_owned())
                .with_context(|| format!("invalid escape in attribute {key}"))?;
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}
