//! Entity usage extraction.
//!
//! Collects the classes and (property, parent type) pairs that a graph either
//! uses (instance data) or declares (SHACL shapes), optionally restricted by a
//! [`FilterTable`].

pub mod extract;
pub mod filter;

pub use extract::EntityExtractor;
pub use filter::{FilterSpec, FilterTable};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the comparison a graph represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Instance data: classes are `rdf:type` objects, properties are predicates.
    Instances,
    /// SHACL shapes: classes are `sh:targetClass` values, properties are `sh:path` values.
    Shapes,
}

/// A property together with the type that owns it. `parent == None` means the
/// property was seen without any known owning type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyUsage {
    pub name: String,
    pub parent: Option<String>,
}

impl PropertyUsage {
    pub fn new(name: impl Into<String>, parent: Option<String>) -> Self {
        Self {
            name: name.into(),
            parent,
        }
    }

    pub fn with_parent(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::new(name, Some(parent.into()))
    }

    pub fn parentless(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }
}

impl fmt::Display for PropertyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => write!(f, "{} {}", parent, self.name),
            None => write!(f, "- {}", self.name),
        }
    }
}

/// Sorted, deduplicated extraction output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityInventory {
    pub classes: Vec<String>,
    pub properties: Vec<PropertyUsage>,
}

impl EntityInventory {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.properties.is_empty()
    }
}
