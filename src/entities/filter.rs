//! Lookup-table filtering.
//!
//! The table is a CSV file with a header row. Rows whose filter column equals
//! the requested value contribute their entity, and optionally a permitted
//! parent for that entity.

use crate::error::ToolError;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const DEFAULT_ENTITY_COLUMN: &str = "entity";
pub const DEFAULT_PARENT_COLUMN: &str = "parent";

/// Which rows of the table to keep and where to find entities and parents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub column: String,
    pub value: String,
    pub entity_column: String,
    /// `None` disables parent restrictions.
    pub parent_column: Option<String>,
}

impl FilterSpec {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
            entity_column: DEFAULT_ENTITY_COLUMN.to_string(),
            parent_column: Some(DEFAULT_PARENT_COLUMN.to_string()),
        }
    }

    pub fn with_entity_column(mut self, column: impl Into<String>) -> Self {
        self.entity_column = column.into();
        self
    }

    pub fn with_parent_column(mut self, column: Option<String>) -> Self {
        self.parent_column = column.filter(|c| !c.trim().is_empty());
        self
    }
}

/// Entities to retain and, per entity, the parents it may appear under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterTable {
    entities: BTreeSet<String>,
    parents: BTreeMap<String, BTreeSet<String>>,
}

impl FilterTable {
    pub fn load(path: &Path, spec: &FilterSpec) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open filter table {}", path.display()))?;
        Self::from_reader(file, spec)
            .with_context(|| format!("failed to read filter table {}", path.display()))
    }

    pub fn from_reader(reader: impl Read, spec: &FilterSpec) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let filter_idx = position(&spec.column).ok_or_else(|| {
            ToolError::Argument(format!(
                "filter column '{}' not found in filter table",
                spec.column
            ))
        })?;
        let entity_idx = position(&spec.entity_column).ok_or_else(|| {
            ToolError::Argument(format!(
                "entity column '{}' not found in filter table",
                spec.entity_column
            ))
        })?;
        let parent_idx = spec.parent_column.as_deref().and_then(position);

        let mut table = Self::default();
        for record in reader.records() {
            let record = record?;
            let cell = |idx: usize| record.get(idx).map(str::trim).unwrap_or_default();

            if cell(filter_idx) != spec.value.trim() {
                continue;
            }
            let entity = cell(entity_idx);
            if entity.is_empty() {
                continue;
            }
            table.entities.insert(entity.to_string());

            if let Some(idx) = parent_idx {
                let parent = cell(idx);
                if !parent.is_empty() {
                    table
                        .parents
                        .entry(entity.to_string())
                        .or_default()
                        .insert(parent.to_string());
                }
            }
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn allows_entity(&self, name: &str) -> bool {
        self.entities.contains(name)
    }

    pub fn permitted_parents(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.parents.get(name)
    }

    /// A pair passes when the entity has no parent restriction or its parent
    /// is one of the permitted ones. A missing parent never satisfies a
    /// restriction.
    pub fn allows_pair(&self, name: &str, parent: Option<&str>) -> bool {
        match self.parents.get(name) {
            Some(permitted) => parent.is_some_and(|p| permitted.contains(p)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
entity,parent,profile
dct:title,dcat:Dataset,lu
dct:title,dcat:Catalog,lu
dcat:Dataset,,lu
dct:description,dcat:Dataset,eu
 dcat:keyword ,,lu
";

    #[test]
    fn keeps_matching_rows_only() {
        let table = FilterTable::from_reader(TABLE.as_bytes(), &FilterSpec::new("profile", "lu")).unwrap();
        assert!(table.allows_entity("dct:title"));
        assert!(table.allows_entity("dcat:Dataset"));
        assert!(table.allows_entity("dcat:keyword"));
        assert!(!table.allows_entity("dct:description"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn records_permitted_parents() {
        let table = FilterTable::from_reader(TABLE.as_bytes(), &FilterSpec::new("profile", "lu")).unwrap();
        let parents = table.permitted_parents("dct:title").unwrap();
        assert_eq!(parents.len(), 2);
        assert!(table.allows_pair("dct:title", Some("dcat:Catalog")));
        assert!(!table.allows_pair("dct:title", Some("dcat:Distribution")));
        assert!(!table.allows_pair("dct:title", None));
        assert!(table.allows_pair("dcat:keyword", None));
    }

    #[test]
    fn parent_column_can_be_disabled() {
        let spec = FilterSpec::new("profile", "lu").with_parent_column(Some(String::new()));
        let table = FilterTable::from_reader(TABLE.as_bytes(), &spec).unwrap();
        assert!(table.permitted_parents("dct:title").is_none());
        assert!(table.allows_pair("dct:title", None));
    }

    #[test]
    fn unknown_filter_column_is_an_argument_error() {
        let err = FilterTable::from_reader(TABLE.as_bytes(), &FilterSpec::new("nope", "lu")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolError>(),
            Some(ToolError::Argument(_))
        ));
    }

    #[test]
    fn custom_entity_column() {
        let data = "name,kind\nfoaf:name,keep\nfoaf:mbox,drop\n";
        let spec = FilterSpec::new("kind", "keep").with_entity_column("name");
        let table = FilterTable::from_reader(data.as_bytes(), &spec).unwrap();
        assert!(table.allows_entity("foaf:name"));
        assert!(!table.allows_entity("foaf:mbox"));
    }
}
