use crate::coverage::CoverageResult;
use crate::entities::EntityInventory;
use crate::report::Emitter;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

#[derive(Serialize)]
struct CoverageSection<'a> {
    defined: &'a [String],
    used: &'a [String],
    coverage_percent: f64,
}

#[derive(Serialize)]
struct ClassEntry<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct PropertyEntry<'a> {
    name: &'a str,
    parent: Option<&'a str>,
}

#[derive(Serialize)]
struct EntitiesDocument<'a> {
    classes: Vec<ClassEntry<'a>>,
    properties: Vec<PropertyEntry<'a>>,
}

/// Pretty-printed JSON (two-space indent).
pub struct JsonEmitter<W: Write> {
    out: W,
}

impl<W: Write> JsonEmitter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, value)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Emitter for JsonEmitter<W> {
    fn emit_coverage(&mut self, label: &str, result: &CoverageResult) -> Result<()> {
        let document = BTreeMap::from([(
            label.to_lowercase(),
            CoverageSection {
                defined: &result.defined,
                used: &result.used,
                coverage_percent: result.coverage_percent,
            },
        )]);
        self.write(&document)
    }

    fn emit_entities(&mut self, inventory: &EntityInventory) -> Result<()> {
        let document = EntitiesDocument {
            classes: inventory
                .classes
                .iter()
                .map(|name| ClassEntry { name })
                .collect(),
            properties: inventory
                .properties
                .iter()
                .map(|property| PropertyEntry {
                    name: &property.name,
                    parent: property.parent.as_deref(),
                })
                .collect(),
        };
        self.write(&document)
    }
}
