use crate::coverage::CoverageResult;
use crate::entities::EntityInventory;
use crate::report::Emitter;
use anyhow::Result;
use std::io::Write;

/// Tabular output through the `csv` crate.
pub struct CsvEmitter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvEmitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed to flush CSV output: {}", e.error()))
    }
}

impl<W: Write> Emitter for CsvEmitter<W> {
    fn emit_coverage(&mut self, label: &str, result: &CoverageResult) -> Result<()> {
        self.writer.write_record(["type", "value", "status"])?;
        for item in &result.used {
            self.writer.write_record([label, item.as_str(), "used"])?;
        }
        for item in &result.unused {
            self.writer.write_record([label, item.as_str(), "unused"])?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn emit_entities(&mut self, inventory: &EntityInventory) -> Result<()> {
        self.writer.write_record(["type", "name", "parent"])?;
        for class in &inventory.classes {
            self.writer.write_record(["class", class.as_str(), ""])?;
        }
        for property in &inventory.properties {
            self.writer.write_record([
                "property",
                property.name.as_str(),
                property.parent.as_deref().unwrap_or_default(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
