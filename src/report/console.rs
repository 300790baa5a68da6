use crate::coverage::CoverageResult;
use crate::entities::EntityInventory;
use crate::report::Emitter;
use anyhow::Result;
use std::io::Write;

/// Human-readable output.
pub struct ConsoleEmitter<W: Write> {
    out: W,
}

impl<W: Write> ConsoleEmitter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Emitter for ConsoleEmitter<W> {
    fn emit_coverage(&mut self, label: &str, result: &CoverageResult) -> Result<()> {
        for item in &result.unused {
            writeln!(self.out, "  ❌ {item}")?;
        }
        writeln!(self.out, "\n📦 {label} Coverage")?;
        writeln!(self.out, "Defined in SHACL: {}", result.defined_count())?;
        writeln!(self.out, "Used in RDF: {}", result.used_count())?;
        writeln!(self.out, "Unused: {}", result.unused_count())?;
        // Debug formatting keeps the trailing `.0` on whole percentages.
        writeln!(self.out, "Coverage: {:?}%", result.coverage_percent)?;
        self.out.flush()?;
        Ok(())
    }

    fn emit_entities(&mut self, inventory: &EntityInventory) -> Result<()> {
        for class in &inventory.classes {
            writeln!(self.out, "{class}")?;
        }
        for property in &inventory.properties {
            writeln!(self.out, "{property}")?;
        }
        self.out.flush()?;
        Ok(())
    }
}
