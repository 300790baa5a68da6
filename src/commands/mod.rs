//! One handler per subcommand.
//!
//! Handlers take the resolved [`ToolConfig`] and write user-facing output to
//! `out` (stdout in the binary); diagnostics go through `tracing`.

pub mod coverage;
pub mod extract;
pub mod generate;
pub mod uml;
pub mod validate;

use crate::config::{Command, ToolConfig};
use crate::report::{CsvEmitter, Emitter, JsonEmitter};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn dispatch(command: &Command, config: &ToolConfig, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Extract(args) => extract::run(args, config, out),
        Command::Coverage(args) => coverage::run(args, out),
        Command::Uml(args) => uml::run(args, out),
        Command::Validate(args) => validate::run(args, config, out),
        Command::GenerateTests(_) => generate::run(config, out),
    }
}

pub(crate) fn create_file(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Run `emit` against a CSV emitter writing to `path`.
pub(crate) fn save_csv(
    path: &Path,
    out: &mut dyn Write,
    emit: impl FnOnce(&mut dyn Emitter) -> Result<()>,
) -> Result<()> {
    let mut emitter = CsvEmitter::new(create_file(path)?);
    emit(&mut emitter).with_context(|| format!("failed to write CSV to {}", path.display()))?;
    emitter.into_inner()?.flush()?;
    writeln!(out, "✅ CSV saved to {}", path.display())?;
    Ok(())
}

/// Run `emit` against a JSON emitter writing to `path`.
pub(crate) fn save_json(
    path: &Path,
    out: &mut dyn Write,
    emit: impl FnOnce(&mut dyn Emitter) -> Result<()>,
) -> Result<()> {
    let mut emitter = JsonEmitter::new(create_file(path)?);
    emit(&mut emitter).with_context(|| format!("failed to write JSON to {}", path.display()))?;
    emitter.into_inner().flush()?;
    writeln!(out, "✅ JSON saved to {}", path.display())?;
    Ok(())
}
