use crate::config::{ToolConfig, ValidateArgs};
use crate::error::ToolError;
use crate::rdf::load_graph_from_path;
use crate::shacl::{ShapeValidator, ValidationReport, find_test_file};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

pub fn run(args: &ValidateArgs, config: &ToolConfig, out: &mut dyn Write) -> Result<()> {
    let data_path = resolve_data(args, config, out)?;

    let validator = ShapeValidator::from_file(&config.shapes_file)?;
    let (data, _summary) = load_graph_from_path(&data_path, config.namespace_map())
        .with_context(|| format!("failed to load data {}", data_path.display()))?;

    let report = validator.validate_graph(&data)?;
    info!(
        data = %data_path.display(),
        conforms = report.conforms(),
        violations = report.violation_count(),
        warnings = report.warning_count(),
        "validation finished"
    );

    writeln!(out, "{}", report.render_text())?;
    if let Some(path) = &args.json {
        write_json(&report, path)?;
        writeln!(out, "✅ JSON saved to {}", path.display())?;
    }
    Ok(())
}

fn resolve_data(args: &ValidateArgs, config: &ToolConfig, out: &mut dyn Write) -> Result<PathBuf> {
    match (&args.data, &args.find) {
        (Some(path), _) => Ok(path.clone()),
        (None, Some(search)) => {
            let path = find_test_file(&config.test_data_dir, search, args.kind)?;
            writeln!(out, "Using test file: {}", path.display())?;
            Ok(path)
        }
        (None, None) => Err(ToolError::Argument(
            "one of --data or --find must be given".to_string(),
        )
        .into()),
    }
}

fn write_json(report: &ValidationReport, path: &std::path::Path) -> Result<()> {
    let json = report.to_json()?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
