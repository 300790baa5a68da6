use crate::config::{ExtractArgs, ToolConfig};
use crate::entities::{EntityExtractor, ExtractionMode, FilterSpec, FilterTable};
use crate::error::ToolError;
use crate::rdf::load_graph_from_path;
use crate::report::{ConsoleEmitter, Emitter};
use anyhow::{Context, Result};
use std::io::Write;
use tracing::info;

pub fn run(args: &ExtractArgs, config: &ToolConfig, out: &mut dyn Write) -> Result<()> {
    let filter = load_filter(args)?;

    let (graph, _summary) = load_graph_from_path(&args.input, config.namespace_map())
        .with_context(|| format!("failed to load {}", args.input.display()))?;

    let mode = if args.shacl {
        ExtractionMode::Shapes
    } else {
        ExtractionMode::Instances
    };
    let inventory = EntityExtractor::new(&graph, &config.normalizer)
        .prefixed(args.prefixed)
        .with_filter(filter.as_ref())
        .extract(mode)?;

    ConsoleEmitter::new(&mut *out).emit_entities(&inventory)?;
    if let Some(path) = &args.csv {
        super::save_csv(path, out, |emitter| emitter.emit_entities(&inventory))?;
    }
    if let Some(path) = &args.json {
        super::save_json(path, out, |emitter| emitter.emit_entities(&inventory))?;
    }
    Ok(())
}

/// The filter table, when `--filter-csv` is given together with both the
/// column and the value to match.
fn load_filter(args: &ExtractArgs) -> Result<Option<FilterTable>> {
    let Some(path) = &args.filter_csv else {
        return Ok(None);
    };
    let (Some(column), Some(value)) = (&args.filter_column, &args.filter_value) else {
        return Err(ToolError::Argument(
            "When using --filter-csv, both --filter-column and --filter-value must be specified"
                .to_string(),
        )
        .into());
    };

    let spec = FilterSpec::new(column, value)
        .with_entity_column(&args.entity_column)
        .with_parent_column(Some(args.parent_column.clone()));
    let table = FilterTable::load(path, &spec)?;
    info!(
        entities = table.len(),
        column = %column,
        value = %value,
        parent_column = ?spec.parent_column,
        path = %path.display(),
        "filtering extraction results"
    );
    Ok(Some(table))
}
