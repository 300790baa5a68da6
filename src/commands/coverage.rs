use crate::config::CoverageArgs;
use crate::coverage::{compare, load_list};
use crate::report::{ConsoleEmitter, Emitter};
use anyhow::{Context, Result};
use std::io::Write;
use tracing::info;

pub fn run(args: &CoverageArgs, out: &mut dyn Write) -> Result<()> {
    let defined = load_list(&args.defined)
        .with_context(|| format!("failed to read defined list {}", args.defined.display()))?;
    let used = load_list(&args.used)
        .with_context(|| format!("failed to read used list {}", args.used.display()))?;

    let result = compare(&defined, &used);
    info!(
        label = %args.label,
        defined = result.defined_count(),
        used = result.used_count(),
        coverage = result.coverage_percent,
        "coverage computed"
    );

    ConsoleEmitter::new(&mut *out).emit_coverage(&args.label, &result)?;
    if let Some(path) = &args.csv {
        super::save_csv(path, out, |emitter| emitter.emit_coverage(&args.label, &result))?;
    }
    if let Some(path) = &args.json {
        super::save_json(path, out, |emitter| emitter.emit_coverage(&args.label, &result))?;
    }
    Ok(())
}
