use crate::config::ToolConfig;
use crate::shacl::{FixtureGenerator, gherkin_table};
use anyhow::Result;
use std::io::Write;
use tracing::info;

pub fn run(config: &ToolConfig, out: &mut dyn Write) -> Result<()> {
    let generator = FixtureGenerator::from_file(&config.shapes_file)?;
    let examples = generator.write_fixtures(&config.fixture_output_dir)?;
    info!(
        fixtures = examples.len(),
        output = %config.fixture_output_dir.display(),
        "fixtures written"
    );
    write!(out, "{}", gherkin_table(&examples))?;
    Ok(())
}
