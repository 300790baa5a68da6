use crate::config::UmlArgs;
use crate::uml::extract_from_path;
use anyhow::Result;
use std::io::Write;

pub fn run(args: &UmlArgs, out: &mut dyn Write) -> Result<()> {
    let extraction = extract_from_path(&args.xmi)?;
    writeln!(out, "Extracting attributes...")?;
    writeln!(out, "Extracting relationships...")?;

    let mut file = super::create_file(&args.output)?;
    extraction.write_csv(&mut file)?;
    file.flush()?;

    writeln!(
        out,
        "Extraction complete. Found {} entities ({} attributes, {} relationships). Results saved to {}",
        extraction.entities.len(),
        extraction.attribute_count(),
        extraction.relationship_count(),
        args.output.display()
    )?;
    Ok(())
}
