//! Report emitters for coverage and extraction results.
//!
//! Each emitter owns its writer; the command layer decides where output goes
//! (stdout for the console emitter, files for CSV and JSON).

pub mod console;
pub mod csv;
pub mod json;

pub use self::console::ConsoleEmitter;
pub use self::csv::CsvEmitter;
pub use self::json::JsonEmitter;

use crate::coverage::CoverageResult;
use crate::entities::EntityInventory;
use anyhow::Result;

pub trait Emitter {
    fn emit_coverage(&mut self, label: &str, result: &CoverageResult) -> Result<()>;

    fn emit_entities(&mut self, inventory: &EntityInventory) -> Result<()>;
}
