//! Locating sample data files under the test data tree.

use crate::error::ToolError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureKind {
    #[default]
    Valid,
    Invalid,
}

impl FixtureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixtureKind::Valid => "valid",
            FixtureKind::Invalid => "invalid",
        }
    }
}

impl fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First file (in sorted walk order) below `root` named
/// `*{search}*_{kind}.ttl`.
pub fn find_test_file(root: &Path, search: &str, kind: FixtureKind) -> Result<PathBuf, ToolError> {
    let suffix = format!("_{kind}.ttl");
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                debug!(%error, "skipping unreadable entry while searching test data");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if let Some(stem) = name.strip_suffix(&suffix)
            && stem.contains(search)
        {
            return Ok(entry.into_path());
        }
    }
    Err(ToolError::NotFound(format!(
        "No {kind} test file found matching '{search}'"
    )))
}
