//! Error taxonomy for the DCAT-AP-LU tools.
//!
//! Domain failures that callers need to tell apart are modelled as
//! [`ToolError`] variants. Everything else travels as `anyhow::Error` with
//! context attached at each boundary, and is printed with its full chain by
//! the binary.

use std::path::PathBuf;
use thiserror::Error;

/// Errors with a defined meaning for the command-line surface.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The input path is neither a file nor a directory.
    #[error("invalid path {}: must be a file or directory", path.display())]
    InvalidInput { path: PathBuf },

    /// A single RDF file could not be parsed.
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A required flag combination is missing.
    #[error("{0}")]
    Argument(String),

    /// A lookup (test file search, shapes file) matched nothing.
    #[error("{0}")]
    NotFound(String),

    /// The configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ToolError {
    /// Errors reported to the user as a plain `Error: ...` line instead of a
    /// full diagnostic chain.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, ToolError::Argument(_) | ToolError::NotFound(_))
    }

    pub fn parse(path: impl Into<PathBuf>, source: impl std::fmt::Display) -> Self {
        ToolError::Parse {
            path: path.into(),
            message: source.to_string(),
        }
    }
}

/// Find the first [`ToolError`] in an `anyhow` chain.
pub fn find_tool_error(error: &anyhow::Error) -> Option<&ToolError> {
    error.chain().find_map(|cause| cause.downcast_ref::<ToolError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn argument_errors_are_user_facing() {
        assert!(ToolError::Argument("missing".into()).is_user_facing());
        assert!(ToolError::NotFound("nothing".into()).is_user_facing());
        assert!(
            !ToolError::InvalidInput {
                path: PathBuf::from("x")
            }
            .is_user_facing()
        );
    }

    #[test]
    fn finds_tool_error_behind_context() {
        let result: anyhow::Result<()> =
            Err(ToolError::Argument("bad flags".into())).context("running extract");
        let error = result.unwrap_err();
        assert!(matches!(
            find_tool_error(&error),
            Some(ToolError::Argument(msg)) if msg == "bad flags"
        ));
    }

    #[test]
    fn invalid_input_message_names_path() {
        let err = ToolError::InvalidInput {
            path: PathBuf::from("/no/such/place"),
        };
        assert_eq!(
            err.to_string(),
            "invalid path /no/such/place: must be a file or directory"
        );
    }
}
