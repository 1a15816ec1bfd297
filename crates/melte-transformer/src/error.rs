//! Rewrite error types.

use thiserror::Error;

/// An error that prevents the reactive rewrite of a script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// The script is not valid JavaScript/TypeScript.
    ///
    /// `line` is 1-based and `column` 0-based, both relative to the script
    /// content.
    #[error("{message} ({line}:{column})")]
    Parse {
        message: String,
        line: u32,
        column: u32,
    },
}

impl RewriteError {
    pub fn message(&self) -> &str {
        match self {
            RewriteError::Parse { message, .. } => message,
        }
    }
}
