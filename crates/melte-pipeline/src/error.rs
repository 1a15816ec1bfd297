//! Pipeline error types.
//!
//! Failures caused by the document itself become a [`DocumentError`] handed
//! to the [`Reporter`](crate::Reporter). Failures that carry no position and
//! toolchain breakdowns are [`InternalError`]s and are returned to the
//! caller.

use source_map::LineCol;
use std::fmt;
use thiserror::Error;

/// A 1-based line and 0-based column reported by a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToolPosition {
    pub line: u32,
    pub column: u32,
}

impl ToolPosition {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// The 0-based position used by maps.
    pub fn to_line_col(self) -> LineCol {
        LineCol::new(self.line.saturating_sub(1), self.column)
    }

    pub fn from_line_col(position: LineCol) -> Self {
        Self::new(position.line + 1, position.col)
    }

    /// Reads a section-relative position as a document position, given the
    /// document position where the section content starts.
    pub fn relative_to(self, base: LineCol) -> Self {
        Self::from_line_col(self.to_line_col().relative_to(base))
    }
}

/// A structured failure reported by a tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ToolFailure {
    pub message: String,
    pub start: Option<ToolPosition>,
    /// Source excerpt pointing at the problem.
    pub frame: Option<String>,
}

impl ToolFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            start: None,
            frame: None,
        }
    }

    pub fn with_start(mut self, start: ToolPosition) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frame = Some(frame.into());
        self
    }
}

/// An error from a toolchain call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// The tool ran and rejected its input.
    #[error(transparent)]
    Failed(ToolFailure),

    /// The tool could not be run at all.
    #[error("toolchain host error: {0}")]
    Host(String),
}

/// The user-facing error for one document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DocumentError {
    pub message: String,
    /// 1-based.
    pub line: Option<u32>,
    /// 0-based.
    pub column: Option<u32>,
}

impl DocumentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(message: impl Into<String>, position: ToolPosition) -> Self {
        Self {
            message: message.into(),
            line: Some(position.line),
            column: Some(position.column),
        }
    }

    pub fn position(&self) -> Option<ToolPosition> {
        Some(ToolPosition::new(self.line?, self.column.unwrap_or(0)))
    }
}

/// Formats a tool message with its code frame.
///
/// Every frame line gets a `| ` prefix so consumers that trim output keep
/// the frame's indentation and the caret under the right column.
pub fn format_with_frame(message: &str, frame: Option<&str>) -> String {
    match frame {
        Some(frame) if !frame.is_empty() => {
            let frame: Vec<String> = frame.split('\n').map(|line| format!("| {line}")).collect();
            format!("{message}\n\n{}", frame.join("\n"))
        }
        _ => message.to_string(),
    }
}

/// The pipeline stage a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Scan,
    Rewrite,
    Preprocess,
    Compile,
    Instrument,
    Transpile,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Scan => "scan",
            Stage::Rewrite => "reactive rewrite",
            Stage::Preprocess => "preprocess",
            Stage::Compile => "compile",
            Stage::Instrument => "hot-reload instrumentation",
            Stage::Transpile => "transpile",
        };
        f.write_str(name)
    }
}

/// A failure that points at the pipeline or its toolchain rather than the
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("{stage} failed without position information: {message}")]
    Unpositioned { stage: Stage, message: String },

    #[error("toolchain host failed during {stage}: {message}")]
    Host { stage: Stage, message: String },
}

/// Why a document run stopped early.
#[derive(Debug)]
pub(crate) enum Failure {
    Document(DocumentError),
    Internal(InternalError),
}

impl From<DocumentError> for Failure {
    fn from(err: DocumentError) -> Self {
        Failure::Document(err)
    }
}

impl From<InternalError> for Failure {
    fn from(err: InternalError) -> Self {
        Failure::Internal(err)
    }
}
