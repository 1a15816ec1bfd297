//! Output formatting.

use camino::Utf8Path;
use melte_pipeline::DocumentError;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, NamedSource, SourceSpan};
use source_map::LineIndex;
use thiserror::Error;

/// A document error with the source it points into.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct DocumentReport {
    message: String,
    #[source_code]
    source_code: NamedSource<String>,
    #[label("here")]
    span: Option<SourceSpan>,
}

impl DocumentReport {
    pub fn new(path: &Utf8Path, source: &str, error: &DocumentError) -> Self {
        let span = error
            .position()
            .and_then(|position| {
                LineIndex::new(source).utf16_offset(source, position.to_line_col())
            })
            .map(|offset| (u32::from(offset) as usize).min(source.len()))
            .map(|offset| SourceSpan::from((offset, 0)));

        Self {
            message: error.message.clone(),
            source_code: NamedSource::new(path.as_str(), source.to_string()),
            span,
        }
    }
}

/// Renders reports for the terminal.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Renders a document error with a labelled snippet, falling back to
    /// [`format_plain`].
    pub fn render(&self, path: &Utf8Path, source: &str, error: &DocumentError) -> String {
        let theme = if self.color {
            GraphicalTheme::unicode()
        } else {
            GraphicalTheme::unicode_nocolor()
        };
        let report = DocumentReport::new(path, source, error);
        let mut output = String::new();
        match GraphicalReportHandler::new_themed(theme).render_report(&mut output, &report) {
            Ok(()) => output,
            Err(_) => format_plain(path, error),
        }
    }
}

/// Formats an error as `file:line:col` followed by the message.
pub fn format_plain(path: &Utf8Path, error: &DocumentError) -> String {
    match error.position() {
        Some(position) => format!(
            "{}:{}:{}\nError: {}\n",
            path,
            position.line,
            position.column + 1,
            error.message
        ),
        None => format!("{}\nError: {}\n", path, error.message),
    }
}

/// Results of one build pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Number of documents processed.
    pub file_count: usize,
    /// Number of documents that failed.
    pub error_count: usize,
}

impl BuildSummary {
    /// Formats the summary line.
    pub fn format(&self) -> String {
        let error_word = if self.error_count == 1 {
            "error"
        } else {
            "errors"
        };
        let file_word = if self.file_count == 1 {
            "file"
        } else {
            "files"
        };

        format!(
            "====================================\nmelte compiled {} {} with {} {}",
            self.file_count, file_word, self.error_count, error_word
        )
    }
}
