//! Scan error types.

use source_map::Span;
use thiserror::Error;

/// An error that stops a document from being split into sections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ScanError {
    /// The kind of error.
    pub kind: ScanErrorKind,
    /// The location in the document where the error occurred.
    pub span: Span,
}

impl ScanError {
    pub fn new(kind: ScanErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of scan error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanErrorKind {
    /// A `<script>` or `<style>` element has no closing tag.
    #[error("unclosed tag: <{tag_name}>")]
    UnclosedRawText {
        /// `script` or `style`.
        tag_name: String,
    },

    /// A tag was still open at the end of the document.
    #[error("unexpected end of file: expected {expected}")]
    UnexpectedEof {
        /// What was expected.
        expected: String,
    },

    /// A comment has no closing `-->`.
    #[error("unclosed comment")]
    UnclosedComment,

    /// More than one top-level instance or module script, or style.
    #[error("a component can only have one {what}")]
    Duplicate {
        /// `instance script`, `module script` or `style`.
        what: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ScanError::new(
            ScanErrorKind::UnclosedRawText {
                tag_name: "script".to_string(),
            },
            Span::new(0u32, 8u32),
        );
        assert_eq!(error.to_string(), "unclosed tag: <script>");

        let error = ScanError::new(
            ScanErrorKind::Duplicate {
                what: "instance script",
            },
            Span::new(0u32, 8u32),
        );
        assert_eq!(
            error.to_string(),
            "a component can only have one instance script"
        );
    }
}
