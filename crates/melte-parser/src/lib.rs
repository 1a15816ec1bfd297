//! Component document scanner for melte.
//!
//! Splits a component document into the sections the preprocessing stage
//! works on (instance script, module script, style) and recognizes plain
//! HTML files that only contribute `<head>`/`<body>` markup.
//!
//! # Example
//!
//! ```
//! use melte_parser::{detect, DocumentKind};
//!
//! let source = r#"<script>
//!     $m: doubled = count * 2;
//! </script>
//!
//! <p>{doubled}</p>
//! "#;
//!
//! match detect("Counter.svelte", source).unwrap() {
//!     DocumentKind::Component(document) => assert!(document.instance_script.is_some()),
//!     DocumentKind::Markup(_) => unreachable!(),
//! }
//! ```

mod ast;
mod error;
mod lexer;
mod scanner;

pub use ast::*;
pub use error::{ScanError, ScanErrorKind};
pub use lexer::{Lexer, Token, TokenKind};
pub use scanner::ScanOutput;
pub use source_map::Span;

/// Scans a document for its top-level sections.
pub fn scan(source: &str) -> Result<ScanOutput, ScanError> {
    scanner::Scanner::new(source).scan()
}

/// Decides whether a document is a component or markup-only.
///
/// Only files with the `.html` extension can be markup-only: they are when
/// they have at least one top-level `<head>` or `<body>` element.
pub fn detect(filename: &str, source: &str) -> Result<DocumentKind, ScanError> {
    let output = scan(source)?;

    let is_html = filename
        .rsplit_once('.')
        .is_some_and(|(_, extension)| extension == "html");

    if is_html && !output.html_sections.is_empty() {
        Ok(DocumentKind::Markup(output.html_sections))
    } else {
        Ok(DocumentKind::Component(output.document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scan_empty() {
        let output = scan("").unwrap();
        assert_eq!(output, ScanOutput::default());
    }

    #[test]
    fn test_scan_instance_and_module_scripts() {
        let source = r#"<script context="module">export const x = 1;</script>
<script lang="ts">let y: number = 2;</script>
<div>{y}</div>"#;
        let output = scan(source).unwrap();

        let module = output.document.module_script.unwrap();
        assert_eq!(module.content, "export const x = 1;");
        assert_eq!(module.context(), ScriptContext::Module);

        let instance = output.document.instance_script.unwrap();
        assert_eq!(instance.content, "let y: number = 2;");
        assert_eq!(instance.lang(), Some("ts"));
        assert_eq!(instance.context(), ScriptContext::Default);
        assert_eq!(
            instance.content_span.slice(source),
            Some("let y: number = 2;")
        );
    }

    #[test]
    fn test_detect_html_with_head_and_body() {
        let source = "<head>\n  <title>App</title>\n</head>\n<body>\n  <div id=\"app\"></div>\n</body>\n";
        let kind = detect("client/main.html", source).unwrap();
        assert_eq!(
            kind,
            DocumentKind::Markup(vec![
                HtmlSection {
                    section: HtmlSectionKind::Head,
                    data: "<title>App</title>".to_string(),
                },
                HtmlSection {
                    section: HtmlSectionKind::Body,
                    data: "<div id=\"app\"></div>".to_string(),
                },
            ])
        );
    }

    #[test]
    fn test_head_in_svelte_file_is_a_component() {
        let source = "<head><title>x</title></head>";
        assert!(matches!(
            detect("App.svelte", source).unwrap(),
            DocumentKind::Component(_)
        ));
    }

    #[test]
    fn test_html_without_head_or_body_is_a_component() {
        let source = "<script>let a = 1;</script><p>{a}</p>";
        assert!(matches!(
            detect("Widget.html", source).unwrap(),
            DocumentKind::Component(_)
        ));
    }
}
