//! Section scanner.
//!
//! Walks the document once, tracking element nesting only as far as needed
//! to tell top-level elements from nested ones. Script and style content is
//! raw text and is skipped up to the matching closing tag. Markup
//! expressions (`{...}`) are skipped so a `<` inside them is never read as a
//! tag.

use crate::ast::{Attribute, ComponentDocument, HtmlSection, HtmlSectionKind, ScriptContext, Section, SectionKind};
use crate::error::{ScanError, ScanErrorKind};
use crate::lexer::{Lexer, TokenKind};
use smol_str::SmolStr;
use source_map::Span;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// What one pass over a document found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutput {
    /// Top-level script and style sections.
    pub document: ComponentDocument,
    /// Top-level `<head>`/`<body>` elements, in document order.
    pub html_sections: Vec<HtmlSection>,
}

struct OpenElement {
    name: SmolStr,
    content_start: usize,
}

struct OpenTag {
    name: SmolStr,
    attributes: Vec<Attribute>,
    end: usize,
    self_closing: bool,
}

pub(crate) struct Scanner<'src> {
    source: &'src str,
    pos: usize,
    stack: Vec<OpenElement>,
    output: ScanOutput,
}

impl<'src> Scanner<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            stack: Vec::new(),
            output: ScanOutput::default(),
        }
    }

    pub(crate) fn scan(mut self) -> Result<ScanOutput, ScanError> {
        while let Some(rel) = self.source[self.pos..].find(['<', '{']) {
            let at = self.pos + rel;
            let rest = &self.source[at..];

            self.pos = if rest.starts_with('{') {
                self.skip_expression(at)
            } else if rest.starts_with("<!--") {
                self.skip_comment(at)?
            } else if rest.starts_with("</") {
                self.close_tag(at)?
            } else if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                self.open_tag(at)?
            } else {
                at + 1
            };
        }

        // Unclosed top-level head/body run to the end of the document.
        if let Some(first) = self.stack.first() {
            let name = first.name.clone();
            let start = first.content_start;
            self.record_html_section(&name, start, self.source.len());
        }

        Ok(self.output)
    }

    fn skip_expression(&self, at: usize) -> usize {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;

        for (offset, c) in self.source[at..].char_indices() {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None => match c {
                    '"' | '\'' | '`' => quote = Some(c),
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return at + offset + 1;
                        }
                    }
                    _ => {}
                },
            }
        }

        // An unbalanced brace is plain text.
        at + 1
    }

    fn skip_comment(&self, at: usize) -> Result<usize, ScanError> {
        match self.source[at + 4..].find("-->") {
            Some(rel) => Ok(at + 4 + rel + 3),
            None => Err(ScanError::new(
                ScanErrorKind::UnclosedComment,
                span(at, at + 4),
            )),
        }
    }

    fn open_tag(&mut self, at: usize) -> Result<usize, ScanError> {
        let tag = self.read_open_tag(at)?;
        let lowered = tag.name.to_ascii_lowercase();

        if lowered == "script" || lowered == "style" {
            return self.raw_text_element(at, tag, &lowered);
        }

        if !tag.self_closing && !VOID_ELEMENTS.contains(&lowered.as_str()) {
            self.stack.push(OpenElement {
                name: SmolStr::new(&lowered),
                content_start: tag.end,
            });
        }

        Ok(tag.end)
    }

    fn read_open_tag(&self, at: usize) -> Result<OpenTag, ScanError> {
        let mut lexer = Lexer::at(self.source, at + 1);
        let name = match lexer.next() {
            Some(token) if token.kind == TokenKind::Name => {
                SmolStr::new(token.span.slice(self.source).unwrap_or_default())
            }
            _ => {
                return Err(ScanError::new(
                    ScanErrorKind::UnexpectedEof {
                        expected: "tag name".to_string(),
                    },
                    span(at, at + 1),
                ))
            }
        };

        let mut attributes = Vec::new();
        let mut current: Option<Attribute> = None;
        let mut after_eq = false;

        for token in lexer {
            let text = token.span.slice(self.source).unwrap_or_default();
            match token.kind {
                TokenKind::Name if after_eq => {
                    if let Some(attr) = current.as_mut() {
                        attr.value = Some(SmolStr::new(text));
                        attr.span.end = token.span.end;
                    }
                    after_eq = false;
                }
                TokenKind::Name => {
                    attributes.extend(current.take());
                    current = Some(Attribute {
                        span: token.span,
                        name: SmolStr::new(text),
                        value: None,
                    });
                }
                TokenKind::Eq => after_eq = current.is_some(),
                TokenKind::DoubleQuoted | TokenKind::SingleQuoted | TokenKind::Expression
                    if after_eq =>
                {
                    if let Some(attr) = current.as_mut() {
                        let value = if token.kind == TokenKind::Expression {
                            text
                        } else {
                            &text[1..text.len() - 1]
                        };
                        attr.value = Some(SmolStr::new(value));
                        attr.span.end = token.span.end;
                    }
                    after_eq = false;
                }
                TokenKind::RAngle | TokenKind::SlashRAngle => {
                    attributes.extend(current.take());
                    return Ok(OpenTag {
                        name,
                        attributes,
                        end: usize::from(token.span.end),
                        self_closing: token.kind == TokenKind::SlashRAngle,
                    });
                }
                TokenKind::Eof => break,
                _ => {}
            }
        }

        Err(ScanError::new(
            ScanErrorKind::UnexpectedEof {
                expected: format!("'>' to close <{name}>"),
            },
            span(at, self.source.len()),
        ))
    }

    fn raw_text_element(&mut self, at: usize, tag: OpenTag, name: &str) -> Result<usize, ScanError> {
        let (content_end, element_end) = if tag.self_closing {
            (tag.end, tag.end)
        } else {
            let Some(close) = find_closing_tag(self.source, tag.end, name) else {
                return Err(ScanError::new(
                    ScanErrorKind::UnclosedRawText {
                        tag_name: name.to_string(),
                    },
                    span(at, tag.end),
                ));
            };
            let Some(rel) = self.source[close..].find('>') else {
                return Err(ScanError::new(
                    ScanErrorKind::UnexpectedEof {
                        expected: format!("'>' to close </{name}>"),
                    },
                    span(close, self.source.len()),
                ));
            };
            (close, close + rel + 1)
        };

        if self.stack.is_empty() {
            let kind = if name == "script" {
                SectionKind::Script
            } else {
                SectionKind::Style
            };
            let section = Section {
                kind,
                span: span(at, element_end),
                content_span: span(tag.end, content_end),
                content: self.source[tag.end..content_end].to_string(),
                attributes: tag.attributes,
            };
            self.record_section(section)?;
        }

        Ok(element_end)
    }

    fn record_section(&mut self, section: Section) -> Result<(), ScanError> {
        let document = &mut self.output.document;
        let (slot, what) = match (section.kind, section.context()) {
            (SectionKind::Style, _) => (&mut document.style, "style"),
            (SectionKind::Script, ScriptContext::Module) => {
                (&mut document.module_script, "module script")
            }
            (SectionKind::Script, ScriptContext::Default) => {
                (&mut document.instance_script, "instance script")
            }
        };

        if slot.is_some() {
            return Err(ScanError::new(
                ScanErrorKind::Duplicate { what },
                section.span,
            ));
        }
        *slot = Some(section);
        Ok(())
    }

    fn close_tag(&mut self, at: usize) -> Result<usize, ScanError> {
        let mut lexer = Lexer::at(self.source, at + 2);
        let mut name = None;
        let mut end = None;

        for token in lexer.by_ref() {
            match token.kind {
                TokenKind::Name if name.is_none() => {
                    name = token.span.slice(self.source).map(|n| n.to_ascii_lowercase());
                }
                kind if kind.closes_tag() => {
                    end = Some(usize::from(token.span.end));
                    break;
                }
                TokenKind::Eof => break,
                _ => {}
            }
        }

        let Some(end) = end else {
            return Err(ScanError::new(
                ScanErrorKind::UnexpectedEof {
                    expected: "'>' to close the closing tag".to_string(),
                },
                span(at, self.source.len()),
            ));
        };

        // A stray closing tag is ignored; otherwise it closes everything
        // opened after its element.
        if let Some(name) = name {
            if let Some(index) = self.stack.iter().rposition(|open| open.name.as_str() == name) {
                if index == 0 {
                    let content_start = self.stack[0].content_start;
                    self.record_html_section(&name, content_start, at);
                }
                self.stack.truncate(index);
            }
        }

        Ok(end)
    }

    fn record_html_section(&mut self, name: &str, start: usize, end: usize) {
        let section = match name {
            "head" => HtmlSectionKind::Head,
            "body" => HtmlSectionKind::Body,
            _ => return,
        };
        self.output.html_sections.push(HtmlSection {
            section,
            data: self.source[start..end].trim().to_string(),
        });
    }
}

fn span(start: usize, end: usize) -> Span {
    Span::new(start as u32, end as u32)
}

/// Finds `</name` (ASCII case-insensitive) at or after `from`.
fn find_closing_tag(source: &str, from: usize, name: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut cursor = from;

    while let Some(rel) = source[cursor..].find("</") {
        let at = cursor + rel;
        let name_start = at + 2;
        let name_end = name_start + name.len();

        let name_matches = bytes
            .get(name_start..name_end)
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name.as_bytes()));
        let boundary = bytes
            .get(name_end)
            .map_or(true, |b| !b.is_ascii_alphanumeric() && *b != b'-');

        if name_matches && boundary {
            return Some(at);
        }
        cursor = name_start;
    }

    None
}
