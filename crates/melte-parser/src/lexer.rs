//! Tag lexer using logos.
//!
//! The scanner finds tag boundaries itself and hands the inside of every tag
//! (`name attr="value" ...>`) to this lexer. Text between tags is never lexed.

use logos::Logos;
use source_map::Span;
use text_size::TextSize;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span of the token in the document.
    pub span: Span,
}

/// Token kinds inside a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Default)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    /// `>`
    #[token(">")]
    RAngle,

    /// `/>`
    #[token("/>")]
    SlashRAngle,

    /// `/` not followed by `>`
    #[token("/")]
    Slash,

    /// `=`
    #[token("=")]
    Eq,

    /// `"..."`
    #[regex(r#""[^"]*""#)]
    DoubleQuoted,

    /// `'...'`
    #[regex(r"'[^']*'")]
    SingleQuoted,

    /// `{...}` attribute expression (no nested braces)
    #[regex(r"\{[^{}]*\}")]
    Expression,

    /// Tag names, attribute names and unquoted values.
    #[regex(r#"[^\s"'<>/=\{\}]+"#)]
    Name,

    /// End of input
    Eof,

    /// Invalid/unknown token
    #[default]
    Error,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::RAngle => "'>'",
            TokenKind::SlashRAngle => "'/>'",
            TokenKind::Slash => "'/'",
            TokenKind::Eq => "'='",
            TokenKind::DoubleQuoted | TokenKind::SingleQuoted => "quoted value",
            TokenKind::Expression => "expression",
            TokenKind::Name => "name",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
        }
    }

    /// Returns true if this token ends the tag.
    pub fn closes_tag(&self) -> bool {
        matches!(self, TokenKind::RAngle | TokenKind::SlashRAngle)
    }
}

/// A lexer over the inside of one tag.
///
/// Spans are document offsets: the lexer is created at `offset` into the
/// full document text.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src str,
    offset: u32,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer starting at byte `offset` of `document`.
    pub fn at(document: &'src str, offset: usize) -> Self {
        let source = document.get(offset..).unwrap_or_default();
        Self {
            inner: TokenKind::lexer(source),
            source,
            offset: offset as u32,
            finished: false,
        }
    }

    /// Returns the text of the current token.
    pub fn slice(&self) -> &'src str {
        self.inner.slice()
    }

    fn span(&self, range: std::ops::Range<usize>) -> Span {
        Span::new(
            TextSize::from(self.offset + range.start as u32),
            TextSize::from(self.offset + range.end as u32),
        )
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.inner.next() {
            Some(result) => {
                let kind = result.unwrap_or(TokenKind::Error);
                Some(Token {
                    kind,
                    span: self.span(self.inner.span()),
                })
            }
            None => {
                self.finished = true;
                let end = self.source.len();
                Some(Token {
                    kind: TokenKind::Eof,
                    span: self.span(end..end),
                })
            }
        }
    }
}
