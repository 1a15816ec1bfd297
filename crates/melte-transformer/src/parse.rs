//! swc parsing for instance scripts.

use std::sync::Arc;

use source_map::LineIndex;
use swc_common::{BytePos, FileName, SourceMap, Span as SwcSpan, Spanned};
use swc_ecma_ast::Module;
use swc_ecma_parser::error::Error as SwcError;
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use text_size::TextSize;

use crate::error::RewriteError;

/// The syntax a script is parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptSyntax {
    #[default]
    JavaScript,
    TypeScript,
}

impl ScriptSyntax {
    fn to_swc(self) -> Syntax {
        match self {
            ScriptSyntax::TypeScript => Syntax::Typescript(TsSyntax {
                tsx: false,
                ..Default::default()
            }),
            ScriptSyntax::JavaScript => Syntax::Es(EsSyntax {
                jsx: false,
                ..Default::default()
            }),
        }
    }
}

pub(crate) struct ParsedModule {
    pub module: Module,
    file_start: BytePos,
}

impl ParsedModule {
    /// Converts an swc span into byte offsets within the script.
    pub fn range(&self, span: SwcSpan) -> (usize, usize) {
        let start = span.lo.0.saturating_sub(self.file_start.0) as usize;
        let end = span.hi.0.saturating_sub(self.file_start.0) as usize;
        (start, end)
    }
}

/// Parses `source` as an ES module.
///
/// Errors the parser recovered from fail the parse as well; the first one
/// is reported.
pub(crate) fn parse_module(source: &str, syntax: ScriptSyntax) -> Result<ParsedModule, RewriteError> {
    let cm: Arc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        FileName::Custom("melte-instance-script".into()).into(),
        source.to_string(),
    );
    let file_start = fm.start_pos;

    let mut parser = Parser::new(syntax.to_swc(), StringInput::from(&*fm), None);
    let module = parser
        .parse_module()
        .map_err(|err| parse_error(&err, source, file_start))?;
    if let Some(err) = parser.take_errors().first() {
        return Err(parse_error(err, source, file_start));
    }

    Ok(ParsedModule { module, file_start })
}

fn parse_error(err: &SwcError, source: &str, file_start: BytePos) -> RewriteError {
    let offset = err.span().lo.0.saturating_sub(file_start.0);
    let position = LineIndex::new(source)
        .utf16_line_col(source, TextSize::from(offset))
        .unwrap_or_default();
    RewriteError::Parse {
        message: err.kind().msg().to_string(),
        line: position.line + 1,
        column: position.col,
    }
}
