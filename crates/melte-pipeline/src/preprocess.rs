//! Section preprocessing.
//!
//! Every section of a component document goes through the reactive rewrite
//! (instance scripts only) and then its language sub-transformer. The
//! results are spliced back into the document, and the per-section maps are
//! lifted into a single map from the preprocessed document to the original.

use camino::Utf8Path;
use indexmap::IndexMap;
use melte_parser::{ComponentDocument, Section, SectionKind};
use melte_transformer::{rewrite_reactive, RewriteError, RewriteOptions};
use source_map::{compose_optional, ByteOffset, LineCol, LineIndex, PositionMap, SourceMapBuilder};
use tracing::warn;

use crate::error::{DocumentError, Failure, InternalError, Stage, ToolError, ToolPosition};
use crate::lang::{ScriptLang, SectionLang, StyleLang};
use crate::options::PipelineOptions;
use crate::toolchain::{PreprocessRequest, Reporter, Toolchain};

/// The preprocessed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Preprocessed {
    pub code: String,
    /// `None` when no section changed.
    pub map: Option<PositionMap>,
}

/// A section's replacement content.
struct SectionOutput {
    code: String,
    /// Maps `code` to the section content.
    map: Option<PositionMap>,
}

pub(crate) struct DocumentPreprocessor<'a, T> {
    pub toolchain: &'a T,
    pub options: &'a PipelineOptions,
    pub reporter: &'a dyn Reporter,
    pub path: &'a Utf8Path,
    pub source: &'a str,
}

impl<T: Toolchain> DocumentPreprocessor<'_, T> {
    pub async fn run(&self, document: &ComponentDocument) -> Result<Preprocessed, Failure> {
        let index = LineIndex::new(self.source);
        let mut outputs = Vec::new();

        for section in document.sections() {
            let base = index
                .utf16_line_col(self.source, section.content_span.start)
                .unwrap_or_default();
            let output = match section.kind {
                SectionKind::Script => self.script(section, base).await?,
                SectionKind::Style => self.style(section, base).await?,
            };
            if let Some(output) = output {
                outputs.push((section, output));
            }
        }

        if outputs.is_empty() {
            return Ok(Preprocessed {
                code: self.source.to_string(),
                map: None,
            });
        }

        Ok(self.splice(&index, outputs))
    }

    async fn script(
        &self,
        section: &Section,
        base: LineCol,
    ) -> Result<Option<SectionOutput>, Failure> {
        let lang = ScriptLang::from_attribute(section.lang());
        let mut code = None;
        let mut map = None;

        if let Some(syntax) = lang.rewrite_syntax() {
            let options = RewriteOptions {
                context: section.context(),
                syntax,
                tracker_module: self.options.tracker_module.clone(),
                filename: Some(self.path.to_string()),
            };
            let rewritten = rewrite_reactive(&section.content, &options).map_err(
                |RewriteError::Parse {
                     message,
                     line,
                     column,
                 }| {
                    DocumentError::at(message, ToolPosition::new(line, column).relative_to(base))
                },
            )?;
            if rewritten.is_modified() {
                code = Some(rewritten.code);
                map = rewritten.map;
            }
        }

        if !lang.needs_transform() {
            return Ok(code.map(|code| SectionOutput { code, map }));
        }

        let input = code.unwrap_or_else(|| section.content.clone());
        let transformed = self
            .transform(SectionLang::Script(lang), section, input, map.as_ref(), base)
            .await?;
        Ok(Some(SectionOutput {
            code: transformed.code,
            map: compose_optional(transformed.map, map),
        }))
    }

    async fn style(
        &self,
        section: &Section,
        base: LineCol,
    ) -> Result<Option<SectionOutput>, Failure> {
        let lang = StyleLang::from_attribute(section.lang());
        match lang {
            StyleLang::Css => return Ok(None),
            StyleLang::Postcss if self.options.postcss_plugins.is_empty() => {
                warn!(path = %self.path, "no postcss plugins configured, style left as is");
                return Ok(None);
            }
            _ => {}
        }

        let output = self
            .transform(SectionLang::Style(lang), section, section.content.clone(), None, base)
            .await?;
        Ok(Some(output))
    }

    /// Runs the sub-transformer for `lang` over `content`.
    ///
    /// `prior` maps `content` to the section content; failure positions are
    /// read through it.
    async fn transform(
        &self,
        lang: SectionLang,
        section: &Section,
        content: String,
        prior: Option<&PositionMap>,
        base: LineCol,
    ) -> Result<SectionOutput, Failure> {
        let request = PreprocessRequest {
            lang,
            content,
            attributes: attributes(section),
            filename: self.path.to_string(),
        };

        let output = self.toolchain.preprocess(request).await.map_err(|err| match err {
            ToolError::Failed(failure) => {
                let position = failure
                    .start
                    .and_then(|start| lift_position(start, prior))
                    .map(|start| start.relative_to(base));
                Failure::Document(DocumentError {
                    message: failure.message,
                    line: position.map(|p| p.line),
                    column: position.map(|p| p.column),
                })
            }
            ToolError::Host(message) => Failure::Internal(InternalError::Host {
                stage: Stage::Preprocess,
                message,
            }),
        })?;

        for dependency in &output.dependencies {
            self.reporter.dependency(self.path, dependency);
        }

        Ok(SectionOutput {
            code: output.code,
            map: output.map,
        })
    }

    fn splice(&self, index: &LineIndex, outputs: Vec<(&Section, SectionOutput)>) -> Preprocessed {
        let mut builder = SourceMapBuilder::new();
        let mut cursor = ByteOffset::from(0);
        let mut lifted = Vec::new();

        for (section, output) in outputs {
            let start = section.content_span.start;
            builder.add_source(cursor, &self.source[usize::from(cursor)..usize::from(start)]);
            match output.map {
                Some(map) => {
                    lifted.push((builder.generated_offset(), start, map));
                    builder.add_external(&output.code);
                }
                None => builder.add_transformed(section.content_span, &output.code),
            }
            cursor = section.content_span.end;
        }
        builder.add_source(cursor, &self.source[usize::from(cursor)..]);

        let (code, spans) = builder.finish();
        let mut map = spans.to_position_map(&code, self.source, self.path.as_str());

        let generated_index = LineIndex::new(&code);
        for (generated, original, section_map) in &lifted {
            let generated_base = generated_index
                .utf16_line_col(&code, *generated)
                .unwrap_or_default();
            let original_base = index
                .utf16_line_col(self.source, *original)
                .unwrap_or_default();
            map.extend_shifted(section_map, generated_base, original_base, 0);
        }
        map.set_source_content(0, self.source);

        Preprocessed {
            code,
            map: Some(map),
        }
    }
}

/// Reads a position in a stage output as a position in the stage input.
///
/// Without a map the stage kept positions as they were. Positions that fall
/// into generated text resolve to `None`.
pub(crate) fn lift_position(
    position: ToolPosition,
    map: Option<&PositionMap>,
) -> Option<ToolPosition> {
    match map {
        None => Some(position),
        Some(map) => map
            .original_position_for(position.to_line_col())
            .map(|resolved| ToolPosition::from_line_col(resolved.position)),
    }
}

/// Opening-tag attributes as sent to sub-transformers.
fn attributes(section: &Section) -> IndexMap<String, String> {
    section
        .attributes
        .iter()
        .map(|attr| {
            let value = attr.value.as_deref().unwrap_or("true");
            (attr.name.to_string(), value.to_string())
        })
        .collect()
}
