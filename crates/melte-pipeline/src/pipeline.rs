//! The document pipeline.

use camino::Utf8PathBuf;
use melte_parser::{detect, DocumentKind, HtmlSection, ScanError};
use source_map::{compose_optional, LineIndex, PositionMap};
use tracing::debug;

use crate::error::{
    format_with_frame, DocumentError, Failure, InternalError, Stage, ToolError, ToolPosition,
};
use crate::options::{CompileOptions, PipelineOptions, Target};
use crate::preprocess::{lift_position, DocumentPreprocessor};
use crate::toolchain::{CompileRequest, InstrumentRequest, Reporter, Toolchain, TranspileRequest};

/// Dead accept call emitted by instrumentation, removed from the output.
const HOT_ACCEPT_STUB: &str = "if (false) import.meta.hot.accept();";

/// One document to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInput {
    pub path: Utf8PathBuf,
    pub source: String,
}

impl DocumentInput {
    pub fn new(path: impl Into<Utf8PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// The result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compiled {
    /// Transpiled JavaScript and the map from it to the original document.
    Component {
        code: String,
        map: Option<PositionMap>,
    },
    /// Head/body markup of a plain HTML file, in document order.
    Markup(Vec<HtmlSection>),
}

/// Runs documents through preprocessing, compilation, optional hot-reload
/// instrumentation and transpilation.
///
/// A pipeline holds no per-document state and can be shared by any number
/// of concurrent runs.
#[derive(Debug)]
pub struct Pipeline<T> {
    toolchain: T,
    options: PipelineOptions,
}

impl<T: Toolchain> Pipeline<T> {
    pub fn new(toolchain: T, options: PipelineOptions) -> Self {
        Self { toolchain, options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Runs one document.
    ///
    /// The first failing stage ends the run. A failure caused by the document
    /// is passed to `reporter` and the run yields `Ok(None)`; failures without
    /// a position and toolchain breakdowns are returned as errors.
    pub async fn run(
        &self,
        input: &DocumentInput,
        reporter: &dyn Reporter,
    ) -> Result<Option<Compiled>, InternalError> {
        match self.run_stages(input, reporter).await {
            Ok(compiled) => Ok(Some(compiled)),
            Err(Failure::Document(error)) => {
                debug!(path = %input.path, %error, "document failed");
                reporter.error(&input.path, error);
                Ok(None)
            }
            Err(Failure::Internal(error)) => Err(error),
        }
    }

    async fn run_stages(
        &self,
        input: &DocumentInput,
        reporter: &dyn Reporter,
    ) -> Result<Compiled, Failure> {
        let path = input.path.as_path();
        let source = input.source.as_str();

        let document = match detect(path.as_str(), source).map_err(|err| scan_error(err, source))? {
            DocumentKind::Markup(sections) => {
                debug!(%path, sections = sections.len(), "markup-only document");
                return Ok(Compiled::Markup(sections));
            }
            DocumentKind::Component(document) => document,
        };

        let preprocessed = DocumentPreprocessor {
            toolchain: &self.toolchain,
            options: &self.options,
            reporter,
            path,
            source,
        }
        .run(&document)
        .await?;
        debug!(%path, changed = preprocessed.map.is_some(), "preprocessed");

        let options = CompileOptions::for_document(path, &self.options);
        let compiled = self
            .toolchain
            .compile(CompileRequest {
                code: preprocessed.code.clone(),
                options: options.clone(),
            })
            .await
            .map_err(|err| stage_error(Stage::Compile, err, preprocessed.map.as_ref(), true))?;
        let mut code = compiled.code;
        let mut map = compose_optional(compiled.map, preprocessed.map);
        debug!(%path, target = options.target.as_str(), "compiled");

        if self.options.hot && self.options.target == Target::Browser {
            let instrumented = self
                .toolchain
                .instrument(InstrumentRequest {
                    code,
                    source: preprocessed.code,
                    options,
                })
                .await
                .map_err(|err| stage_error(Stage::Instrument, err, map.as_ref(), false))?;
            code = instrumented.replace(HOT_ACCEPT_STUB, "");
            debug!(%path, "instrumented for hot reload");
        }

        let transpiled = self
            .toolchain
            .transpile(TranspileRequest {
                code,
                filename: path.to_string(),
            })
            .await
            .map_err(|err| stage_error(Stage::Transpile, err, map.as_ref(), false))?;
        map = compose_optional(transpiled.map, map);
        debug!(%path, mapped = map.is_some(), "transpiled");

        Ok(Compiled::Component {
            code: transpiled.code,
            map,
        })
    }
}

fn scan_error(err: ScanError, source: &str) -> Failure {
    let position = LineIndex::new(source)
        .utf16_line_col(source, err.span.start)
        .map(ToolPosition::from_line_col);
    let message = err.to_string();
    Failure::Document(match position {
        Some(position) => DocumentError::at(message, position),
        None => DocumentError::new(message),
    })
}

/// Classifies a failure of a stage that runs after preprocessing.
///
/// `map` leads from the stage input back to the original document. A
/// failure without a position is a document error only for the compiler.
fn stage_error(
    stage: Stage,
    err: ToolError,
    map: Option<&PositionMap>,
    unpositioned_is_document: bool,
) -> Failure {
    match err {
        ToolError::Host(message) => Failure::Internal(InternalError::Host { stage, message }),
        ToolError::Failed(failure) => {
            if failure.start.is_none() && !unpositioned_is_document {
                return Failure::Internal(InternalError::Unpositioned {
                    stage,
                    message: failure.message,
                });
            }
            let message = format_with_frame(&failure.message, failure.frame.as_deref());
            let position = failure.start.and_then(|start| lift_position(start, map));
            Failure::Document(match position {
                Some(position) => DocumentError::at(message, position),
                None => DocumentError::new(message),
            })
        }
    }
}
