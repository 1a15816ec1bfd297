//! Collaborator interfaces.
//!
//! The pipeline owns sequencing and map composition; the tools it drives
//! (language sub-transformers, the component compiler, hot-reload
//! instrumentation, the final transpiler) sit behind [`Toolchain`], and
//! user-facing output goes through [`Reporter`].

use std::future::Future;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::Serialize;
use source_map::PositionMap;

use crate::error::{DocumentError, ToolError};
use crate::lang::SectionLang;
use crate::options::CompileOptions;

/// Input to a language sub-transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreprocessRequest {
    pub lang: SectionLang,
    pub content: String,
    /// Opening-tag attributes; boolean attributes map to `"true"`.
    pub attributes: IndexMap<String, String>,
    pub filename: String,
}

/// Output of a language sub-transformer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreprocessOutput {
    pub code: String,
    pub map: Option<PositionMap>,
    /// Files read while transforming (imports, partials); edits to them
    /// invalidate the document.
    pub dependencies: Vec<Utf8PathBuf>,
}

/// Code plus the map from it to the stage input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutput {
    pub code: String,
    pub map: Option<PositionMap>,
}

/// Input to the downstream component compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileRequest {
    pub code: String,
    pub options: CompileOptions,
}

/// Input to hot-reload instrumentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstrumentRequest {
    /// Compiled component code.
    pub code: String,
    /// The preprocessed document the code was compiled from.
    pub source: String,
    pub options: CompileOptions,
}

/// Input to the final transpiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranspileRequest {
    pub code: String,
    pub filename: String,
}

/// The external tools a pipeline run drives.
///
/// Implementations are shared by every concurrent run and must construct
/// their expensive handles at most once.
pub trait Toolchain: Send + Sync {
    fn preprocess(
        &self,
        request: PreprocessRequest,
    ) -> impl Future<Output = Result<PreprocessOutput, ToolError>> + Send;

    fn compile(
        &self,
        request: CompileRequest,
    ) -> impl Future<Output = Result<StageOutput, ToolError>> + Send;

    fn instrument(
        &self,
        request: InstrumentRequest,
    ) -> impl Future<Output = Result<String, ToolError>> + Send;

    fn transpile(
        &self,
        request: TranspileRequest,
    ) -> impl Future<Output = Result<StageOutput, ToolError>> + Send;
}

/// Receives user-facing results of document runs.
pub trait Reporter: Send + Sync {
    /// Exactly one call per failing document.
    fn error(&self, path: &Utf8Path, error: DocumentError);

    /// A file the document depends on; watchers should rebuild the document
    /// when it changes.
    fn dependency(&self, path: &Utf8Path, dependency: &Utf8Path);
}
