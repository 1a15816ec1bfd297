//! Document pipeline for melte.
//!
//! A [`Pipeline`] takes a component document through:
//! - section extraction and the `$m:` reactive rewrite of the instance script
//! - language sub-transformers for scripts and styles
//! - the component compiler
//! - optional hot-reload instrumentation
//! - the final transpiler
//!
//! Every stage map is composed with the ones before it, so the map returned
//! with the output points straight into the original document. The external
//! tools sit behind the [`Toolchain`] trait.

mod error;
mod lang;
mod options;
mod pipeline;
mod preprocess;
mod toolchain;

pub use error::{
    format_with_frame, DocumentError, InternalError, Stage, ToolError, ToolFailure, ToolPosition,
};
pub use lang::{ScriptLang, SectionLang, StyleLang};
pub use options::{component_name, CompileOptions, PipelineOptions, Target};
pub use pipeline::{Compiled, DocumentInput, Pipeline};
pub use toolchain::{
    CompileRequest, InstrumentRequest, PreprocessOutput, PreprocessRequest, Reporter, StageOutput,
    Toolchain, TranspileRequest,
};

pub use melte_parser::{HtmlSection, HtmlSectionKind};
pub use source_map::PositionMap;
