//! Source position tracking and stage map composition for melte.
//!
//! A component goes through several tools before it reaches the browser
//! (reactive rewrite, language preprocessors, the component compiler, hot
//! reload instrumentation, the final transpiler). Each tool reports a map from
//! its output back to its input. This crate provides:
//! - byte spans and a line index for offset ↔ line/column conversion
//! - a span-based builder used while splicing text
//! - [`PositionMap`], the line/column map exchanged between stages
//! - [`compose`], which chains two adjacent stage maps into one
//! - v3 JSON encoding and decoding

mod builder;
mod compose;
mod line_index;
mod position_map;
mod span;
mod v3;

pub use builder::{Mapping, SourceMap, SourceMapBuilder};
pub use compose::{compose, compose_optional};
pub use line_index::{LineCol, LineIndex};
pub use position_map::{OriginalLocation, PositionMap, PositionMapping, ResolvedPosition};
pub use span::{ByteOffset, Span};
pub use v3::MapDecodeError;
