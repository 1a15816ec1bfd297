//! Instance script transforms for melte.
//!
//! This crate provides:
//! - [`analyze`]: the set of globally-bound names a script references
//! - [`rewrite_reactive`]: the `$m:` reactive statement rewrite, with a stage
//!   map from the rewritten script back to the input script
//!
//! # Example
//!
//! ```
//! use melte_transformer::{rewrite_reactive, RewriteOptions};
//!
//! let output = rewrite_reactive("$m: doubled = count * 2;", &RewriteOptions::default()).unwrap();
//! assert!(output.code.contains("$: _m_tracker0(() => { doubled = count * 2; });"));
//! assert_eq!(output.injected[0].as_str(), "doubled");
//! ```

mod error;
mod parse;
mod reactive;
mod scope;

pub use error::RewriteError;
pub use parse::ScriptSyntax;
pub use reactive::{
    rewrite_reactive, tracker_name, ReactiveBlock, RewriteOptions, RewriteOutput,
    DEFAULT_TRACKER_MODULE, REACTIVE_LABEL,
};
pub use scope::{analyze, ScopeAnalysis};

/// Parses a script and returns its free names.
///
/// Convenience over [`analyze`] for callers that hold source text.
pub fn analyze_source(content: &str, syntax: ScriptSyntax) -> Result<ScopeAnalysis, RewriteError> {
    let parsed = parse::parse_module(content, syntax)?;
    Ok(analyze(&parsed.module.body))
}
