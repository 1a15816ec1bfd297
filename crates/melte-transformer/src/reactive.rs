//! Rewriting of `$m:` reactive statements.
//!
//! A top-level statement labelled `$m` becomes a compiler reactive statement
//! whose body runs inside a tracker wrapper:
//!
//! ```text
//! $m: doubled = count * 2;
//! ```
//!
//! becomes
//!
//! ```text
//! import { createReactiveWrapper as _m_createReactiveWrapper } from "melte/tracker";
//! const _m_tracker0 = _m_createReactiveWrapper();
//! let doubled;
//! ...
//! $: _m_tracker0(() => { doubled = count * 2; });
//! ```
//!
//! The compiler declares undeclared names assigned in a `$:` statement on its
//! own; once the assignment moves into a closure it no longer does, so those
//! names get an explicit `let`.
//!
//! Only the replaced statements are new text. Everything else, including the
//! wrapped body, is copied from the input verbatim, which keeps the stage map
//! exact for every original token.

use indexmap::IndexSet;
use melte_parser::ScriptContext;
use smol_str::SmolStr;
use source_map::{PositionMap, SourceMapBuilder, Span};
use swc_common::Spanned;
use swc_ecma_ast::*;
use text_size::TextSize;

use crate::error::RewriteError;
use crate::parse::{parse_module, ScriptSyntax};
use crate::scope::{analyze, collect_object_pat_prop_idents, collect_pat_idents};

/// The label that marks a reactive statement.
pub const REACTIVE_LABEL: &str = "$m";

/// Module the tracker wrapper factory is imported from by default.
pub const DEFAULT_TRACKER_MODULE: &str = "melte/tracker";

const WRAPPER_CREATOR: &str = "_m_createReactiveWrapper";
const TRACKER_PREFIX: &str = "_m_tracker";

/// Options for [`rewrite_reactive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    pub context: ScriptContext,
    pub syntax: ScriptSyntax,
    pub tracker_module: String,
    /// Source name recorded in the stage map.
    pub filename: Option<String>,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            context: ScriptContext::Default,
            syntax: ScriptSyntax::JavaScript,
            tracker_module: DEFAULT_TRACKER_MODULE.to_string(),
            filename: None,
        }
    }
}

/// One rewritten `$m:` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactiveBlock {
    /// Assigned in discovery order, starting at 0.
    pub sequence_id: u32,
    /// The whole labelled statement in the input.
    pub statement: Span,
    /// The statement's body in the input.
    pub body: Span,
}

/// The result of [`rewrite_reactive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutput {
    pub code: String,
    /// `None` when the input was returned unchanged.
    pub map: Option<PositionMap>,
    pub blocks: Vec<ReactiveBlock>,
    /// Names given a `let` declaration, in discovery order.
    pub injected: Vec<SmolStr>,
}

impl RewriteOutput {
    fn unchanged(content: &str) -> Self {
        Self {
            code: content.to_string(),
            map: None,
            blocks: Vec::new(),
            injected: Vec::new(),
        }
    }

    pub fn is_modified(&self) -> bool {
        !self.blocks.is_empty()
    }
}

/// Returns the tracker binding name for a block.
pub fn tracker_name(sequence_id: u32) -> String {
    format!("{TRACKER_PREFIX}{sequence_id}")
}

/// Rewrites every top-level `$m:` statement of an instance script.
///
/// Module-context scripts are returned unchanged without being parsed.
pub fn rewrite_reactive(
    content: &str,
    options: &RewriteOptions,
) -> Result<RewriteOutput, RewriteError> {
    if options.context == ScriptContext::Module {
        return Ok(RewriteOutput::unchanged(content));
    }

    let parsed = parse_module(content, options.syntax)?;
    // Globals must be computed on the untouched tree.
    let analysis = analyze(&parsed.module.body);

    let mut blocks = Vec::new();
    let mut injected: IndexSet<SmolStr> = IndexSet::new();

    for item in &parsed.module.body {
        let ModuleItem::Stmt(Stmt::Labeled(labeled)) = item else {
            continue;
        };
        if &*labeled.label.sym != REACTIVE_LABEL {
            continue;
        }

        for name in assigned_names(&labeled.body) {
            if !name.starts_with('$') && analysis.is_global(&name) {
                injected.insert(name);
            }
        }

        let (statement_start, statement_end) = parsed.range(labeled.span);
        let (body_start, body_end) = parsed.range(labeled.body.span());
        blocks.push(ReactiveBlock {
            sequence_id: blocks.len() as u32,
            statement: offsets(statement_start, statement_end),
            body: offsets(body_start, body_end),
        });
    }

    if blocks.is_empty() {
        return Ok(RewriteOutput::unchanged(content));
    }

    tracing::debug!(
        blocks = blocks.len(),
        injected = injected.len(),
        "rewrote reactive statements"
    );

    let mut builder = SourceMapBuilder::new();
    builder.add_generated(&prologue(&options.tracker_module, &blocks, &injected));

    let mut cursor = 0usize;
    for block in &blocks {
        let statement_start = usize::from(block.statement.start);
        let body_start = usize::from(block.body.start);
        let body_end = usize::from(block.body.end);

        builder.add_source(TextSize::from(cursor as u32), &content[cursor..statement_start]);
        builder.add_transformed(
            Span::new(block.statement.start, block.body.start),
            &format!("$: {}(() => {{ ", tracker_name(block.sequence_id)),
        );
        builder.add_source(block.body.start, &content[body_start..body_end]);
        builder.add_generated(" });");

        cursor = usize::from(block.statement.end);
    }
    builder.add_source(TextSize::from(cursor as u32), &content[cursor..]);

    let (code, spans) = builder.finish();
    let mut map = spans.to_position_map(
        &code,
        content,
        options.filename.as_deref().unwrap_or("script"),
    );
    map.set_source_content(0, content);

    Ok(RewriteOutput {
        code,
        map: Some(map),
        blocks,
        injected: injected.into_iter().collect(),
    })
}

fn offsets(start: usize, end: usize) -> Span {
    Span::new(start as u32, end as u32)
}

/// Names bound by the assignment a reactive body consists of, if any.
fn assigned_names(body: &Stmt) -> Vec<SmolStr> {
    let Stmt::Expr(ExprStmt { expr, .. }) = body else {
        return Vec::new();
    };

    let mut expr: &Expr = expr;
    while let Expr::Paren(paren) = expr {
        expr = &*paren.expr;
    }
    let Expr::Assign(assign) = expr else {
        return Vec::new();
    };

    let mut idents = Vec::new();
    match &assign.left {
        AssignTarget::Simple(SimpleAssignTarget::Ident(ident)) => idents.push(&ident.id),
        // Member targets write into an existing object.
        AssignTarget::Simple(_) => {}
        AssignTarget::Pat(AssignTargetPat::Array(array)) => {
            for elem in array.elems.iter().flatten() {
                collect_pat_idents(elem, &mut idents);
            }
        }
        AssignTarget::Pat(AssignTargetPat::Object(object)) => {
            for prop in &object.props {
                collect_object_pat_prop_idents(prop, &mut idents);
            }
        }
        AssignTarget::Pat(AssignTargetPat::Invalid(_)) => {}
    }

    idents
        .into_iter()
        .map(|ident| SmolStr::new(ident.sym.as_ref()))
        .collect()
}

fn prologue(tracker_module: &str, blocks: &[ReactiveBlock], injected: &IndexSet<SmolStr>) -> String {
    let mut out = format!(
        "import {{ createReactiveWrapper as {WRAPPER_CREATOR} }} from {};\n",
        js_string(tracker_module)
    );
    for block in blocks {
        out.push_str(&format!(
            "const {} = {WRAPPER_CREATOR}();\n",
            tracker_name(block.sequence_id)
        ));
    }
    for name in injected {
        out.push_str(&format!("let {name};\n"));
    }
    out
}

fn js_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
