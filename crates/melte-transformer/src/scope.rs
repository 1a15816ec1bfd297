//! Free-name analysis for a script's top-level statements.
//!
//! One visitor pass builds a scope tree and records every identifier
//! reference together with the scope it occurs in. References are resolved
//! after the pass, so `var` hoisting and use-before-declaration come out
//! right. Whatever does not resolve is a global.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

/// The names a script references without declaring them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeAnalysis {
    pub globals: FxHashSet<SmolStr>,
}

impl ScopeAnalysis {
    pub fn is_global(&self, name: &str) -> bool {
        self.globals.contains(name)
    }
}

/// Computes the globally-bound names referenced by `items`.
pub fn analyze(items: &[ModuleItem]) -> ScopeAnalysis {
    let mut analyzer = ScopeAnalyzer::new();
    for item in items {
        item.visit_with(&mut analyzer);
    }
    analyzer.finish()
}

type ScopeId = usize;

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    is_function: bool,
    declarations: FxHashSet<SmolStr>,
}

struct ScopeAnalyzer {
    scopes: Vec<Scope>,
    current: ScopeId,
    references: Vec<(SmolStr, ScopeId)>,
}

impl ScopeAnalyzer {
    fn new() -> Self {
        Self {
            scopes: vec![Scope {
                parent: None,
                is_function: true,
                declarations: FxHashSet::default(),
            }],
            current: 0,
            references: Vec::new(),
        }
    }

    fn enter_scope(&mut self, is_function: bool) {
        self.scopes.push(Scope {
            parent: Some(self.current),
            is_function,
            declarations: FxHashSet::default(),
        });
        self.current = self.scopes.len() - 1;
    }

    fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    fn declare(&mut self, ident: &Ident) {
        self.scopes[self.current]
            .declarations
            .insert(SmolStr::new(ident.sym.as_ref()));
    }

    fn declare_hoisted(&mut self, ident: &Ident) {
        let mut scope = self.current;
        while !self.scopes[scope].is_function {
            match self.scopes[scope].parent {
                Some(parent) => scope = parent,
                None => break,
            }
        }
        self.scopes[scope]
            .declarations
            .insert(SmolStr::new(ident.sym.as_ref()));
    }

    fn declare_pat(&mut self, pat: &Pat, hoisted: bool) {
        let mut names = Vec::new();
        collect_pat_idents(pat, &mut names);
        for ident in names {
            if hoisted {
                self.declare_hoisted(ident);
            } else {
                self.declare(ident);
            }
        }
    }

    fn reference(&mut self, ident: &Ident) {
        self.references
            .push((SmolStr::new(ident.sym.as_ref()), self.current));
    }

    fn resolves(&self, name: &SmolStr, from: ScopeId) -> bool {
        let mut scope = Some(from);
        while let Some(id) = scope {
            if self.scopes[id].declarations.contains(name) {
                return true;
            }
            scope = self.scopes[id].parent;
        }
        false
    }

    fn finish(self) -> ScopeAnalysis {
        let globals = self
            .references
            .iter()
            .filter(|(name, scope)| !self.resolves(name, *scope))
            .map(|(name, _)| name.clone())
            .collect();
        ScopeAnalysis { globals }
    }

    fn var_decl(&mut self, decl: &VarDecl) {
        let hoisted = decl.kind == VarDeclKind::Var;
        for declarator in &decl.decls {
            self.declare_pat(&declarator.name, hoisted);
        }
        for declarator in &decl.decls {
            declarator.name.visit_with(self);
            declarator.init.visit_with(self);
        }
    }
}

impl Visit for ScopeAnalyzer {
    fn visit_block_stmt(&mut self, block: &BlockStmt) {
        self.enter_scope(false);
        block.visit_children_with(self);
        self.exit_scope();
    }

    fn visit_import_decl(&mut self, decl: &ImportDecl) {
        for specifier in &decl.specifiers {
            let local = match specifier {
                ImportSpecifier::Named(named) => &named.local,
                ImportSpecifier::Default(default) => &default.local,
                ImportSpecifier::Namespace(namespace) => &namespace.local,
            };
            self.declare(local);
        }
    }

    fn visit_named_export(&mut self, export: &NamedExport) {
        // Re-exports name another module's bindings.
        if export.src.is_some() {
            return;
        }
        for specifier in &export.specifiers {
            if let ExportSpecifier::Named(named) = specifier {
                if let ModuleExportName::Ident(ident) = &named.orig {
                    self.reference(ident);
                }
            }
        }
    }

    fn visit_fn_decl(&mut self, func: &FnDecl) {
        self.declare(&func.ident);
        func.function.visit_with(self);
    }

    fn visit_fn_expr(&mut self, func: &FnExpr) {
        match &func.ident {
            Some(ident) => {
                self.enter_scope(false);
                self.declare(ident);
                func.function.visit_with(self);
                self.exit_scope();
            }
            None => func.function.visit_with(self),
        }
    }

    fn visit_function(&mut self, func: &Function) {
        func.decorators.visit_with(self);
        self.enter_scope(true);
        for param in &func.params {
            self.declare_pat(&param.pat, false);
        }
        func.params.visit_with(self);
        func.body.visit_with(self);
        self.exit_scope();
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
        self.enter_scope(true);
        for pat in &arrow.params {
            self.declare_pat(pat, false);
        }
        arrow.params.visit_with(self);
        arrow.body.visit_with(self);
        self.exit_scope();
    }

    fn visit_constructor(&mut self, ctor: &Constructor) {
        ctor.key.visit_with(self);
        self.enter_scope(true);
        for param in &ctor.params {
            match param {
                ParamOrTsParamProp::Param(param) => self.declare_pat(&param.pat, false),
                ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                    TsParamPropParam::Ident(ident) => self.declare(&ident.id),
                    TsParamPropParam::Assign(assign) => self.declare_pat(&assign.left, false),
                },
            }
        }
        ctor.params.visit_with(self);
        ctor.body.visit_with(self);
        self.exit_scope();
    }

    fn visit_setter_prop(&mut self, prop: &SetterProp) {
        prop.key.visit_with(self);
        self.enter_scope(true);
        if let Some(this_param) = &prop.this_param {
            self.declare_pat(this_param, false);
        }
        self.declare_pat(&prop.param, false);
        prop.param.visit_with(self);
        prop.body.visit_with(self);
        self.exit_scope();
    }

    fn visit_getter_prop(&mut self, prop: &GetterProp) {
        prop.key.visit_with(self);
        self.enter_scope(true);
        prop.body.visit_with(self);
        self.exit_scope();
    }

    fn visit_static_block(&mut self, block: &StaticBlock) {
        self.enter_scope(true);
        block.body.visit_with(self);
        self.exit_scope();
    }

    fn visit_class_decl(&mut self, decl: &ClassDecl) {
        self.declare(&decl.ident);
        decl.class.visit_with(self);
    }

    fn visit_class_expr(&mut self, expr: &ClassExpr) {
        self.enter_scope(false);
        if let Some(ident) = &expr.ident {
            self.declare(ident);
        }
        expr.class.visit_with(self);
        self.exit_scope();
    }

    fn visit_var_decl(&mut self, decl: &VarDecl) {
        self.var_decl(decl);
    }

    fn visit_using_decl(&mut self, decl: &UsingDecl) {
        for declarator in &decl.decls {
            self.declare_pat(&declarator.name, false);
        }
        decl.decls.visit_children_with(self);
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause) {
        self.enter_scope(false);
        if let Some(param) = &clause.param {
            self.declare_pat(param, false);
            param.visit_with(self);
        }
        clause.body.visit_with(self);
        self.exit_scope();
    }

    fn visit_for_stmt(&mut self, stmt: &ForStmt) {
        self.enter_scope(false);
        stmt.visit_children_with(self);
        self.exit_scope();
    }

    fn visit_for_in_stmt(&mut self, stmt: &ForInStmt) {
        self.enter_scope(false);
        stmt.visit_children_with(self);
        self.exit_scope();
    }

    fn visit_for_of_stmt(&mut self, stmt: &ForOfStmt) {
        self.enter_scope(false);
        stmt.visit_children_with(self);
        self.exit_scope();
    }

    fn visit_for_head(&mut self, head: &ForHead) {
        match head {
            ForHead::Pat(pat) => {
                let mut names = Vec::new();
                collect_pat_idents(pat, &mut names);
                for ident in names {
                    self.reference(ident);
                }
                pat.visit_with(self);
            }
            _ => head.visit_children_with(self),
        }
    }

    fn visit_labeled_stmt(&mut self, stmt: &LabeledStmt) {
        stmt.body.visit_with(self);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(ident) => self.reference(ident),
            _ => expr.visit_children_with(self),
        }
    }

    fn visit_simple_assign_target(&mut self, target: &SimpleAssignTarget) {
        match target {
            SimpleAssignTarget::Ident(ident) => self.reference(&ident.id),
            _ => target.visit_children_with(self),
        }
    }

    fn visit_assign_target_pat(&mut self, target: &AssignTargetPat) {
        let mut names = Vec::new();
        match target {
            AssignTargetPat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    collect_pat_idents(elem, &mut names);
                }
            }
            AssignTargetPat::Object(object) => {
                for prop in &object.props {
                    collect_object_pat_prop_idents(prop, &mut names);
                }
            }
            AssignTargetPat::Invalid(_) => {}
        }
        for ident in names {
            self.reference(ident);
        }
        target.visit_children_with(self);
    }

    fn visit_prop(&mut self, prop: &Prop) {
        match prop {
            Prop::Shorthand(ident) => self.reference(ident),
            _ => prop.visit_children_with(self),
        }
    }

    /// Patterns only contribute the expressions nested in them; their names
    /// are handled where the pattern is used.
    fn visit_pat(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(_) | Pat::Invalid(_) => {}
            Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.visit_pat(elem);
                }
            }
            Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => {
                            kv.key.visit_with(self);
                            self.visit_pat(&kv.value);
                        }
                        ObjectPatProp::Assign(assign) => {
                            assign.value.visit_with(self);
                        }
                        ObjectPatProp::Rest(rest) => self.visit_pat(&rest.arg),
                    }
                }
            }
            Pat::Assign(assign) => {
                self.visit_pat(&assign.left);
                assign.right.visit_with(self);
            }
            Pat::Rest(rest) => self.visit_pat(&rest.arg),
            Pat::Expr(expr) => expr.visit_with(self),
        }
    }

    fn visit_ts_enum_decl(&mut self, decl: &TsEnumDecl) {
        self.declare(&decl.id);
    }

    fn visit_ts_module_decl(&mut self, decl: &TsModuleDecl) {
        if let TsModuleName::Ident(ident) = &decl.id {
            self.declare(ident);
        }
    }

    fn visit_ts_import_equals_decl(&mut self, decl: &TsImportEqualsDecl) {
        self.declare(&decl.id);
    }

    fn visit_ts_interface_decl(&mut self, _decl: &TsInterfaceDecl) {}
    fn visit_ts_type_alias_decl(&mut self, _decl: &TsTypeAliasDecl) {}
    fn visit_ts_type(&mut self, _ty: &TsType) {}
    fn visit_ts_type_ann(&mut self, _ann: &TsTypeAnn) {}
    fn visit_ts_type_param_instantiation(&mut self, _params: &TsTypeParamInstantiation) {}
    fn visit_ts_type_param_decl(&mut self, _decl: &TsTypeParamDecl) {}
}

/// Collects the identifiers a pattern binds or assigns.
pub(crate) fn collect_pat_idents<'a>(pat: &'a Pat, out: &mut Vec<&'a Ident>) {
    match pat {
        Pat::Ident(ident) => out.push(&ident.id),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                collect_pat_idents(elem, out);
            }
        }
        Pat::Object(object) => {
            for prop in &object.props {
                collect_object_pat_prop_idents(prop, out);
            }
        }
        Pat::Assign(assign) => collect_pat_idents(&assign.left, out),
        Pat::Rest(rest) => collect_pat_idents(&rest.arg, out),
        Pat::Expr(_) | Pat::Invalid(_) => {}
    }
}

pub(crate) fn collect_object_pat_prop_idents<'a>(prop: &'a ObjectPatProp, out: &mut Vec<&'a Ident>) {
    match prop {
        ObjectPatProp::KeyValue(kv) => collect_pat_idents(&kv.value, out),
        ObjectPatProp::Assign(assign) => out.push(&assign.key.id),
        ObjectPatProp::Rest(rest) => collect_pat_idents(&rest.arg, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse_module, ScriptSyntax};
    use pretty_assertions::assert_eq;

    fn globals(source: &str, syntax: ScriptSyntax) -> Vec<String> {
        let parsed = parse_module(source, syntax).unwrap();
        let mut names: Vec<String> = analyze(&parsed.module.body)
            .globals
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        names.sort();
        names
    }

    fn js(source: &str) -> Vec<String> {
        globals(source, ScriptSyntax::JavaScript)
    }

    #[test]
    fn test_declared_names_are_not_global() {
        assert_eq!(js("let a = 1; const b = a; a = b;"), Vec::<String>::new());
    }

    #[test]
    fn test_undeclared_assignment_target_is_global() {
        assert_eq!(js("let a = 1; doubled = a * 2;"), vec!["doubled"]);
    }

    #[test]
    fn test_use_before_declaration_resolves() {
        assert_eq!(js("total = count; let count = 0; var total;"), Vec::<String>::new());
    }

    #[test]
    fn test_var_hoists_out_of_blocks() {
        assert_eq!(js("if (x) { var y = 1; } y = 2;"), vec!["x"]);
        assert_eq!(js("if (x) { let z = 1; } z = 2;"), vec!["x", "z"]);
    }

    #[test]
    fn test_function_scopes() {
        assert_eq!(
            js("function f(a, { b, c: [d] }, ...rest) { return a + b + d + rest + e; }"),
            vec!["e"]
        );
        assert_eq!(js("const g = (x = y) => x;"), vec!["y"]);
        assert_eq!(js("const h = function inner() { return inner; };"), Vec::<String>::new());
        assert_eq!(js("function outer() { var v; } v;"), vec!["v"]);
    }

    #[test]
    fn test_getter_and_static_block_bodies_are_function_scopes() {
        assert_eq!(
            js("const o = { get v() { var total = 1; return total; } }; total = 2;"),
            vec!["total"]
        );
        assert_eq!(
            js("class K { static { var count = 0; count; } } count = 1;"),
            vec!["count"]
        );
    }

    #[test]
    fn test_destructuring_assignment_targets() {
        assert_eq!(
            js("({ a, b: c, d = fallback, ...rest } = source); [e, [f]] = list;"),
            vec!["a", "c", "d", "e", "f", "fallback", "list", "rest", "source"]
        );
    }

    #[test]
    fn test_non_references() {
        // Labels, member properties and object keys are not references.
        assert_eq!(
            js("outer: for (;;) { break outer; } const o = { key: 1 }; o.prop = 2;"),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_shorthand_and_exports() {
        assert_eq!(js("const o = { shorthand }; export { local };"), vec!["local", "shorthand"]);
        assert_eq!(js("export { other } from './other';"), Vec::<String>::new());
    }

    #[test]
    fn test_imports_catch_and_classes() {
        assert_eq!(
            js("import a, { b as c } from 'm'; import * as ns from 'n';\n\
                try { a(c, ns); } catch (err) { err; }\n\
                class K { constructor(p) { p; } }\n\
                new K(); (class Named { m() { return Named; } });"),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_for_heads() {
        assert_eq!(js("for (const item of items) { item; }"), vec!["items"]);
        assert_eq!(js("for (key in obj) {}"), vec!["key", "obj"]);
    }

    #[test]
    fn test_typescript_type_positions_are_ignored() {
        let names = globals(
            "interface Props { value: Missing }\n\
             type Alias = Other;\n\
             let n: Unknown = 1;\n\
             total = n as Cast;\n\
             enum Color { Red }\n\
             Color.Red;",
            ScriptSyntax::TypeScript,
        );
        assert_eq!(names, vec!["total"]);
    }
}
