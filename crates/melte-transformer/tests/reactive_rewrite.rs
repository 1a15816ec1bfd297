use melte_parser::ScriptContext;
use melte_transformer::{
    analyze_source, rewrite_reactive, tracker_name, RewriteError, RewriteOptions, ScriptSyntax,
};
use pretty_assertions::assert_eq;
use source_map::LineCol;

fn rewrite(content: &str) -> melte_transformer::RewriteOutput {
    rewrite_reactive(content, &RewriteOptions::default()).unwrap()
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

fn script_with_blocks(n: usize) -> String {
    let mut script = String::from("let base = 1;\n");
    for i in 0..n {
        script.push_str(&format!("$m: value{i} = base + {i};\n"));
    }
    script
}

#[test]
fn test_block_count_matches_factories_and_call_sites() {
    for n in [0usize, 1, 5] {
        let output = rewrite(&script_with_blocks(n));

        assert_eq!(output.blocks.len(), n);
        assert_eq!(count(&output.code, "= _m_createReactiveWrapper();"), n);
        assert_eq!(count(&output.code, "$: _m_tracker"), n);
        assert_eq!(count(&output.code, "$m:"), 0);

        for id in 0..n as u32 {
            let name = tracker_name(id);
            assert_eq!(count(&output.code, &format!("const {name} = ")), 1);
            assert_eq!(count(&output.code, &format!("$: {name}(() => {{")), 1);
        }

        let imports = count(&output.code, "import { createReactiveWrapper as");
        assert_eq!(imports, usize::from(n > 0));
    }
}

#[test]
fn test_sequence_ids_follow_discovery_order() {
    let output = rewrite(&script_with_blocks(3));
    let ids: Vec<_> = output.blocks.iter().map(|b| b.sequence_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);

    let first = output.code.find("value0 = base").unwrap();
    let last = output.code.find("value2 = base").unwrap();
    assert!(output.code[..first].ends_with("$: _m_tracker0(() => { "));
    assert!(output.code[..last].ends_with("$: _m_tracker2(() => { "));
}

#[test]
fn test_prologue_order() {
    let output = rewrite("$m: b = 1;\n$m: [a, b] = pair;\n$m: c = a;\n");
    let prologue: Vec<_> = output.code.lines().take(7).collect();
    assert_eq!(
        prologue,
        vec![
            r#"import { createReactiveWrapper as _m_createReactiveWrapper } from "melte/tracker";"#,
            "const _m_tracker0 = _m_createReactiveWrapper();",
            "const _m_tracker1 = _m_createReactiveWrapper();",
            "const _m_tracker2 = _m_createReactiveWrapper();",
            "let b;",
            "let a;",
            "let c;",
        ]
    );
    assert_eq!(output.injected, vec!["b", "a", "c"]);
}

#[test]
fn test_injected_names_are_exactly_the_free_non_dollar_targets() {
    let content = "import { shared } from './shared';\n\
                   let local = 0;\n\
                   $m: local = shared + 1;\n\
                   $m: shared = 2;\n\
                   $m: $store = 3;\n\
                   $m: [free, local] = pair;\n\
                   $m: ({ nested: { deep } } = tree);\n\
                   $m: obj.prop = 4;\n";
    let output = rewrite(content);

    let globals = analyze_source(content, ScriptSyntax::JavaScript).unwrap();
    for name in &output.injected {
        assert!(globals.is_global(name));
        assert!(!name.starts_with('$'));
    }
    assert_eq!(output.injected, vec!["free", "deep"]);
}

#[test]
fn test_no_label_input_is_byte_identical() {
    let content = "\n  // leading comment\n  let a = 1;   \n\n  function f() { return a }\n";
    let output = rewrite(content);
    assert_eq!(output.code, content);
    assert!(output.map.is_none());
    assert!(output.blocks.is_empty());
}

#[test]
fn test_module_context_is_never_rewritten() {
    let options = RewriteOptions {
        context: ScriptContext::Module,
        ..Default::default()
    };
    let content = "$m: x = 1;\nthis is not ( valid";
    let output = rewrite_reactive(content, &options).unwrap();
    assert_eq!(output.code, content);
    assert!(output.map.is_none());
}

#[test]
fn test_parse_error_is_reported_with_position() {
    let err = rewrite_reactive("let ok = 1;\n$m: x = ;\n", &RewriteOptions::default()).unwrap_err();
    let RewriteError::Parse { line, column, message } = &err;
    assert_eq!(*line, 2);
    assert!(*column >= 4, "column {column}");
    assert!(!message.is_empty());
}

#[test]
fn test_recoverable_syntax_error_is_not_rewritten() {
    let err = rewrite_reactive("$m: x = 1;\nconst c;\n", &RewriteOptions::default()).unwrap_err();
    let RewriteError::Parse { line, .. } = &err;
    assert_eq!(*line, 2);

    let typed = "let n: number = 1;\n$m: x = n;\n";
    assert!(rewrite_reactive(typed, &RewriteOptions::default()).is_err());
}

#[test]
fn test_typescript_script() {
    let options = RewriteOptions {
        syntax: ScriptSyntax::TypeScript,
        ..Default::default()
    };
    let content = "interface Item { price: number }\n\
                   export let items: Item[] = [];\n\
                   $m: total = items.reduce((sum: number, item: Item) => sum + item.price, 0) as number;\n";
    let output = rewrite_reactive(content, &options).unwrap();
    assert_eq!(output.injected, vec!["total"]);
    assert!(output.code.contains(
        "$: _m_tracker0(() => { total = items.reduce((sum: number, item: Item) => sum + item.price, 0) as number; });"
    ));
}

#[test]
fn test_comments_and_formatting_survive() {
    let content = "// keep me\nlet a = 1; /* inline */ $m: b = a; // trailing\nconst c   =   2;\n";
    let output = rewrite(content);
    assert!(output.code.contains("// keep me\nlet a = 1; /* inline */ $: _m_tracker0(() => { b = a; }); // trailing\nconst c   =   2;\n"));
}

#[test]
fn test_every_original_line_maps_back() {
    let content = "let a = 1;\n$m: b = a + 1;\nconst c = b;\n";
    let output = rewrite(content);
    let map = output.map.unwrap();

    for (original_line, text) in content.lines().enumerate() {
        let needle = if text.starts_with("$m:") { "b = a" } else { text };
        let (generated_line, generated_text) = output
            .code
            .lines()
            .enumerate()
            .find(|(_, line)| line.contains(needle))
            .unwrap();
        let col = generated_text.find(needle).unwrap() as u32;
        let found = map
            .original_position_for(LineCol::new(generated_line as u32, col))
            .unwrap();
        assert_eq!(found.position.line, original_line as u32);
        assert_eq!(
            found.position.col,
            content.lines().nth(original_line).unwrap().find(needle).unwrap() as u32
        );
    }
}

#[test]
fn test_self_referencing_body_without_semicolon() {
    let output = rewrite("$m: x = x + 1");
    assert_eq!(output.injected, vec!["x"]);
    assert!(output.code.contains("let x;\n"));
    assert!(output.code.ends_with("$: _m_tracker0(() => { x = x + 1 });"));
}
