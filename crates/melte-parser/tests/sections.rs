use melte_parser::{
    detect, scan, DocumentKind, HtmlSectionKind, ScanErrorKind, ScriptContext, SectionKind,
};
use pretty_assertions::assert_eq;

#[test]
fn test_sections_in_document_order() {
    let source = r#"<style lang="scss">
  $c: red;
  p { color: $c; }
</style>

<script>
  $m: total = items.length;
</script>

<script module>
  export const prerender = true;
</script>

<p>{total}</p>
"#;
    let output = scan(source).unwrap();
    let kinds: Vec<_> = output
        .document
        .sections()
        .iter()
        .map(|s| (s.kind, s.context()))
        .collect();

    assert_eq!(
        kinds,
        vec![
            (SectionKind::Style, ScriptContext::Default),
            (SectionKind::Script, ScriptContext::Default),
            (SectionKind::Script, ScriptContext::Module),
        ]
    );
    assert_eq!(output.document.style.as_ref().unwrap().lang(), Some("scss"));
}

#[test]
fn test_nested_script_is_not_a_section() {
    let source = r#"<svelte:head>
  <script src="https://example.com/analytics.js"></script>
</svelte:head>
<script>let a = 1;</script>"#;
    let output = scan(source).unwrap();
    let instance = output.document.instance_script.unwrap();
    assert_eq!(instance.content, "let a = 1;");
    assert!(output.document.module_script.is_none());
}

#[test]
fn test_script_content_with_markup_like_text() {
    let source = "<script>\n  const html = '<div>' + \"</p>\";\n  if (a < b) {}\n</script>\n<div></div>";
    let output = scan(source).unwrap();
    let instance = output.document.instance_script.unwrap();
    assert_eq!(
        instance.content,
        "\n  const html = '<div>' + \"</p>\";\n  if (a < b) {}\n"
    );
}

#[test]
fn test_comments_are_skipped() {
    let source = "<!-- <script>not this</script> -->\n<script>let real;</script>";
    let output = scan(source).unwrap();
    assert_eq!(output.document.instance_script.unwrap().content, "let real;");
}

#[test]
fn test_attributes() {
    let source = r#"<script lang='ts' data-x={value} defer>let a;</script>"#;
    let output = scan(source).unwrap();
    let script = output.document.instance_script.unwrap();

    let attrs: Vec<_> = script
        .attributes
        .iter()
        .map(|a| (a.name.as_str(), a.value.as_deref()))
        .collect();
    assert_eq!(
        attrs,
        vec![("lang", Some("ts")), ("data-x", Some("{value}")), ("defer", None)]
    );
}

#[test]
fn test_type_attribute_gives_lang() {
    let output = scan(r#"<script type="text/coffeescript">x = 1</script>"#).unwrap();
    assert_eq!(
        output.document.instance_script.unwrap().lang(),
        Some("coffeescript")
    );
}

#[test]
fn test_unclosed_script_is_an_error() {
    let err = scan("<script>let a = 1;").unwrap_err();
    assert_eq!(
        err.kind,
        ScanErrorKind::UnclosedRawText {
            tag_name: "script".to_string()
        }
    );
    assert_eq!(u32::from(err.span.start), 0);
}

#[test]
fn test_duplicate_instance_script_is_an_error() {
    let err = scan("<script>let a;</script><script>let b;</script>").unwrap_err();
    assert_eq!(
        err.kind,
        ScanErrorKind::Duplicate {
            what: "instance script"
        }
    );
}

#[test]
fn test_markup_only_html_keeps_document_order() {
    let source = "<body><p>hello</p></body>\n<head><meta charset=\"utf-8\"></head>";
    let DocumentKind::Markup(sections) = detect("index.html", source).unwrap() else {
        panic!("expected markup");
    };
    let order: Vec<_> = sections.iter().map(|s| s.section).collect();
    assert_eq!(order, vec![HtmlSectionKind::Body, HtmlSectionKind::Head]);
    assert_eq!(sections[1].data, "<meta charset=\"utf-8\">");
}

#[test]
fn test_html_wrapper_hides_head_and_body() {
    // Only top-level head/body count.
    let source = "<html><head></head><body></body></html>";
    assert!(matches!(
        detect("index.html", source).unwrap(),
        DocumentKind::Component(_)
    ));
}

#[test]
fn test_unclosed_body_runs_to_end() {
    let DocumentKind::Markup(sections) = detect("main.html", "<body>\n  <div id=app></div>\n").unwrap()
    else {
        panic!("expected markup");
    };
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].data, "<div id=app></div>");
}

#[test]
fn test_section_debug_snapshot() {
    let output = scan(r#"<script module>export let a;</script>"#).unwrap();
    let script = output.document.module_script.unwrap();
    insta::assert_snapshot!(
        format!("{:?} {:?} {:?}", script.kind, script.span, script.content_span),
        @"Script Span { start: 0, end: 37 } Span { start: 15, end: 28 }"
    );
}
