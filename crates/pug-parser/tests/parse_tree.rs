//! Tree-shape tests for the line parser.

use pretty_assertions::assert_eq;
use pug_parser::{parse, NodeKind, SyntaxNode};

fn named_kinds(node: &SyntaxNode) -> Vec<&'static str> {
    node.named_children().map(|c| c.kind.as_str()).collect()
}

fn first<'a>(node: &'a SyntaxNode, kind: NodeKind) -> &'a SyntaxNode {
    node.named_children()
        .find(|c| c.kind == kind)
        .unwrap_or_else(|| panic!("no {} child in {:?}", kind.as_str(), named_kinds(node)))
}

#[test]
fn test_tag_with_shorthand_and_content() {
    let source = "div.card#main hello";
    let result = parse(source);
    assert!(result.is_clean());

    let tag = result.root.named_child(0).unwrap();
    assert_eq!(tag.kind, NodeKind::Tag);
    assert_eq!(
        named_kinds(tag),
        vec!["tag_name", "class", "id", "content"]
    );
    assert_eq!(first(tag, NodeKind::TagName).text(source), "div");
    assert_eq!(first(tag, NodeKind::Class).text(source), ".card");
    assert_eq!(first(tag, NodeKind::Id).text(source), "#main");
    assert_eq!(first(tag, NodeKind::Content).text(source), "hello");
}

#[test]
fn test_attribute_list() {
    let source = "input(type='text', value=name)";
    let result = parse(source);
    assert!(result.is_clean());

    let tag = result.root.named_child(0).unwrap();
    let attrs = first(tag, NodeKind::Attributes);
    assert_eq!(attrs.named_child_count(), 2);

    let type_attr = attrs.named_child(0).unwrap();
    assert_eq!(
        named_kinds(type_attr),
        vec!["attribute_name", "quoted_attribute_value"]
    );
    assert_eq!(type_attr.named_child(1).unwrap().text(source), "'text'");

    let value_attr = attrs.named_child(1).unwrap();
    assert_eq!(named_kinds(value_attr), vec!["attribute_name", "javascript"]);
    assert_eq!(value_attr.named_child(1).unwrap().text(source), "name");
}

#[test]
fn test_dangling_equals_stays_a_sibling() {
    let source = "a(href=)";
    let result = parse(source);

    let tag = result.root.named_child(0).unwrap();
    let attrs = first(tag, NodeKind::Attributes);
    assert_eq!(attrs.named_child_count(), 1);
    assert_eq!(named_kinds(attrs.named_child(0).unwrap()), vec!["attribute_name"]);

    // the `=` survives as an unnamed token between the entry and `)`
    let texts: Vec<_> = attrs
        .children
        .iter()
        .filter(|c| !c.named)
        .map(|c| c.text(source))
        .collect();
    assert_eq!(texts, vec!["(", "=", ")"]);
}

#[test]
fn test_template_literal_value_spans_whole_literal() {
    let source = "input([placeholder]=`hello world`)";
    let result = parse(source);
    assert!(result.is_clean());

    let tag = result.root.named_child(0).unwrap();
    let attrs = first(tag, NodeKind::Attributes);
    let attr = attrs.named_child(0).unwrap();
    assert_eq!(attr.named_child(0).unwrap().text(source), "[placeholder]");
    assert_eq!(attr.named_child(1).unwrap().text(source), "`hello world`");
}

#[test]
fn test_conditional_with_else_branch() {
    let source = "if loggedIn\n  p yes\nelse\n  p no\n";
    let result = parse(source);
    assert!(result.is_clean());

    let cond = result.root.named_child(0).unwrap();
    assert_eq!(cond.kind, NodeKind::Conditional);
    assert_eq!(named_kinds(cond), vec!["keyword", "javascript", "children"]);
    assert_eq!(first(cond, NodeKind::Javascript).text(source), "loggedIn");

    let alt = result.root.named_child(1).unwrap();
    assert_eq!(alt.kind, NodeKind::Conditional);
    assert_eq!(named_kinds(alt), vec!["keyword", "children"]);
}

#[test]
fn test_else_if_keyword_spans_both_words() {
    let source = "else if x > 1\n  p big\n";
    let result = parse(source);

    let cond = result.root.named_child(0).unwrap();
    assert_eq!(cond.kind, NodeKind::Conditional);
    assert_eq!(first(cond, NodeKind::Keyword).text(source), "else if");
    assert_eq!(first(cond, NodeKind::Javascript).text(source), "x > 1");
}

#[test]
fn test_each_splits_variable_and_iterator() {
    let source = "each item, i in items\n  li= item\n";
    let result = parse(source);
    assert!(result.is_clean());

    let each = result.root.named_child(0).unwrap();
    assert_eq!(each.kind, NodeKind::Each);
    assert_eq!(
        named_kinds(each),
        vec!["keyword", "iteration_variable", "iteration_iterator", "children"]
    );

    let vars = first(each, NodeKind::IterationVariable);
    let names: Vec<_> = vars.named_children().map(|c| c.text(source)).collect();
    assert_eq!(names, vec!["item", "i"]);

    let iter = first(each, NodeKind::IterationIterator);
    assert_eq!(iter.named_child(0).unwrap().text(source), "items");
}

#[test]
fn test_string_interpolation_inside_content() {
    let source = "p Hello #{name}!";
    let result = parse(source);
    assert!(result.is_clean());

    let tag = result.root.named_child(0).unwrap();
    let content = first(tag, NodeKind::Content);
    assert_eq!(content.text(source), "Hello #{name}!");

    let interp = content.named_child(0).unwrap();
    assert_eq!(interp.kind, NodeKind::EscapedStringInterpolation);
    assert_eq!(named_kinds(interp), vec!["keyword", "javascript"]);
    assert_eq!(interp.named_child(1).unwrap().text(source), "name");
}

#[test]
fn test_tag_interpolation_wraps_inline_tag() {
    let source = "p see #[em this] here";
    let result = parse(source);
    assert!(result.is_clean());

    let tag = result.root.named_child(0).unwrap();
    let content = first(tag, NodeKind::Content);
    let interp = content.named_child(0).unwrap();
    assert_eq!(interp.kind, NodeKind::TagInterpolation);

    let wrapper = interp.named_child(1).unwrap();
    assert_eq!(wrapper.kind, NodeKind::Children);
    let inner = wrapper.named_child(0).unwrap();
    assert_eq!(inner.kind, NodeKind::Tag);
    assert_eq!(first(inner, NodeKind::TagName).text(source), "em");
    assert_eq!(first(inner, NodeKind::Content).text(source), "this");
}

#[test]
fn test_block_expansion() {
    let source = "li: a(href='/') Home";
    let result = parse(source);
    assert!(result.is_clean());

    let li = result.root.named_child(0).unwrap();
    assert_eq!(first(li, NodeKind::TagName).text(source), "li");
    let body = first(li, NodeKind::Children);
    let a = body.named_child(0).unwrap();
    assert_eq!(first(a, NodeKind::TagName).text(source), "a");
    assert_eq!(first(a, NodeKind::Content).text(source), "Home");
}

#[test]
fn test_buffered_code_suffix() {
    let source = "p= greeting";
    let result = parse(source);

    let tag = result.root.named_child(0).unwrap();
    let code = first(tag, NodeKind::BufferedCode);
    assert_eq!(first(code, NodeKind::Javascript).text(source), "greeting");
}

#[test]
fn test_pipe_line() {
    let source = "| some text";
    let result = parse(source);

    let pipe = result.root.named_child(0).unwrap();
    assert_eq!(pipe.kind, NodeKind::Pipe);
    assert_eq!(first(pipe, NodeKind::Content).text(source), "some text");
}

#[test]
fn test_mixin_definition_with_params() {
    let source = "mixin card(title, body)\n  div\n";
    let result = parse(source);
    assert!(result.is_clean());

    let mixin = result.root.named_child(0).unwrap();
    assert_eq!(mixin.kind, NodeKind::MixinDefinition);
    assert_eq!(first(mixin, NodeKind::MixinName).text(source), "card");

    let params = first(mixin, NodeKind::MixinAttributes);
    let names: Vec<_> = params.named_children().map(|c| c.text(source)).collect();
    assert_eq!(names, vec!["title", "body"]);
    assert!(mixin.named_children().any(|c| c.kind == NodeKind::Children));
}

#[test]
fn test_script_block_collects_raw_body() {
    let source = "script.\n  console.log(1)\n  doWork()\n";
    let result = parse(source);

    let script = result.root.named_child(0).unwrap();
    assert_eq!(script.kind, NodeKind::ScriptBlock);
    let js = script.named_child(0).unwrap();
    assert_eq!(js.kind, NodeKind::Javascript);
    assert_eq!(js.text(source), "console.log(1)\n  doWork()");
}

#[test]
fn test_comment_swallows_continuation_lines() {
    let source = "// hidden\n  more\np";
    let result = parse(source);

    assert_eq!(result.root.named_child_count(), 2);
    assert_eq!(result.root.named_child(0).unwrap().kind, NodeKind::Comment);
    assert_eq!(result.root.named_child(1).unwrap().kind, NodeKind::Tag);
}

#[test]
fn test_block_after_extends_is_a_use() {
    let source = "extends layout\nblock content\n  p hi\n";
    let result = parse(source);

    let extends = result.root.named_child(0).unwrap();
    assert_eq!(extends.kind, NodeKind::Extends);
    assert_eq!(first(extends, NodeKind::Filename).text(source), "layout");

    let block = result.root.named_child(1).unwrap();
    assert_eq!(block.kind, NodeKind::BlockUse);
    assert_eq!(first(block, NodeKind::BlockName).text(source), "content");
}

#[test]
fn test_standalone_block_is_a_definition() {
    let source = "block content\n  p hi\n";
    let result = parse(source);
    let block = result.root.named_child(0).unwrap();
    assert_eq!(block.kind, NodeKind::BlockDefinition);
}

#[test]
fn test_unclassifiable_line_recovers_with_error_node() {
    let source = "<div>\np ok\n";
    let result = parse(source);
    assert!(!result.is_clean());

    let error = result.root.named_child(0).unwrap();
    assert_eq!(error.kind, NodeKind::Error);
    let tag = result.root.named_child(1).unwrap();
    assert_eq!(tag.kind, NodeKind::Tag);
}

#[test]
fn test_unclosed_attribute_list_is_reported() {
    let source = "div(title='x'";
    let result = parse(source);
    assert!(!result.is_clean());

    // the tree still carries what was parsed
    let tag = result.root.named_child(0).unwrap();
    let attrs = first(tag, NodeKind::Attributes);
    assert_eq!(attrs.named_child_count(), 1);
}

#[test]
fn test_spans_are_byte_accurate() {
    let source = "input(type='text')";
    let result = parse(source);

    let tag = result.root.named_child(0).unwrap();
    let name = first(tag, NodeKind::TagName);
    assert_eq!(u32::from(name.span.start), 0);
    assert_eq!(u32::from(name.span.end), 5);

    let attrs = first(tag, NodeKind::Attributes);
    assert_eq!(u32::from(attrs.span.start), 5);
    assert_eq!(u32::from(attrs.span.end), 18);
}

#[test]
fn test_blank_lines_do_not_break_nesting() {
    let source = "div\n\n  p one\n\n  p two\nspan\n";
    let result = parse(source);
    assert!(result.is_clean());

    let div = result.root.named_child(0).unwrap();
    let body = first(div, NodeKind::Children);
    assert_eq!(body.named_child_count(), 2);
    assert_eq!(result.root.named_child(1).unwrap().kind, NodeKind::Tag);
}
