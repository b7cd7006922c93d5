//! The projection pass from a parsed Pug tree to HTML.
//!
//! Each node kind maps to one projection rule. Constructs with no literal
//! HTML counterpart are rewritten into forms a markup analyzer understands:
//! control-flow expressions and interpolations become `<script>` blocks,
//! shorthand classes and ids fold into `class`/`id` attributes, mixin
//! definitions become `<ng-template>` wrappers. Every emitted fragment is
//! recorded in a [`SourceMap`] so analyzer results can be carried back to
//! the template.

use crate::diagnostic::TransformDiagnostic;
use pug_parser::{parse, NodeKind, ParseError, SyntaxNode};
use source_map::{RangeKind, SourceMap, SourceMapBuilder, Span};

/// Elements that self-close and never carry a matching closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| name.eq_ignore_ascii_case(v))
}

/// The result of projecting one template.
///
/// Immutable once produced; the source map answers offset queries in both
/// directions arbitrarily many times.
#[derive(Debug)]
pub struct TransformResult {
    /// The projected HTML, always newline-terminated.
    pub html: String,
    /// The offset mapping between the template and the HTML.
    pub source_map: SourceMap,
    /// Non-fatal problems found during projection.
    pub diagnostics: Vec<TransformDiagnostic>,
    /// Errors the parser recovered from, in source order.
    pub parse_errors: Vec<ParseError>,
}

/// Parses `source` and projects it to HTML.
///
/// Never fails: malformed templates still produce a result, with parse
/// errors and diagnostics describing what was skipped.
pub fn transform(source: &str) -> TransformResult {
    let parsed = parse(source);
    let mut result = transform_tree(&parsed.root, source);
    result.parse_errors = parsed.errors;
    result
}

/// Projects an already parsed tree. `source` must be the text the tree was
/// parsed from.
pub fn transform_tree(root: &SyntaxNode, source: &str) -> TransformResult {
    let mut projector = Projector {
        source,
        builder: SourceMapBuilder::new(),
        diagnostics: Vec::new(),
    };
    projector.visit(root);
    let (html, source_map) = projector.builder.finish(source);
    TransformResult {
        html,
        source_map,
        diagnostics: projector.diagnostics,
        parse_errors: Vec::new(),
    }
}

struct Projector<'src> {
    source: &'src str,
    builder: SourceMapBuilder,
    diagnostics: Vec<TransformDiagnostic>,
}

impl<'src> Projector<'src> {
    fn text(&self, node: &SyntaxNode) -> &'src str {
        node.text(self.source)
    }

    fn visit(&mut self, node: &SyntaxNode) {
        if !node.named {
            return;
        }
        match node.kind {
            NodeKind::SourceFile
            | NodeKind::Children
            | NodeKind::BlockDefinition
            | NodeKind::BlockUse
            | NodeKind::Each
            | NodeKind::Extends
            | NodeKind::Include => {
                for child in node.named_children() {
                    self.visit(child);
                }
            }
            NodeKind::MixinDefinition => self.visit_mixin_definition(node),
            NodeKind::IterationVariable
            | NodeKind::IterationIterator
            | NodeKind::BufferedCode
            | NodeKind::UnescapedBufferedCode
            | NodeKind::Case
            | NodeKind::When => self.wrap_scripting_children(node, true),
            NodeKind::ScriptBlock | NodeKind::UnbufferedCode => {
                self.wrap_scripting_children(node, false)
            }
            NodeKind::EscapedStringInterpolation => {
                // fixed shape: `#{` keyword, expression, `}`
                match node.named_child(1) {
                    Some(expression) => self.wrap_script(expression, true),
                    None => self.diagnostics.push(TransformDiagnostic::MalformedConstruct {
                        construct: "string interpolation",
                        span: node.span,
                    }),
                }
            }
            NodeKind::TagInterpolation => {
                // fixed shape: `#[` keyword, wrapped tag, `]`
                match node.named_child(1).filter(|c| c.kind == NodeKind::Children) {
                    Some(wrapper) => {
                        for child in wrapper.named_children() {
                            self.visit(child);
                        }
                    }
                    None => self.diagnostics.push(TransformDiagnostic::MalformedConstruct {
                        construct: "tag interpolation",
                        span: node.span,
                    }),
                }
            }
            NodeKind::Pipe => {
                for child in node.named_children().skip(1) {
                    self.visit(child);
                }
            }
            NodeKind::Conditional => self.visit_conditional(node),
            NodeKind::Tag | NodeKind::Filter => self.visit_tag(node),
            NodeKind::TagName | NodeKind::FilterName => {
                let text = self.text(node);
                self.builder.push_mapped(text, RangeKind::TagName, node.span);
            }
            NodeKind::Attributes => self.visit_attributes(node),
            NodeKind::AttributeName => self.visit_attribute_name(node),
            NodeKind::Javascript => self.visit_javascript(node),
            NodeKind::QuotedAttributeValue => {
                let text = self.text(node);
                self.builder
                    .push_mapped(text, RangeKind::AttributeValue, node.span);
            }
            NodeKind::Content => {
                // interpolations first, so their records precede the text
                // that surrounds them in the table
                for child in node.named_children() {
                    self.visit(child);
                }
                let text = self.text(node);
                self.builder.push_mapped(text, RangeKind::Content, node.span);
            }
            NodeKind::Filename => {
                let text = self.text(node);
                self.builder.push_synth("<a href=\"");
                self.builder.push_mapped(text, RangeKind::Filename, node.span);
                self.builder.push_synth("\">");
            }
            NodeKind::Keyword
            | NodeKind::MixinAttributes
            | NodeKind::Comment
            | NodeKind::BlockName
            | NodeKind::MixinName
            | NodeKind::Attribute
            | NodeKind::Class
            | NodeKind::Id
            | NodeKind::Token => {}
            NodeKind::Error => {
                // best effort: malformed input never aborts the projection
                if let Some(first) = node.named_child(0) {
                    self.visit(first);
                }
            }
            NodeKind::MixinUse => {
                self.diagnostics.push(TransformDiagnostic::UnknownNodeKind {
                    kind: node.kind,
                    span: node.span,
                });
            }
        }
    }

    /// Emits a `<script>` wrapper around a scripting leaf, with `return`
    /// prefixed in expression form.
    fn wrap_script(&mut self, leaf: &SyntaxNode, expression: bool) {
        let open = if expression { "<script>return " } else { "<script>" };
        let text = self.text(leaf);
        self.builder.push_synth(open);
        self.builder.push_mapped(text, RangeKind::Javascript, leaf.span);
        self.builder.push_synth(";</script>");
    }

    /// Wraps scripting leaves among the named children, recursing into
    /// everything else.
    fn wrap_scripting_children(&mut self, node: &SyntaxNode, expression: bool) {
        for child in node.named_children() {
            if child.kind == NodeKind::Javascript {
                self.wrap_script(child, expression);
            } else {
                self.visit(child);
            }
        }
    }

    fn visit_conditional(&mut self, node: &SyntaxNode) {
        // keyword, then an optional condition, then an optional body
        let mut index = 1;
        if let Some(condition) = node
            .named_child(index)
            .filter(|c| c.kind == NodeKind::Javascript)
        {
            self.wrap_script(condition, true);
            index += 1;
        }
        if let Some(body) = node.named_child(index) {
            for child in body.named_children() {
                self.visit(child);
            }
        }
    }

    fn visit_mixin_definition(&mut self, node: &SyntaxNode) {
        // a definition without a body projects to nothing
        let Some(body) = node
            .named_children()
            .find(|c| c.kind == NodeKind::Children)
        else {
            return;
        };

        self.builder.push_synth("<ng-template ");
        if let Some(params) = node
            .named_children()
            .find(|c| c.kind == NodeKind::MixinAttributes)
        {
            // each parameter becomes a block-scoped `let-` binding
            for param in params.named_children() {
                let text = self.text(param);
                self.builder.push_synth("let-");
                self.builder.push_mapped(text, RangeKind::AttributeName, param.span);
                self.builder.push_synth(" ");
            }
        }
        self.builder.push_synth(">");
        self.visit(body);
        self.builder.push_synth("</ng-template>");
    }

    fn visit_tag(&mut self, node: &SyntaxNode) {
        let named: Vec<&SyntaxNode> = node.named_children().collect();

        let mut name = "div";
        match named.first().copied().filter(|first| {
            first.kind == NodeKind::TagName || first.kind == NodeKind::FilterName
        }) {
            Some(first) => {
                // zero-width anchor right where the tag opens
                self.builder
                    .push_anchor(RangeKind::Empty, Span::empty(first.span.start));
                self.builder.push_synth("<");
                self.visit(first);
                name = self.text(first);
            }
            None => {
                // implicit element
                self.builder.push_synth("<");
                self.builder.push_synth("div");
            }
        }

        let mut classes: Vec<&SyntaxNode> = Vec::new();
        let mut ids: Vec<&SyntaxNode> = Vec::new();
        let mut closed = false;

        for &child in &named {
            match child.kind {
                NodeKind::TagName | NodeKind::FilterName => {}
                NodeKind::Class => classes.push(child),
                NodeKind::Id => ids.push(child),
                NodeKind::Attributes => {
                    self.flush_shorthand(&mut classes, &mut ids);
                    let anchor = self.builder.last_pug_end(0);
                    self.builder.push_mapped(" ", RangeKind::Space, anchor);
                    self.visit_attributes(child);
                    // anchor the caret landing spot to the closing delimiter
                    if let Some(last) = child.children.last() {
                        self.builder.push_anchor(RangeKind::Space, last.span);
                    }
                }
                _ => {
                    // body content: close the open tag once, then recurse
                    if !closed {
                        self.flush_shorthand(&mut classes, &mut ids);
                        self.close_open_tag(name);
                        closed = true;
                    }
                    self.visit(child);
                }
            }
        }

        if !closed {
            self.flush_shorthand(&mut classes, &mut ids);
            self.close_open_tag(name);
        }

        if !is_void_element(name) {
            // synthesized closing tag, never source-mapped
            self.builder.push_synth("</");
            self.builder.push_synth(name);
            self.builder.push_synth(">");
        }
    }

    /// Emits `>` (or `/>` for void elements) plus caret anchors just past
    /// the close.
    fn close_open_tag(&mut self, name: &str) {
        let mut delta = 0;
        if is_void_element(name) {
            self.builder.push_synth("/");
            let anchor = self.builder.last_pug_end(-1);
            self.builder.push_anchor(RangeKind::Empty, anchor);
            delta = -1;
        }
        self.builder.push_synth(">");
        let anchor = self.builder.last_pug_end(delta);
        self.builder.push_anchor(RangeKind::Empty, anchor);
    }

    /// Folds collected `.class`/`#id` shorthand into synthesized `class` and
    /// `id` attributes, each token mapped with its sigil stripped.
    fn flush_shorthand(&mut self, classes: &mut Vec<&SyntaxNode>, ids: &mut Vec<&SyntaxNode>) {
        if !classes.is_empty() {
            self.builder.push_synth(" class=\"");
            self.emit_shorthand_tokens(classes);
            self.builder.push_synth("\"");
            classes.clear();
        }
        if !ids.is_empty() {
            self.builder.push_synth(" id=\"");
            self.emit_shorthand_tokens(ids);
            self.builder.push_synth("\"");
            ids.clear();
        }
    }

    fn emit_shorthand_tokens(&mut self, tokens: &[&SyntaxNode]) {
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                self.builder.push_synth(" ");
            }
            let text = &self.text(token)[1..];
            let span = Span::new(u32::from(token.span.start) + 1, u32::from(token.span.end));
            self.builder.push_mapped(text, RangeKind::IdClass, span);
        }
    }

    fn visit_attribute_name(&mut self, node: &SyntaxNode) {
        let text = self.text(node);
        self.builder.push_mapped(text, RangeKind::AttributeName, node.span);
    }

    fn visit_attributes(&mut self, node: &SyntaxNode) {
        for (i, attribute) in node.children.iter().enumerate() {
            if !attribute.named || attribute.kind != NodeKind::Attribute {
                continue;
            }
            let mut entries = attribute.named_children();
            let Some(name) = entries.next() else { continue };
            self.visit_attribute_name(name);

            if let Some(value) = entries.next() {
                // the `=` maps to the point right after the name so a caret
                // between name and value lands somewhere sensible
                let anchor = self.builder.last_pug_end(1);
                self.builder.push_mapped("=", RangeKind::Equals, anchor);
                self.visit(value);
            } else if self.dangling_equals_follows(node, i) {
                // `attr=` mid-typing: keep the `=` for caret continuity
                let anchor = self.builder.last_pug_end(1);
                self.builder.push_mapped("=", RangeKind::Equals, anchor);
            }

            self.emit_entry_gap(node, i);
        }
    }

    fn dangling_equals_follows(&self, attributes: &SyntaxNode, index: usize) -> bool {
        attributes
            .children
            .get(index + 1)
            .is_some_and(|sibling| !sibling.named && self.text(sibling) == "=")
    }

    /// Emits the separator record after one attribute entry: a mapped space
    /// covering the gap up to the next entry, or a zero-width anchor at the
    /// closing delimiter when this entry is the last.
    fn emit_entry_gap(&mut self, attributes: &SyntaxNode, index: usize) {
        let gap_start = u32::from(self.builder.last_pug_end(1).start);
        for sibling in attributes.children.iter().skip(index + 1) {
            let start = u32::from(sibling.span.start);
            if sibling.named && sibling.kind == NodeKind::Attribute {
                let end = start.saturating_sub(1);
                self.builder.push_mapped(
                    " ",
                    RangeKind::Space,
                    Span::new(gap_start.min(end), end),
                );
                return;
            }
            if !sibling.named && self.text(sibling) == ")" {
                self.builder
                    .push_anchor(RangeKind::Space, Span::empty(start));
                return;
            }
        }
    }

    fn visit_javascript(&mut self, node: &SyntaxNode) {
        let text = self.text(node);

        // an attribute value is preceded by exactly a name record and an
        // equals record
        let records = self.builder.recent_mappings();
        let is_attribute_value = records.len() >= 2
            && records[records.len() - 1].kind == Some(RangeKind::Equals)
            && records[records.len() - 2].kind == Some(RangeKind::AttributeName);

        if is_attribute_value && text.contains('`') {
            // template literal: strip the delimiters and hand the analyzer an
            // unsafe-cast marker, keeping the original span for the inner text
            let stripped = text.replace('`', "");
            self.builder.push_synth("\"$any('");
            self.builder
                .push_mapped(&stripped, RangeKind::Javascript, node.span);
            self.builder.push_synth("')\"");
            return;
        }

        let quote = if text.contains('\'') { '"' } else { '\'' };
        self.builder
            .push_surrounded(text, RangeKind::Javascript, node.span, quote);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_void_element_detection() {
        assert!(is_void_element("img"));
        assert!(is_void_element("BR"));
        assert!(!is_void_element("div"));
        assert!(!is_void_element("image"));
    }

    #[test]
    fn test_implicit_div_from_shorthand_only() {
        let result = transform("#app\n");
        assert_eq!(result.html, "<div id=\"app\"></div>\n");
    }

    #[test]
    fn test_mixin_without_body_emits_nothing() {
        let result = transform("mixin empty(a, b)\n");
        assert_eq!(result.html, "\n");
    }

    #[test]
    fn test_mixin_use_is_reported_not_fatal() {
        let result = transform("+card\n");
        assert_eq!(result.html, "\n");
        assert_eq!(result.diagnostics.len(), 1);
        assert!(matches!(
            result.diagnostics[0],
            TransformDiagnostic::UnknownNodeKind { .. }
        ));
    }
}
