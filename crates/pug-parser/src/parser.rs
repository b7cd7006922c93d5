//! Line and indentation oriented recursive parser for Pug templates.
//!
//! Pug is line structured: every construct starts a line and owns the more
//! deeply indented lines below it. The parser therefore splits the source
//! into lines once, then classifies each line by its first token and
//! recurses for indented bodies. It never fails: anything unclassifiable
//! becomes an `Error` node plus a recorded [`ParseError`].

use crate::error::{ParseError, ParseErrorKind};
use crate::node::{NodeKind, SyntaxNode};
use crate::ParseResult;
use source_map::{LineIndex, Span};
use text_size::TextSize;

/// One physical line of the source.
#[derive(Debug, Clone, Copy)]
struct Line {
    /// Number of leading whitespace bytes.
    indent: usize,
    /// Offset of the first non-whitespace byte.
    text_start: usize,
    /// Offset one past the last byte, excluding the line terminator.
    end: usize,
    /// True if the line holds only whitespace.
    blank: bool,
}

pub(crate) struct Parser<'src> {
    source: &'src str,
    lines: Vec<Line>,
    /// Current line.
    pos: usize,
    errors: Vec<ParseError>,
    index: LineIndex,
    /// Set once an `extends` line is seen; later `block` lines are uses.
    saw_extends: bool,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

impl<'src> Parser<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        let mut lines = Vec::new();
        let bytes = source.as_bytes();
        let mut start = 0;
        let mut push_line = |start: usize, mut end: usize, lines: &mut Vec<Line>| {
            if end > start && bytes[end - 1] == b'\r' {
                end -= 1;
            }
            let mut indent = 0;
            while start + indent < end && (bytes[start + indent] == b' ' || bytes[start + indent] == b'\t') {
                indent += 1;
            }
            let text_start = start + indent;
            lines.push(Line {
                indent,
                text_start,
                end,
                blank: text_start == end,
            });
        };
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                push_line(start, i, &mut lines);
                start = i + 1;
            }
        }
        if start < source.len() {
            push_line(start, source.len(), &mut lines);
        }

        Self {
            source,
            lines,
            pos: 0,
            errors: Vec::new(),
            index: LineIndex::new(source),
            saw_extends: false,
        }
    }

    pub(crate) fn parse(mut self) -> ParseResult {
        let mut children = Vec::new();
        while self.pos < self.lines.len() {
            if self.lines[self.pos].blank {
                self.pos += 1;
                continue;
            }
            children.push(self.parse_line());
        }
        let root = self.node(NodeKind::SourceFile, true, 0, self.source.len(), children);
        ParseResult {
            root,
            errors: self.errors,
        }
    }

    // === Node construction ===

    fn node(
        &self,
        kind: NodeKind,
        named: bool,
        start: usize,
        end: usize,
        children: Vec<SyntaxNode>,
    ) -> SyntaxNode {
        let span = Span::new(start as u32, end as u32);
        SyntaxNode {
            kind,
            named,
            span,
            start_position: self.index.line_col(TextSize::from(start as u32)),
            end_position: self.index.line_col(TextSize::from(end as u32)),
            children,
        }
    }

    fn leaf(&self, kind: NodeKind, start: usize, end: usize) -> SyntaxNode {
        self.node(kind, true, start, end, Vec::new())
    }

    fn token(&self, start: usize, end: usize) -> SyntaxNode {
        self.node(NodeKind::Token, false, start, end, Vec::new())
    }

    fn error(&mut self, kind: ParseErrorKind, start: usize, end: usize) {
        self.errors
            .push(ParseError::new(kind, Span::new(start as u32, end as u32)));
    }

    // === Scanning helpers ===

    fn skip_spaces(&self, mut i: usize, end: usize) -> usize {
        let bytes = self.source.as_bytes();
        while i < end && (bytes[i] == b' ' || bytes[i] == b'\t') {
            i += 1;
        }
        i
    }

    fn rstrip(&self, start: usize, mut end: usize) -> usize {
        let bytes = self.source.as_bytes();
        while end > start && (bytes[end - 1] == b' ' || bytes[end - 1] == b'\t') {
            end -= 1;
        }
        end
    }

    /// Scans a quoted string starting at `i`; returns the offset one past
    /// the closing quote, or `end` if the string never closes.
    fn scan_string(&mut self, i: usize, end: usize) -> usize {
        let bytes = self.source.as_bytes();
        let quote = bytes[i];
        let mut j = i + 1;
        while j < end {
            match bytes[j] {
                b'\\' => j += 2,
                b if b == quote => return j + 1,
                _ => j += 1,
            }
        }
        self.error(ParseErrorKind::UnterminatedString, i, end);
        end
    }

    /// Scans a bracketed token starting at `i` (`[`/`(`); returns the offset
    /// one past the matching close bracket.
    fn scan_balanced(&mut self, i: usize, end: usize, open: u8, close: u8) -> usize {
        let bytes = self.source.as_bytes();
        let mut depth = 0usize;
        let mut j = i;
        while j < end {
            let b = bytes[j];
            if b == b'\'' || b == b'"' || b == b'`' {
                j = self.scan_string(j, end);
                continue;
            }
            if b == open {
                depth += 1;
            } else if b == close {
                depth -= 1;
                if depth == 0 {
                    return j + 1;
                }
            }
            j += 1;
        }
        self.error(ParseErrorKind::UnterminatedString, i, end);
        end
    }

    /// Scans a JavaScript expression: stops at a top-level `,`, `)` or
    /// whitespace, tracking strings, template literals and brackets.
    fn scan_expression(&mut self, start: usize, end: usize) -> usize {
        let bytes = self.source.as_bytes();
        let mut depth = 0usize;
        let mut i = start;
        while i < end {
            match bytes[i] {
                b'\'' | b'"' | b'`' => {
                    i = self.scan_string(i, end);
                    continue;
                }
                b'(' | b'[' | b'{' => depth += 1,
                b')' => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                b']' | b'}' => depth = depth.saturating_sub(1),
                b',' | b' ' | b'\t' if depth == 0 => break,
                _ => {}
            }
            i += 1;
        }
        i
    }

    // === Block structure ===

    /// Consumes all following lines more deeply indented than
    /// `parent_indent` and parses them as a `children` node.
    fn parse_children_block(&mut self, parent_indent: usize) -> Option<SyntaxNode> {
        let mut nodes = Vec::new();
        loop {
            let Some(line) = self.lines.get(self.pos).copied() else {
                break;
            };
            if line.blank {
                self.pos += 1;
                continue;
            }
            if line.indent <= parent_indent {
                break;
            }
            nodes.push(self.parse_line());
        }
        let first = nodes.first()?.span.start;
        let last = nodes.last()?.span.end;
        let (start, end) = (u32::from(first) as usize, u32::from(last) as usize);
        Some(self.node(NodeKind::Children, true, start, end, nodes))
    }

    /// Consumes all following lines more deeply indented than
    /// `parent_indent` as raw text; returns its byte range.
    fn consume_raw_block(&mut self, parent_indent: usize) -> Option<(usize, usize)> {
        let mut first: Option<usize> = None;
        let mut last: Option<usize> = None;
        while let Some(line) = self.lines.get(self.pos).copied() {
            if line.blank {
                self.pos += 1;
                continue;
            }
            if line.indent <= parent_indent {
                break;
            }
            first.get_or_insert(line.text_start);
            last = Some(line.end);
            self.pos += 1;
        }
        Some((first?, last?))
    }

    // === Line dispatch ===

    /// Parses the current line (and any body it owns) into one node.
    /// Always consumes at least one line.
    fn parse_line(&mut self) -> SyntaxNode {
        let line = self.lines[self.pos];
        self.pos += 1;
        let src = self.source;
        let at = line.text_start;
        let end = line.end;
        let indent = line.indent;
        let text = &src[at..end];

        if text.starts_with("//") {
            let block_end = self
                .consume_raw_block(indent)
                .map(|(_, e)| e)
                .unwrap_or(end);
            return self.node(NodeKind::Comment, true, at, block_end, Vec::new());
        }

        if text.starts_with('|') {
            return self.parse_pipe(at, end);
        }

        if text.starts_with("!=") {
            return self.code_line(NodeKind::UnescapedBufferedCode, at, 2, end, indent);
        }
        if text.starts_with('=') {
            return self.code_line(NodeKind::BufferedCode, at, 1, end, indent);
        }
        if text.starts_with('-') {
            return self.code_line(NodeKind::UnbufferedCode, at, 1, end, indent);
        }

        if text.starts_with('+') {
            return self.parse_mixin_use(at, end, indent);
        }

        if text.starts_with(':') {
            return self.parse_filter(at, end, indent);
        }

        if text.trim_end() == "script." {
            let js = self
                .consume_raw_block(indent)
                .map(|(s, e)| self.leaf(NodeKind::Javascript, s, e));
            let block_end = js.as_ref().map(|n| u32::from(n.span.end) as usize).unwrap_or(end);
            let children = js.into_iter().collect();
            return self.node(NodeKind::ScriptBlock, true, at, block_end, children);
        }

        let word_end = text
            .find(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-')
            .unwrap_or(text.len());
        match &text[..word_end] {
            "if" | "unless" => return self.parse_conditional(at, at + word_end, end, indent),
            "else" => return self.parse_else(at, end, indent),
            "each" | "for" => return self.parse_each(at, at + word_end, end, indent),
            "case" => {
                return self.keyword_expression_line(NodeKind::Case, at, at + word_end, end, indent)
            }
            "when" => {
                return self.keyword_expression_line(NodeKind::When, at, at + word_end, end, indent)
            }
            "default" => {
                let kw = self.leaf(NodeKind::Keyword, at, at + word_end);
                let mut children = vec![kw];
                let body = self.parse_children_block(indent);
                let span_end = Self::extend_span(end, &body);
                children.extend(body);
                return self.node(NodeKind::When, true, at, span_end, children);
            }
            "mixin" => return self.parse_mixin_definition(at, at + word_end, end, indent),
            "block" | "append" | "prepend" => return self.parse_block_line(at, end, indent),
            "extends" => {
                self.saw_extends = true;
                return self.path_line(NodeKind::Extends, at, at + word_end, end);
            }
            "include" => return self.path_line(NodeKind::Include, at, at + word_end, end),
            _ => {}
        }

        self.parse_tag_line(at, end, indent)
    }

    fn extend_span(line_end: usize, body: &Option<SyntaxNode>) -> usize {
        body.as_ref()
            .map(|b| u32::from(b.span.end) as usize)
            .unwrap_or(line_end)
            .max(line_end)
    }

    // === Simple line constructs ===

    fn parse_pipe(&mut self, at: usize, end: usize) -> SyntaxNode {
        let kw = self.leaf(NodeKind::Keyword, at, at + 1);
        let mut children = vec![kw];
        let mut content_start = at + 1;
        if content_start < end && self.source.as_bytes()[content_start] == b' ' {
            content_start += 1;
        }
        if content_start < end {
            children.push(self.parse_content(content_start, end));
        }
        self.node(NodeKind::Pipe, true, at, end, children)
    }

    fn code_line(
        &mut self,
        kind: NodeKind,
        at: usize,
        keyword_len: usize,
        end: usize,
        indent: usize,
    ) -> SyntaxNode {
        let kw = self.leaf(NodeKind::Keyword, at, at + keyword_len);
        let mut children = vec![kw];
        let expr_start = self.skip_spaces(at + keyword_len, end);
        let expr_end = self.rstrip(expr_start, end);
        let mut span_end = end;
        if expr_start < expr_end {
            children.push(self.leaf(NodeKind::Javascript, expr_start, expr_end));
        } else if let Some((block_start, block_end)) = self.consume_raw_block(indent) {
            // bare `-` introducing an indented statement block
            children.push(self.leaf(NodeKind::Javascript, block_start, block_end));
            span_end = block_end;
        }
        self.node(kind, true, at, span_end, children)
    }

    fn path_line(&mut self, kind: NodeKind, at: usize, word_end: usize, end: usize) -> SyntaxNode {
        let kw = self.leaf(NodeKind::Keyword, at, word_end);
        let mut children = vec![kw];
        let path_start = self.skip_spaces(word_end, end);
        let path_end = self.rstrip(path_start, end);
        if path_start < path_end {
            children.push(self.leaf(NodeKind::Filename, path_start, path_end));
        }
        self.node(kind, true, at, end, children)
    }

    fn keyword_expression_line(
        &mut self,
        kind: NodeKind,
        at: usize,
        word_end: usize,
        end: usize,
        indent: usize,
    ) -> SyntaxNode {
        let kw = self.leaf(NodeKind::Keyword, at, word_end);
        let mut children = vec![kw];
        let expr_start = self.skip_spaces(word_end, end);
        let expr_end = self.rstrip(expr_start, end);
        if expr_start < expr_end {
            children.push(self.leaf(NodeKind::Javascript, expr_start, expr_end));
        } else {
            self.error(
                ParseErrorKind::MissingExpression {
                    construct: self.source[at..word_end].to_string(),
                },
                at,
                end,
            );
        }
        let body = self.parse_children_block(indent);
        let span_end = Self::extend_span(end, &body);
        children.extend(body);
        self.node(kind, true, at, span_end, children)
    }

    // === Control flow ===

    fn parse_conditional(
        &mut self,
        at: usize,
        word_end: usize,
        end: usize,
        indent: usize,
    ) -> SyntaxNode {
        self.keyword_expression_line(NodeKind::Conditional, at, word_end, end, indent)
    }

    fn parse_else(&mut self, at: usize, end: usize, indent: usize) -> SyntaxNode {
        let after_else = self.skip_spaces(at + 4, end);
        let rest = &self.source[after_else..end];
        if rest == "if" || rest.starts_with("if ") || rest.starts_with("if(") {
            // `else if expr` — the keyword spans both words
            return self.keyword_expression_line(
                NodeKind::Conditional,
                at,
                after_else + 2,
                end,
                indent,
            );
        }
        let kw = self.leaf(NodeKind::Keyword, at, at + 4);
        let mut children = vec![kw];
        let body = self.parse_children_block(indent);
        let span_end = Self::extend_span(end, &body);
        children.extend(body);
        self.node(NodeKind::Conditional, true, at, span_end, children)
    }

    fn parse_each(&mut self, at: usize, word_end: usize, end: usize, indent: usize) -> SyntaxNode {
        let kw = self.leaf(NodeKind::Keyword, at, word_end);
        let mut children = vec![kw];

        let rest_start = self.skip_spaces(word_end, end);
        match self.source[rest_start..end].find(" in ") {
            Some(found) => {
                let in_start = rest_start + found + 1;
                let vars_end = self.rstrip(rest_start, rest_start + found);
                if rest_start < vars_end {
                    children.push(self.parse_iteration_variables(rest_start, vars_end));
                }
                children.push(self.token(in_start, in_start + 2));
                let iter_start = self.skip_spaces(in_start + 2, end);
                let iter_end = self.rstrip(iter_start, end);
                if iter_start < iter_end {
                    let js = self.leaf(NodeKind::Javascript, iter_start, iter_end);
                    children.push(self.node(
                        NodeKind::IterationIterator,
                        true,
                        iter_start,
                        iter_end,
                        vec![js],
                    ));
                }
            }
            None => {
                self.error(
                    ParseErrorKind::MissingExpression {
                        construct: self.source[at..word_end].to_string(),
                    },
                    at,
                    end,
                );
            }
        }

        let body = self.parse_children_block(indent);
        let span_end = Self::extend_span(end, &body);
        children.extend(body);
        self.node(NodeKind::Each, true, at, span_end, children)
    }

    /// `item` or `item, index` before the `in` of an `each` line.
    fn parse_iteration_variables(&mut self, start: usize, end: usize) -> SyntaxNode {
        let mut children = Vec::new();
        let mut seg_start = start;
        let bytes = self.source.as_bytes();
        let mut i = start;
        while i <= end {
            if i == end || bytes[i] == b',' {
                let s = self.skip_spaces(seg_start, i);
                let e = self.rstrip(s, i);
                if s < e {
                    children.push(self.leaf(NodeKind::Javascript, s, e));
                }
                if i < end {
                    children.push(self.token(i, i + 1));
                }
                seg_start = i + 1;
            }
            i += 1;
        }
        self.node(NodeKind::IterationVariable, true, start, end, children)
    }

    // === Mixins, blocks, filters ===

    fn parse_mixin_definition(
        &mut self,
        at: usize,
        word_end: usize,
        end: usize,
        indent: usize,
    ) -> SyntaxNode {
        let kw = self.leaf(NodeKind::Keyword, at, word_end);
        let mut children = vec![kw];
        let bytes = self.source.as_bytes();

        let mut i = self.skip_spaces(word_end, end);
        if i < end && is_ident_start(bytes[i]) {
            let name_start = i;
            while i < end && is_ident_char(bytes[i]) {
                i += 1;
            }
            children.push(self.leaf(NodeKind::MixinName, name_start, i));
        }
        if i < end && bytes[i] == b'(' {
            children.push(self.parse_mixin_params(&mut i, end));
        }

        let body = self.parse_children_block(indent);
        let span_end = Self::extend_span(end, &body);
        children.extend(body);
        self.node(NodeKind::MixinDefinition, true, at, span_end, children)
    }

    fn parse_mixin_params(&mut self, i: &mut usize, end: usize) -> SyntaxNode {
        let open = *i;
        let mut children = vec![self.token(open, open + 1)];
        let bytes = self.source.as_bytes();
        *i += 1;
        loop {
            *i = self.skip_spaces(*i, end);
            if *i >= end {
                self.error(ParseErrorKind::UnclosedAttributeList, open, end);
                break;
            }
            match bytes[*i] {
                b')' => {
                    children.push(self.token(*i, *i + 1));
                    *i += 1;
                    break;
                }
                b',' => {
                    children.push(self.token(*i, *i + 1));
                    *i += 1;
                }
                b if is_ident_start(b) => {
                    let start = *i;
                    while *i < end && is_ident_char(bytes[*i]) {
                        *i += 1;
                    }
                    children.push(self.leaf(NodeKind::AttributeName, start, *i));
                }
                found => {
                    self.error(ParseErrorKind::UnexpectedChar { found: found as char }, *i, *i + 1);
                    children.push(self.token(*i, *i + 1));
                    *i += 1;
                }
            }
        }
        self.node(NodeKind::MixinAttributes, true, open, *i, children)
    }

    fn parse_mixin_use(&mut self, at: usize, end: usize, indent: usize) -> SyntaxNode {
        let mut children = vec![self.token(at, at + 1)];
        let bytes = self.source.as_bytes();
        let mut i = at + 1;
        if i < end && is_ident_start(bytes[i]) {
            let name_start = i;
            while i < end && is_ident_char(bytes[i]) {
                i += 1;
            }
            children.push(self.leaf(NodeKind::MixinName, name_start, i));
        }
        let body = self.parse_children_block(indent);
        let span_end = Self::extend_span(end, &body);
        children.extend(body);
        self.node(NodeKind::MixinUse, true, at, span_end, children)
    }

    fn parse_block_line(&mut self, at: usize, end: usize, indent: usize) -> SyntaxNode {
        let bytes = self.source.as_bytes();
        let mut i = at;
        let mut children = Vec::new();
        let mut modifier = false;
        // `block`, `block append name`, bare `append name`
        loop {
            let word_start = i;
            while i < end && is_ident_char(bytes[i]) {
                i += 1;
            }
            let word = &self.source[word_start..i];
            if word == "block" || word == "append" || word == "prepend" {
                modifier |= word != "block";
                children.push(self.leaf(NodeKind::Keyword, word_start, i));
                i = self.skip_spaces(i, end);
                if i < end && is_ident_start(bytes[i]) {
                    continue;
                }
            } else if !word.is_empty() {
                children.push(self.leaf(NodeKind::BlockName, word_start, i));
            }
            break;
        }
        let kind = if self.saw_extends || modifier {
            NodeKind::BlockUse
        } else {
            NodeKind::BlockDefinition
        };
        let body = self.parse_children_block(indent);
        let span_end = Self::extend_span(end, &body);
        children.extend(body);
        self.node(kind, true, at, span_end, children)
    }

    fn parse_filter(&mut self, at: usize, end: usize, indent: usize) -> SyntaxNode {
        let bytes = self.source.as_bytes();
        let mut i = at + 1;
        let name_start = i;
        while i < end && is_ident_char(bytes[i]) {
            i += 1;
        }
        let mut children = vec![self.leaf(NodeKind::FilterName, name_start, i)];
        let content_start = self.skip_spaces(i, end);
        let mut span_end = end;
        if content_start < end {
            children.push(self.leaf(NodeKind::Content, content_start, self.rstrip(content_start, end)));
        } else if let Some((block_start, block_end)) = self.consume_raw_block(indent) {
            children.push(self.leaf(NodeKind::Content, block_start, block_end));
            span_end = block_end;
        }
        self.node(NodeKind::Filter, true, at, span_end, children)
    }

    // === Tags ===

    fn parse_tag_line(&mut self, at: usize, end: usize, indent: usize) -> SyntaxNode {
        let (mut children, dot_block, consumed_to) = self.parse_tag_parts(at, end);
        let mut span_end = consumed_to.max(self.rstrip(at, end));

        // a line no tag part could start becomes a bare recovery node
        if children.len() == 1 && children[0].kind == NodeKind::Error {
            if let Some(mut error) = children.pop() {
                if let Some(body) = self.parse_children_block(indent) {
                    error.span = Span::new(error.span.start, body.span.end);
                    error.end_position = body.end_position;
                    error.children.push(body);
                }
                return error;
            }
        }

        if dot_block {
            if let Some((block_start, block_end)) = self.consume_raw_block(indent) {
                let content = self.leaf(NodeKind::Content, block_start, block_end);
                children.push(self.node(NodeKind::Children, true, block_start, block_end, vec![content]));
                span_end = span_end.max(block_end);
            }
        } else if let Some(body) = self.parse_children_block(indent) {
            span_end = span_end.max(u32::from(body.span.end) as usize);
            children.push(body);
        }

        self.node(NodeKind::Tag, true, at, span_end, children)
    }

    /// Parses a tag without a line of its own, as in `li: a(href=url)` or
    /// `#[em word]`.
    fn parse_inline_tag(&mut self, at: usize, end: usize) -> SyntaxNode {
        let (children, _, consumed_to) = self.parse_tag_parts(at, end);
        self.node(NodeKind::Tag, true, at, consumed_to.max(self.rstrip(at, end)), children)
    }

    /// Parses the in-line parts of a tag: name, shorthand classes/ids,
    /// attribute list and suffix (`=` code, `:` expansion, inline content,
    /// trailing `.`). Returns the children, whether a dot block follows, and
    /// how far the scan consumed.
    fn parse_tag_parts(&mut self, at: usize, end: usize) -> (Vec<SyntaxNode>, bool, usize) {
        let bytes = self.source.as_bytes();
        let mut children = Vec::new();
        let mut i = at;
        let mut dot_block = false;

        if i < end && is_ident_start(bytes[i]) {
            let name_start = i;
            while i < end && is_ident_char(bytes[i]) {
                i += 1;
            }
            children.push(self.leaf(NodeKind::TagName, name_start, i));
        }

        loop {
            if i >= end {
                break;
            }
            match bytes[i] {
                b'.' => {
                    if i + 1 < end && is_ident_char(bytes[i + 1]) {
                        let start = i;
                        i += 1;
                        while i < end && is_ident_char(bytes[i]) {
                            i += 1;
                        }
                        children.push(self.leaf(NodeKind::Class, start, i));
                    } else {
                        dot_block = true;
                        i += 1;
                        break;
                    }
                }
                b'#' => {
                    if i + 1 < end && is_ident_char(bytes[i + 1]) {
                        let start = i;
                        i += 1;
                        while i < end && is_ident_char(bytes[i]) {
                            i += 1;
                        }
                        children.push(self.leaf(NodeKind::Id, start, i));
                    } else {
                        break;
                    }
                }
                b'(' => {
                    children.push(self.parse_attributes(&mut i, end));
                }
                _ => break,
            }
        }

        if !dot_block && i < end {
            match bytes[i] {
                b'=' => {
                    children.push(self.tag_code_suffix(NodeKind::BufferedCode, i, 1, end));
                    i = end;
                }
                b'!' if i + 1 < end && bytes[i + 1] == b'=' => {
                    children.push(self.tag_code_suffix(NodeKind::UnescapedBufferedCode, i, 2, end));
                    i = end;
                }
                b':' => {
                    let inner_start = self.skip_spaces(i + 1, end);
                    if inner_start < end {
                        let inner = self.parse_inline_tag(inner_start, end);
                        let inner_end = u32::from(inner.span.end) as usize;
                        children.push(self.node(
                            NodeKind::Children,
                            true,
                            inner_start,
                            inner_end,
                            vec![inner],
                        ));
                    }
                    i = end;
                }
                b'/' => {
                    children.push(self.token(i, i + 1));
                    i += 1;
                }
                b' ' => {
                    let content_start = i + 1;
                    if content_start < end {
                        children.push(self.parse_content(content_start, end));
                    }
                    i = end;
                }
                found => {
                    self.error(ParseErrorKind::UnexpectedChar { found: found as char }, i, i + 1);
                    children.push(self.node(NodeKind::Error, true, i, end, Vec::new()));
                    i = end;
                }
            }
        }

        (children, dot_block, i)
    }

    fn tag_code_suffix(
        &mut self,
        kind: NodeKind,
        at: usize,
        keyword_len: usize,
        end: usize,
    ) -> SyntaxNode {
        let kw = self.leaf(NodeKind::Keyword, at, at + keyword_len);
        let mut children = vec![kw];
        let expr_start = self.skip_spaces(at + keyword_len, end);
        let expr_end = self.rstrip(expr_start, end);
        if expr_start < expr_end {
            children.push(self.leaf(NodeKind::Javascript, expr_start, expr_end));
        }
        self.node(kind, true, at, end, children)
    }

    // === Attributes ===

    fn parse_attributes(&mut self, i: &mut usize, end: usize) -> SyntaxNode {
        let open = *i;
        let mut children = vec![self.token(open, open + 1)];
        let bytes = self.source.as_bytes();
        *i += 1;
        loop {
            *i = self.skip_spaces(*i, end);
            if *i >= end {
                self.error(ParseErrorKind::UnclosedAttributeList, open, end);
                break;
            }
            match bytes[*i] {
                b')' => {
                    children.push(self.token(*i, *i + 1));
                    *i += 1;
                    break;
                }
                b',' => {
                    children.push(self.token(*i, *i + 1));
                    *i += 1;
                }
                _ => self.parse_attribute_entry(i, end, &mut children),
            }
        }
        self.node(NodeKind::Attributes, true, open, *i, children)
    }

    /// Parses one `name`, `name=value` or dangling `name=` entry, pushing
    /// the attribute node (and a dangling `=` token, if any) onto
    /// `children`.
    fn parse_attribute_entry(&mut self, i: &mut usize, end: usize, children: &mut Vec<SyntaxNode>) {
        let bytes = self.source.as_bytes();
        let name_start = *i;
        let name_end = match bytes[*i] {
            b'"' | b'\'' => self.scan_string(*i, end),
            b'[' => self.scan_balanced(*i, end, b'[', b']'),
            b'(' => self.scan_balanced(*i, end, b'(', b')'),
            _ => {
                let mut j = *i;
                while j < end && !matches!(bytes[j], b' ' | b'\t' | b',' | b')' | b'=' | b'!') {
                    j += 1;
                }
                j
            }
        };
        if name_end == name_start {
            self.error(
                ParseErrorKind::UnexpectedChar {
                    found: bytes[*i] as char,
                },
                *i,
                *i + 1,
            );
            children.push(self.token(*i, *i + 1));
            *i += 1;
            return;
        }
        let name = self.leaf(NodeKind::AttributeName, name_start, name_end);
        *i = name_end;

        let eq = if *i + 1 < end && bytes[*i] == b'!' && bytes[*i + 1] == b'=' {
            let tok = (*i, *i + 2);
            *i += 2;
            Some(tok)
        } else if *i < end && bytes[*i] == b'=' {
            let tok = (*i, *i + 1);
            *i += 1;
            Some(tok)
        } else {
            None
        };

        let Some((eq_start, eq_end)) = eq else {
            children.push(self.node(NodeKind::Attribute, true, name_start, name_end, vec![name]));
            return;
        };

        if *i >= end || matches!(bytes[*i], b')' | b',' | b' ' | b'\t') {
            // `attr=` with the value not yet typed: the `=` stays a sibling
            // of the bare attribute so later passes can still see it
            children.push(self.node(NodeKind::Attribute, true, name_start, name_end, vec![name]));
            children.push(self.token(eq_start, eq_end));
            return;
        }

        let value = match bytes[*i] {
            b'"' | b'\'' => {
                let value_end = self.scan_string(*i, end);
                let node = self.leaf(NodeKind::QuotedAttributeValue, *i, value_end);
                *i = value_end;
                node
            }
            _ => {
                let value_end = self.scan_expression(*i, end);
                let node = self.leaf(NodeKind::Javascript, *i, value_end);
                *i = value_end;
                node
            }
        };
        let value_end = u32::from(value.span.end) as usize;
        children.push(self.node(
            NodeKind::Attribute,
            true,
            name_start,
            value_end,
            vec![name, self.token(eq_start, eq_end), value],
        ));
    }

    // === Content and interpolation ===

    /// Parses a run of inline text, collecting `#{expr}` and `#[tag]`
    /// interpolations as children of one `content` node. The content span
    /// covers the whole run, interpolations included.
    fn parse_content(&mut self, start: usize, end: usize) -> SyntaxNode {
        let bytes = self.source.as_bytes();
        let mut interpolations = Vec::new();
        let mut i = start;
        while i + 1 < end {
            if bytes[i] == b'#' && bytes[i + 1] == b'{' {
                let (node, next) = self.parse_string_interpolation(i, end);
                interpolations.push(node);
                i = next;
            } else if bytes[i] == b'#' && bytes[i + 1] == b'[' {
                let (node, next) = self.parse_tag_interpolation(i, end);
                interpolations.push(node);
                i = next;
            } else {
                i += 1;
            }
        }
        self.node(NodeKind::Content, true, start, end, interpolations)
    }

    fn parse_string_interpolation(&mut self, at: usize, end: usize) -> (SyntaxNode, usize) {
        let kw = self.leaf(NodeKind::Keyword, at, at + 2);
        let expr_start = at + 2;
        let bytes = self.source.as_bytes();
        let mut depth = 0usize;
        let mut i = expr_start;
        let mut close = None;
        while i < end {
            match bytes[i] {
                b'\'' | b'"' | b'`' => {
                    i = self.scan_string(i, end);
                    continue;
                }
                b'{' => depth += 1,
                b'}' => {
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            i += 1;
        }
        match close {
            Some(close) => {
                let js = self.leaf(NodeKind::Javascript, expr_start, close);
                let node = self.node(
                    NodeKind::EscapedStringInterpolation,
                    true,
                    at,
                    close + 1,
                    vec![kw, js, self.token(close, close + 1)],
                );
                (node, close + 1)
            }
            None => {
                self.error(ParseErrorKind::UnclosedInterpolation, at, end);
                let js = self.leaf(NodeKind::Javascript, expr_start, end);
                let node = self.node(
                    NodeKind::EscapedStringInterpolation,
                    true,
                    at,
                    end,
                    vec![kw, js],
                );
                (node, end)
            }
        }
    }

    fn parse_tag_interpolation(&mut self, at: usize, end: usize) -> (SyntaxNode, usize) {
        let kw = self.leaf(NodeKind::Keyword, at, at + 2);
        let inner_start = at + 2;
        let bytes = self.source.as_bytes();
        let mut i = inner_start;
        let mut close = None;
        while i < end {
            match bytes[i] {
                b'\'' | b'"' | b'`' => {
                    i = self.scan_string(i, end);
                    continue;
                }
                b']' => {
                    close = Some(i);
                    break;
                }
                _ => i += 1,
            }
        }
        let Some(close) = close else {
            self.error(ParseErrorKind::UnclosedInterpolation, at, end);
            let node = self.node(NodeKind::TagInterpolation, true, at, end, vec![kw]);
            return (node, end);
        };
        let inner = self.parse_inline_tag(inner_start, close);
        let wrapper = self.node(NodeKind::Children, true, inner_start, close, vec![inner]);
        let node = self.node(
            NodeKind::TagInterpolation,
            true,
            at,
            close + 1,
            vec![kw, wrapper, self.token(close, close + 1)],
        );
        (node, close + 1)
    }
}
