//! Syntax tree types.
//!
//! The parser produces a uniform tree of [`SyntaxNode`]s rather than a typed
//! AST: the projection downstream dispatches on [`NodeKind`] and walks named
//! children, so a single node shape with a closed kind enum is all it needs.
//! Anonymous punctuation (`(`, `)`, `,`, `=`) is kept in the tree as unnamed
//! [`NodeKind::Token`] children because sibling scans depend on it.

use source_map::{LineCol, Span};

/// The closed set of syntax node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// The root of a parsed template.
    SourceFile,
    /// A wrapper around the indented body of a construct.
    Children,
    /// An element line, e.g. `div.card(title='x') hello`.
    Tag,
    /// The element name at the start of a tag line.
    TagName,
    /// A `.class` shorthand token, sigil included.
    Class,
    /// A `#id` shorthand token, sigil included.
    Id,
    /// A parenthesized attribute list.
    Attributes,
    /// One entry of an attribute list.
    Attribute,
    /// The name part of an attribute entry.
    AttributeName,
    /// A quoted attribute value, quotes included.
    QuotedAttributeValue,
    /// An embedded JavaScript expression leaf.
    Javascript,
    /// Plain text content, interpolations included in the raw slice.
    Content,
    /// A `#{expr}` interpolation inside content.
    EscapedStringInterpolation,
    /// A `#[tag ...]` interpolation inside content.
    TagInterpolation,
    /// A `|` plain-text line.
    Pipe,
    /// An `if`/`else if`/`unless`/`else` line and its body.
    Conditional,
    /// A `case expr` line and its body.
    Case,
    /// A `when expr` or `default` arm of a case.
    When,
    /// An `each x in xs` line and its body.
    Each,
    /// The loop variable(s) of an `each`.
    IterationVariable,
    /// The iterated expression of an `each`.
    IterationIterator,
    /// A structural keyword (`if`, `each`, `mixin`, `|`, ...).
    Keyword,
    /// A `//` or `//-` comment and its indented continuation.
    Comment,
    /// A `block name` line in a standalone template.
    BlockDefinition,
    /// A `block name` line in a template that extends another.
    BlockUse,
    /// The name of a block.
    BlockName,
    /// An `extends path` line.
    Extends,
    /// An `include path` line.
    Include,
    /// The path of an `extends`/`include` line.
    Filename,
    /// A `mixin name(params)` definition and its body.
    MixinDefinition,
    /// The name of a mixin definition.
    MixinName,
    /// The parameter list of a mixin definition.
    MixinAttributes,
    /// A `+name(args)` mixin invocation.
    MixinUse,
    /// A `:name` filter line.
    Filter,
    /// The name of a filter.
    FilterName,
    /// A `= expr` buffered-output line or tag suffix.
    BufferedCode,
    /// A `- stmt` unbuffered code line or block.
    UnbufferedCode,
    /// A `!= expr` unescaped buffered-output line.
    UnescapedBufferedCode,
    /// A `script.` block of raw JavaScript.
    ScriptBlock,
    /// Anonymous punctuation, always unnamed.
    Token,
    /// A recovery node covering input the parser could not classify.
    Error,
}

impl NodeKind {
    /// The grammar-style name of this kind, for diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::SourceFile => "source_file",
            NodeKind::Children => "children",
            NodeKind::Tag => "tag",
            NodeKind::TagName => "tag_name",
            NodeKind::Class => "class",
            NodeKind::Id => "id",
            NodeKind::Attributes => "attributes",
            NodeKind::Attribute => "attribute",
            NodeKind::AttributeName => "attribute_name",
            NodeKind::QuotedAttributeValue => "quoted_attribute_value",
            NodeKind::Javascript => "javascript",
            NodeKind::Content => "content",
            NodeKind::EscapedStringInterpolation => "escaped_string_interpolation",
            NodeKind::TagInterpolation => "tag_interpolation",
            NodeKind::Pipe => "pipe",
            NodeKind::Conditional => "conditional",
            NodeKind::Case => "case",
            NodeKind::When => "when",
            NodeKind::Each => "each",
            NodeKind::IterationVariable => "iteration_variable",
            NodeKind::IterationIterator => "iteration_iterator",
            NodeKind::Keyword => "keyword",
            NodeKind::Comment => "comment",
            NodeKind::BlockDefinition => "block_definition",
            NodeKind::BlockUse => "block_use",
            NodeKind::BlockName => "block_name",
            NodeKind::Extends => "extends",
            NodeKind::Include => "include",
            NodeKind::Filename => "filename",
            NodeKind::MixinDefinition => "mixin_definition",
            NodeKind::MixinName => "mixin_name",
            NodeKind::MixinAttributes => "mixin_attributes",
            NodeKind::MixinUse => "mixin_use",
            NodeKind::Filter => "filter",
            NodeKind::FilterName => "filter_name",
            NodeKind::BufferedCode => "buffered_code",
            NodeKind::UnbufferedCode => "unbuffered_code",
            NodeKind::UnescapedBufferedCode => "unescaped_buffered_code",
            NodeKind::ScriptBlock => "script_block",
            NodeKind::Token => "token",
            NodeKind::Error => "ERROR",
        }
    }
}

/// A node of the parsed tree.
///
/// Nodes do not own their text; [`SyntaxNode::text`] slices it back out of
/// the source the tree was parsed from. Children are in source order.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    /// The kind of this node.
    pub kind: NodeKind,
    /// Whether this node is named. Unnamed nodes are structural punctuation
    /// that tree walks skip but sibling scans may inspect.
    pub named: bool,
    /// The byte range this node covers in the source.
    pub span: Span,
    /// Line/column of `span.start`.
    pub start_position: LineCol,
    /// Line/column of `span.end`.
    pub end_position: LineCol,
    /// Child nodes in source order, named and unnamed.
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Returns the raw text slice this node covers.
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[u32::from(self.span.start) as usize..u32::from(self.span.end) as usize]
    }

    /// Iterates over the named children only.
    pub fn named_children(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter(|child| child.named)
    }

    /// Returns the `index`-th named child, if present.
    pub fn named_child(&self, index: usize) -> Option<&SyntaxNode> {
        self.named_children().nth(index)
    }

    /// Number of named children.
    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use source_map::LineCol;

    #[test]
    fn test_text_slices_source() {
        let source = "div hello";
        let node = SyntaxNode {
            kind: NodeKind::TagName,
            named: true,
            span: Span::new(0u32, 3u32),
            start_position: LineCol::new(0, 0),
            end_position: LineCol::new(0, 3),
            children: Vec::new(),
        };
        assert_eq!(node.text(source), "div");
    }

    #[test]
    fn test_named_children_filter() {
        let leaf = |kind, named, start: u32, end: u32| SyntaxNode {
            kind,
            named,
            span: Span::new(start, end),
            start_position: LineCol::default(),
            end_position: LineCol::default(),
            children: Vec::new(),
        };
        let parent = SyntaxNode {
            children: vec![
                leaf(NodeKind::Token, false, 0, 1),
                leaf(NodeKind::AttributeName, true, 1, 4),
                leaf(NodeKind::Token, false, 4, 5),
            ],
            ..leaf(NodeKind::Attributes, true, 0, 5)
        };
        assert_eq!(parent.named_child_count(), 1);
        assert_eq!(
            parent.named_child(0).map(|c| c.kind),
            Some(NodeKind::AttributeName)
        );
    }
}
