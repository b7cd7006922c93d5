//! A fault-tolerant parser for Pug templates.
//!
//! [`parse`] turns a template into a [`SyntaxNode`] tree with byte-accurate
//! spans and never fails: malformed input yields `Error` nodes and a list of
//! [`ParseError`]s next to the best tree the parser could build.
//!
//! ```
//! use pug_parser::{parse, NodeKind};
//!
//! let result = parse("div.card hello");
//! assert!(result.errors.is_empty());
//! let tag = result.root.named_child(0).unwrap();
//! assert_eq!(tag.kind, NodeKind::Tag);
//! ```

mod error;
mod node;
mod parser;

pub use error::{ParseError, ParseErrorKind};
pub use node::{NodeKind, SyntaxNode};

/// The outcome of parsing a template.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The root of the tree, always a [`NodeKind::SourceFile`].
    pub root: SyntaxNode,
    /// Errors recovered from during parsing, in source order.
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// True if parsing recorded no errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parses a Pug template into a positioned syntax tree.
pub fn parse(source: &str) -> ParseResult {
    parser::Parser::new(source).parse()
}
