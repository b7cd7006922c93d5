//! Parse error types.

use source_map::Span;
use thiserror::Error;

/// An error recorded while parsing. Parsing never aborts: errors are
/// collected alongside a best-effort tree.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// Where in the source the error occurred.
    pub span: Span,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of parse error.
#[derive(Debug, Clone, Error)]
pub enum ParseErrorKind {
    /// An attribute list was not closed before the end of the line.
    #[error("unclosed attribute list")]
    UnclosedAttributeList,

    /// A quoted string was not terminated.
    #[error("unterminated string")]
    UnterminatedString,

    /// A construct was missing its expression part.
    #[error("missing expression after `{construct}`")]
    MissingExpression {
        /// The construct that needed an expression.
        construct: String,
    },

    /// A character that no construct could start with.
    #[error("unexpected character `{found}`")]
    UnexpectedChar {
        /// The offending character.
        found: char,
    },

    /// An interpolation was not closed.
    #[error("unclosed interpolation")]
    UnclosedInterpolation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ParseError::new(
            ParseErrorKind::MissingExpression {
                construct: "each".to_string(),
            },
            Span::new(0u32, 4u32),
        );
        assert_eq!(error.to_string(), "missing expression after `each`");
    }
}
