//! Diagnostics reported by the projection pass.

use pug_parser::NodeKind;
use source_map::Span;
use thiserror::Error;

/// A non-fatal problem encountered while projecting. The pass always runs to
/// completion; the subtree that produced the diagnostic simply emits nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformDiagnostic {
    /// A node kind with no projection rule.
    #[error("no projection for `{}` node", kind.as_str())]
    UnknownNodeKind {
        /// The kind that was not recognized.
        kind: NodeKind,
        /// Where the node sits in the source.
        span: Span,
    },

    /// A fixed-shape construct did not have the expected children.
    #[error("malformed {construct}")]
    MalformedConstruct {
        /// Which construct had the unexpected shape.
        construct: &'static str,
        /// Where the node sits in the source.
        span: Span,
    },
}

impl TransformDiagnostic {
    /// The source span the diagnostic points at.
    pub fn span(&self) -> Span {
        match self {
            TransformDiagnostic::UnknownNodeKind { span, .. } => *span,
            TransformDiagnostic::MalformedConstruct { span, .. } => *span,
        }
    }
}
