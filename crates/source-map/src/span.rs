//! Span and byte offset types for positions in either text.

use text_size::{TextRange, TextSize};

/// A byte offset into a source string.
pub type ByteOffset = TextSize;

/// A byte range in either the Pug source or the projected HTML.
///
/// Spans are stored as half-open intervals `[start, end)`. Mapping lookups
/// use [`Span::contains_inclusive`] instead, which also accepts the end
/// offset; see the module docs on [`crate::SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// The start byte offset (inclusive).
    pub start: ByteOffset,
    /// The end byte offset (exclusive).
    pub end: ByteOffset,
}

impl Span {
    /// Creates a new span from start and end byte offsets.
    #[inline]
    pub fn new(start: impl Into<ByteOffset>, end: impl Into<ByteOffset>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Creates an empty span at the given offset.
    #[inline]
    pub fn empty(offset: impl Into<ByteOffset>) -> Self {
        let offset = offset.into();
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Returns the length of this span in bytes.
    #[inline]
    pub fn len(&self) -> TextSize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if `offset` lies in the half-open interval `[start, end)`.
    #[inline]
    pub fn contains(&self, offset: ByteOffset) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns true if `offset` lies in the closed interval `[start, end]`.
    ///
    /// Both endpoints are accepted so that a caret sitting right after a
    /// token is still attributed to the mapping that ends there.
    #[inline]
    pub fn contains_inclusive(&self, offset: ByteOffset) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// Converts this span to a `TextRange`.
    #[inline]
    pub fn to_range(self) -> TextRange {
        TextRange::new(self.start, self.end)
    }
}

impl From<TextRange> for Span {
    fn from(range: TextRange) -> Self {
        Self {
            start: range.start(),
            end: range.end(),
        }
    }
}

impl From<Span> for TextRange {
    fn from(span: Span) -> Self {
        TextRange::new(span.start, span.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_new() {
        let span = Span::new(2u32, 7u32);
        assert_eq!(span.start, TextSize::from(2));
        assert_eq!(span.end, TextSize::from(7));
        assert_eq!(span.len(), TextSize::from(5));
    }

    #[test]
    fn test_span_empty() {
        let span = Span::empty(9u32);
        assert!(span.is_empty());
        assert_eq!(span.len(), TextSize::from(0));
    }

    #[test]
    fn test_containment_endpoints() {
        let span = Span::new(5u32, 15u32);
        assert!(span.contains(TextSize::from(5)));
        assert!(!span.contains(TextSize::from(15)));
        assert!(span.contains_inclusive(TextSize::from(15)));
        assert!(!span.contains_inclusive(TextSize::from(16)));
        assert!(!span.contains_inclusive(TextSize::from(4)));
    }

    #[test]
    fn test_empty_span_inclusive_containment() {
        // Zero-width anchors still contain their own offset
        let span = Span::empty(3u32);
        assert!(!span.contains(TextSize::from(3)));
        assert!(span.contains_inclusive(TextSize::from(3)));
    }
}
