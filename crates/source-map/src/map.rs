//! The mapping table built during projection and the offset queries on it.

use crate::{ByteOffset, Span};
use thiserror::Error;

/// What a mapped HTML span stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RangeKind {
    /// A tag or filter name emitted verbatim.
    TagName,
    /// An attribute name emitted verbatim.
    AttributeName,
    /// A quoted attribute value or a mixin parameter binding.
    AttributeValue,
    /// The `=` between an attribute name and its value.
    Equals,
    /// A `.class` or `#id` shorthand token with its sigil stripped.
    IdClass,
    /// Plain text content.
    Content,
    /// An embedded JavaScript expression.
    Javascript,
    /// Synthesized filler standing in for whitespace or separators.
    Space,
    /// A zero-width anchor that only exists to give a caret a position.
    Empty,
    /// The path of an `extends`/`include` line.
    Filename,
}

/// One record correlating a span of projected HTML with a span of the Pug
/// source.
///
/// `pug: None` marks pure synthesis (a literal `<`, `</script>`, quotes and
/// the like) that has no source counterpart; such records never participate
/// in offset lookups. The final coverage record appended by
/// [`SourceMapBuilder::finish`](crate::SourceMapBuilder::finish) carries a
/// pug span but no kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mapping {
    /// The span in the projected HTML.
    pub html: Span,
    /// The corresponding span in the Pug source, if any.
    pub pug: Option<Span>,
    /// The semantic tag of the span, if any.
    pub kind: Option<RangeKind>,
}

impl Mapping {
    /// Returns true if this record maps back to the source.
    #[inline]
    pub fn is_sourced(&self) -> bool {
        self.pug.is_some()
    }
}

/// No mapping covers the queried offset and no later record could serve as a
/// fallback anchor. Only returned for an empty table or offsets past every
/// record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no mapping covers offset {}", u32::from(*offset))]
pub struct NoMapping {
    /// The offset that was queried.
    pub offset: ByteOffset,
}

/// The completed mapping table for one projection.
///
/// Records are kept in emission order and are never re-sorted: HTML offsets
/// are non-decreasing because the projected text is append-only, but pug
/// offsets are not monotonic — synthesized filler around omitted syntax maps
/// to ad hoc source points, and both lookup directions therefore stay linear
/// scans. The table is immutable once built; queries are pure reads and safe
/// to run concurrently.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    pub(crate) mappings: Vec<Mapping>,
    pub(crate) pug_len: ByteOffset,
    pub(crate) html_len: ByteOffset,
}

impl SourceMap {
    /// Returns the number of records in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns true if the table has no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Returns the length of the Pug source this map was built against.
    #[inline]
    pub fn pug_len(&self) -> ByteOffset {
        self.pug_len
    }

    /// Returns the length of the projected HTML.
    #[inline]
    pub fn html_len(&self) -> ByteOffset {
        self.html_len
    }

    /// Iterates over all records in emission order.
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    /// Translates an offset in the projected HTML to the corresponding
    /// offset in the Pug source.
    ///
    /// The first record whose HTML span contains the offset (endpoints
    /// inclusive) wins. Offsets falling in unmapped synthesis gaps borrow
    /// the first record in emission order whose HTML span ends past the
    /// offset; this keeps carets inside synthesized text usable.
    pub fn html_to_pug(&self, offset: ByteOffset) -> Result<ByteOffset, NoMapping> {
        let mut fallback = None;
        for mapping in &self.mappings {
            let Some(pug) = mapping.pug else { continue };
            if mapping.html.contains_inclusive(offset) {
                return Ok(rebase(offset, mapping.html.start, pug.start, self.pug_len));
            }
            if fallback.is_none() && mapping.html.end > offset {
                fallback = Some((mapping.html.start, pug.start));
            }
        }
        match fallback {
            Some((html_start, pug_start)) => {
                Ok(rebase(offset, html_start, pug_start, self.pug_len))
            }
            None => Err(NoMapping { offset }),
        }
    }

    /// Translates an offset in the Pug source to the corresponding offset in
    /// the projected HTML. Mirror image of [`SourceMap::html_to_pug`].
    pub fn pug_to_html(&self, offset: ByteOffset) -> Result<ByteOffset, NoMapping> {
        let mut fallback = None;
        for mapping in &self.mappings {
            let Some(pug) = mapping.pug else { continue };
            if pug.contains_inclusive(offset) {
                return Ok(rebase(offset, pug.start, mapping.html.start, self.html_len));
            }
            if fallback.is_none() && pug.end > offset {
                fallback = Some((pug.start, mapping.html.start));
            }
        }
        match fallback {
            Some((pug_start, html_start)) => {
                Ok(rebase(offset, pug_start, html_start, self.html_len))
            }
            None => Err(NoMapping { offset }),
        }
    }

    /// Returns the first record whose HTML span contains the offset
    /// (endpoints inclusive). No fallback.
    pub fn mapping_at_html(&self, offset: ByteOffset) -> Option<&Mapping> {
        self.mappings
            .iter()
            .filter(|m| m.is_sourced())
            .find(|m| m.html.contains_inclusive(offset))
    }

    /// Returns the first record whose pug span contains the offset
    /// (endpoints inclusive). No fallback.
    pub fn mapping_at_pug(&self, offset: ByteOffset) -> Option<&Mapping> {
        self.mappings
            .iter()
            .find(|m| m.pug.is_some_and(|pug| pug.contains_inclusive(offset)))
    }
}

/// Carries `offset` from one text to the other by preserving its distance
/// from the record start, clamped to the target text.
fn rebase(offset: ByteOffset, from: ByteOffset, to: ByteOffset, limit: ByteOffset) -> ByteOffset {
    // The fallback path can hand us a record starting past the query offset,
    // so the distance is computed signed and saturated at zero.
    let delta = i64::from(u32::from(offset)) - i64::from(u32::from(from));
    let projected = (i64::from(u32::from(to)) + delta).clamp(0, i64::from(u32::from(limit)));
    ByteOffset::from(projected as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceMapBuilder;
    use pretty_assertions::assert_eq;
    use text_size::TextSize;

    fn off(n: u32) -> ByteOffset {
        TextSize::from(n)
    }

    #[test]
    fn test_empty_table_has_no_mapping() {
        let map = SourceMap::default();
        assert_eq!(map.html_to_pug(off(0)), Err(NoMapping { offset: off(0) }));
        assert_eq!(map.pug_to_html(off(0)), Err(NoMapping { offset: off(0) }));
        assert_eq!(map.mapping_at_html(off(0)), None);
    }

    #[test]
    fn test_no_mapping_display() {
        let error = NoMapping { offset: off(42) };
        assert_eq!(error.to_string(), "no mapping covers offset 42");
    }

    #[test]
    fn test_direct_containment() {
        // pug "abc" at 4..7 emitted at html 10..13
        let mut builder = SourceMapBuilder::new();
        builder.push_synth("0123456789");
        builder.push_mapped("abc", RangeKind::Content, Span::new(4u32, 7u32));
        let (_, map) = builder.finish("....abc");

        assert_eq!(map.html_to_pug(off(10)), Ok(off(4)));
        assert_eq!(map.html_to_pug(off(12)), Ok(off(6)));
        // Inclusive end: the boundary belongs to the record that ends there
        assert_eq!(map.html_to_pug(off(13)), Ok(off(7)));
        assert_eq!(map.pug_to_html(off(5)), Ok(off(11)));
    }

    #[test]
    fn test_gap_falls_back_to_next_record() {
        let mut builder = SourceMapBuilder::new();
        builder.push_synth("<div>");
        builder.push_mapped("hello", RangeKind::Content, Span::new(2u32, 7u32));
        let (_, map) = builder.finish("p hello");

        // Offset 1 sits inside the unmapped "<div>"; the first record whose
        // html end exceeds it is the "hello" mapping at html 5..10.
        assert_eq!(map.html_to_pug(off(1)), Ok(off(0)));
    }

    #[test]
    fn test_result_clamped_to_text() {
        let mut builder = SourceMapBuilder::new();
        builder.push_mapped("ab", RangeKind::Content, Span::new(0u32, 2u32));
        let (_, map) = builder.finish("ab");

        // The trailing coverage record starts one past the last pug end, so
        // a query at the very end of the html stays within the source.
        let html_end = map.html_len();
        assert!(u32::from(map.html_to_pug(html_end).unwrap()) <= 2);
    }

    #[test]
    fn test_synthetic_records_are_skipped() {
        let mut builder = SourceMapBuilder::new();
        builder.push_synth("<");
        builder.push_mapped("div", RangeKind::TagName, Span::new(0u32, 3u32));
        let (_, map) = builder.finish("div");

        // The "<" record is source-less; containment lookup skips it.
        let mapping = map.mapping_at_html(off(2)).unwrap();
        assert_eq!(mapping.kind, Some(RangeKind::TagName));
    }

    #[test]
    fn test_queries_are_idempotent() {
        let mut builder = SourceMapBuilder::new();
        builder.push_mapped("p", RangeKind::TagName, Span::new(0u32, 1u32));
        builder.push_synth(">");
        let (_, map) = builder.finish("p");

        let first = map.html_to_pug(off(2));
        for _ in 0..3 {
            assert_eq!(map.html_to_pug(off(2)), first);
        }
    }
}
