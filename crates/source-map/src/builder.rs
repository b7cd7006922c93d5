//! The emitter that accumulates projected HTML and its mapping table.

use crate::{ByteOffset, Mapping, RangeKind, SourceMap, Span};
use text_size::TextSize;

/// Accumulates the projected HTML text and appends one [`Mapping`] per
/// emitted fragment.
///
/// A builder is owned by exactly one projection pass: the text only ever
/// grows, so HTML offsets in the recorded table are non-decreasing by
/// construction. [`SourceMapBuilder::finish`] seals the pass by appending
/// the trailing coverage record.
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    html: String,
    mappings: Vec<Mapping>,
}

impl SourceMapBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current HTML offset, i.e. where the next fragment lands.
    #[inline]
    pub fn html_offset(&self) -> ByteOffset {
        TextSize::from(self.html.len() as u32)
    }

    /// Returns the HTML accumulated so far.
    #[inline]
    pub fn html_text(&self) -> &str {
        &self.html
    }

    /// Returns the most recently recorded mappings, newest last.
    ///
    /// The scripting-leaf projection inspects the last two records to decide
    /// whether the leaf is an attribute value.
    pub fn recent_mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Appends `text` mapped 1:1 onto `pug`.
    pub fn push_mapped(&mut self, text: &str, kind: RangeKind, pug: Span) {
        self.push_record(text, Some(kind), Some(pug));
    }

    /// Appends `text` with no source counterpart.
    pub fn push_synth(&mut self, text: &str) {
        self.push_record(text, None, None);
    }

    /// Records a zero-width span at the current HTML offset, mapped onto
    /// `pug`. Emits no text.
    pub fn push_anchor(&mut self, kind: RangeKind, pug: Span) {
        self.push_record("", Some(kind), Some(pug));
    }

    /// Appends `text` wrapped in `quote` on both sides; only the inner text
    /// is mapped.
    pub fn push_surrounded(&mut self, text: &str, kind: RangeKind, pug: Span, quote: char) {
        let mut buf = [0u8; 4];
        let quote = quote.encode_utf8(&mut buf);
        self.push_synth(quote);
        self.push_mapped(text, kind, pug);
        self.push_synth(quote);
    }

    /// Returns a zero-width pug span sitting `delta` bytes after the end of
    /// the last source-bearing record, or at offset 0 when there is none.
    ///
    /// Used to give synthesized characters (an inferred `=`, a close
    /// sequence) a best-effort caret position next to real source text.
    pub fn last_pug_end(&self, delta: i32) -> Span {
        let base = self
            .mappings
            .iter()
            .rev()
            .find_map(|m| m.pug)
            .map(|pug| u32::from(pug.end))
            .unwrap_or(0);
        Span::empty(base.saturating_add_signed(delta))
    }

    fn push_record(&mut self, text: &str, kind: Option<RangeKind>, pug: Option<Span>) {
        let start = self.html_offset();
        self.html.push_str(text);
        self.mappings.push(Mapping {
            html: Span::new(start, self.html_offset()),
            pug,
            kind,
        });
    }

    /// Appends the trailing line terminator and its coverage record, then
    /// freezes the builder into the final text and table.
    ///
    /// The coverage record spans from one past the last mapped pug offset
    /// through the end of the source, so every trailing source offset —
    /// including whitespace after the last construct — resolves to some HTML
    /// offset and vice versa.
    pub fn finish(mut self, pug_text: &str) -> (String, SourceMap) {
        let pug_len = TextSize::from(pug_text.len() as u32);
        let tail = Span::new(self.last_pug_end(1).start.min(pug_len), pug_len);

        let start = self.html_offset();
        self.html.push('\n');
        self.mappings.push(Mapping {
            html: Span::new(start, self.html_offset()),
            pug: Some(tail),
            kind: None,
        });

        let html_len = self.html_offset();
        (
            self.html,
            SourceMap {
                mappings: self.mappings,
                pug_len,
                html_len,
            },
        )
    }
}
