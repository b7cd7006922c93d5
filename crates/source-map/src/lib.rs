//! Offset mapping between Pug templates and their projected HTML.
//!
//! When a Pug template is projected into HTML for analysis, every emitted
//! fragment records which bytes of the template it came from. This crate
//! holds the mapping table built during that projection and answers offset
//! queries in both directions afterwards, so results computed against the
//! HTML can be translated back to positions in the template.

mod builder;
mod line_index;
mod map;
mod span;

pub use builder::SourceMapBuilder;
pub use line_index::{LineCol, LineIndex};
pub use map::{Mapping, NoMapping, RangeKind, SourceMap};
pub use span::{ByteOffset, Span};
