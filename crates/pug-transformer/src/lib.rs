//! Pug to HTML projection for tooling reuse.
//!
//! This crate rewrites a Pug template into synthesized HTML that a markup
//! analyzer understands, while recording a bidirectional offset map between
//! the two texts. It handles:
//! - Shorthand `.class`/`#id` tokens, folded into real attributes
//! - Control flow (`if`, `each`, `case`), rewritten into `<script>` blocks
//! - Interpolations and embedded expressions
//! - Mixin definitions, rewritten into template wrappers
//!
//! Analyzer results computed against the HTML are carried back to the
//! template through [`source_map::SourceMap`] queries.
//!
//! # Example
//!
//! ```
//! use pug_transformer::transform;
//!
//! let result = transform("img.logo\n");
//! assert_eq!(result.html, "<img class=\"logo\"/>\n");
//!
//! // the class token maps back to its source span, sigil excluded
//! let logo = result.html.find("logo").unwrap() as u32;
//! let pug = result.source_map.html_to_pug(logo.into()).unwrap();
//! assert_eq!(u32::from(pug), 4);
//! ```

mod diagnostic;
mod transform;

pub use diagnostic::TransformDiagnostic;
pub use transform::{transform, transform_tree, TransformResult};
