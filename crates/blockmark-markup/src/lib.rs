//! # blockmark-markup
//!
//! Reading the constrained HTML-like markup that blocks render to: headings
//! 1-6, paragraphs, `div`, `del`, lists and list items, `blockquote`, `pre`,
//! `code`, tables, `img` and `hr`.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Tokens → Elements → Block spans
//!          (Logos)          (pairing)  (segmenter)
//! ```
//!
//! ### 1. Lexer ([`lexer`] module)
//!
//! Breaks markup into tags and text runs. Every byte lands in some token.
//!
//! ### 2. Elements ([`element`] module)
//!
//! Pairs open and close tags one level at a time. Unmatched trailing content
//! is dropped instead of failing the read.
//!
//! ### 3. Segmenter ([`segment`] module)
//!
//! Picks out the top-level block spans and extracts their text, recursing
//! into lists and quotes for nested blocks.
//!
//! ## Quick Start
//!
//! ```
//! use blockmark_markup::segment;
//!
//! let spans = segment("<h1>Hello</h1>\n<ul><li>a</li><li>b</li></ul>");
//! assert_eq!(spans.len(), 2);
//! assert_eq!(spans[0].tag, "h1");
//! assert_eq!(spans[1].text, "a\nb");
//! ```
//!
//! Nothing here panics on malformed input: a stray `<` is text, a stray
//! closing tag is ignored.

pub mod element;
pub mod lexer;
pub mod segment;
pub mod tag;
pub mod text;

pub use element::{Element, Node, elements, find_first, nodes};
pub use segment::{BLOCK_TAGS, MarkupSpan, is_block_tag, segment};
pub use tag::{TagInfo, parse_close_tag, parse_open_tag};
