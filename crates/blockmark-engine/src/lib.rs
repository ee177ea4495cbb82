//! Block-structured rich-text editing core.
//!
//! A document is a flat list of typed [`Block`]s. Each block variant knows
//! how to read and write markdown and markup, which typed triggers create
//! it, and how it reacts to keys. The [`Editor`] ties a [`Document`] to a
//! [`VariantRegistry`], a [`Parser`] and the key state machine.

pub mod blocks;
pub mod editing;
pub mod error;
pub mod highlight;
pub mod models;
pub mod parsing;

// Re-export key types for easier usage
pub use blocks::{BlockVariant, VariantRegistry};
pub use editing::{Cmd, ConversionEngine, Editor, Focus, Key, KeyAction, KeyEvent, KeyOutcome, Patch};
pub use error::{ConvertError, TransformError};
pub use highlight::{PlainHighlighter, SyntaxHighlighter};
pub use models::{Block, BlockId, BlockKind, Document, HeadingLevel, VariantTag};
pub use parsing::Parser;
