//! # Block Variants
//!
//! Every variant implements [`BlockVariant`]: serialisation both ways,
//! recognisers for existing markup and markdown, trigger strings, key
//! interception and conversion from other variants.
//!
//! ## Modules
//!
//! - **`types`**: [`VariantDescriptor`], [`Capabilities`], [`Trigger`]
//! - **`kinds`**: one implementation per variant
//! - **`registry`**: [`VariantRegistry`], immutable after construction, used
//!   as the factory and trigger table
//!
//! ## Recognisers never fail
//!
//! `can_parse_*` answer `false` and `parse_from_*` answer `None` for
//! anything they do not understand. A miss is ordinary control flow.

pub mod kinds;
pub mod registry;
pub mod types;

use blockmark_config::MarkdownConfig;
use blockmark_markup::MarkupSpan;

use crate::editing::commands::Cmd;
use crate::editing::keys::KeyEvent;
use crate::error::TransformError;
use crate::models::{Block, VariantTag};

pub use registry::{RegistryBuilder, TriggerMatch, VariantRegistry};
pub use types::{Capabilities, Trigger, TriggerCommit, VariantDescriptor};

/// Markdown output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Unordered and task list marker.
    pub bullet: char,
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self::from(&MarkdownConfig::default())
    }
}

impl From<&MarkdownConfig> for SerializeOptions {
    fn from(config: &MarkdownConfig) -> Self {
        Self {
            bullet: config.bullet,
            indent: config.indent,
        }
    }
}

/// Capability set shared by all block variants.
pub trait BlockVariant: Send + Sync {
    fn descriptor(&self) -> &VariantDescriptor;

    fn tag(&self) -> VariantTag {
        self.descriptor().tag
    }

    /// Total over all content, including empty.
    fn serialize_to_markdown(&self, block: &Block, options: &SerializeOptions) -> String;

    /// Total over all content, including empty. Children are not included;
    /// the parser nests them.
    fn serialize_to_markup(&self, block: &Block) -> String;

    fn can_parse_markup(&self, span: &MarkupSpan) -> bool;

    /// `Some` exactly when [`BlockVariant::can_parse_markup`] holds.
    fn parse_from_markup(&self, span: &MarkupSpan) -> Option<Block>;

    fn can_parse_markdown(&self, text: &str) -> bool;

    /// `Some` exactly when [`BlockVariant::can_parse_markdown`] holds.
    fn parse_from_markdown(&self, text: &str) -> Option<Block>;

    fn markdown_triggers(&self) -> &'static [crate::blocks::Trigger] {
        self.descriptor().triggers
    }

    /// Triggers that are shapes rather than fixed strings.
    fn matches_trigger_pattern(&self, _text: &str) -> bool {
        false
    }

    /// Turn `block` into this variant after `typed` matched one of its
    /// triggers. Triggers carry no content by default.
    fn apply_trigger(&self, block: &mut Block, _typed: &str) -> Result<(), TransformError> {
        self.apply_transformation(block, "")
    }

    /// Intercept a key other than Enter. `Some` means handled.
    fn handle_key_press(&self, _block: &Block, _event: &KeyEvent, _caret: usize) -> Option<Cmd> {
        None
    }

    /// Intercept Enter. `Some` suppresses default Enter handling.
    fn handle_enter_key(&self, _block: &Block, _event: &KeyEvent, _caret: usize) -> Option<Cmd> {
        None
    }

    /// Re-type `block` in place as this variant, seeded with plain text.
    ///
    /// `block` still carries its previous kind so a variant can keep
    /// compatible payload (a code block's language, a task's checked state).
    fn apply_transformation(&self, block: &mut Block, seed: &str) -> Result<(), TransformError>;

    /// Plain-text projection used as the seed when converting away.
    fn plain_text(&self, block: &Block) -> String {
        block.content.clone()
    }
}

/// Largest char boundary not after `caret`.
pub(crate) fn clamp_caret(text: &str, caret: usize) -> usize {
    let mut caret = caret.min(text.len());
    while !text.is_char_boundary(caret) {
        caret -= 1;
    }
    caret
}

/// `text` with `insert` placed at `caret`.
pub(crate) fn insert_at(text: &str, caret: usize, insert: &str) -> String {
    let caret = clamp_caret(text, caret);
    let mut out = String::with_capacity(text.len() + insert.len());
    out.push_str(&text[..caret]);
    out.push_str(insert);
    out.push_str(&text[caret..]);
    out
}
