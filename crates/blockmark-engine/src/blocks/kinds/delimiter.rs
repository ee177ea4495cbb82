use blockmark_markup::MarkupSpan;

use crate::blocks::{BlockVariant, Capabilities, SerializeOptions, Trigger, VariantDescriptor};
use crate::error::TransformError;
use crate::models::{Block, BlockKind, VariantTag};

static DESCRIPTOR: VariantDescriptor = VariantDescriptor {
    tag: VariantTag::Delimiter,
    name: "Delimiter",
    capabilities: Capabilities::NONE,
    triggers: &[
        Trigger::immediate("---"),
        Trigger::immediate("***"),
        Trigger::immediate("___"),
    ],
    priority: 25,
};

/// A thematic break. Carries no content.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimiterVariant;

/// Three or more of one of `-`, `*`, `_`, optionally spaced.
fn is_thematic_break(text: &str) -> bool {
    let compact: Vec<char> = text.trim().chars().filter(|c| !matches!(c, ' ' | '\t')).collect();
    match compact.first() {
        Some(&first @ ('-' | '*' | '_')) => {
            compact.len() >= 3 && compact.iter().all(|&c| c == first)
        }
        _ => false,
    }
}

impl BlockVariant for DelimiterVariant {
    fn descriptor(&self) -> &VariantDescriptor {
        &DESCRIPTOR
    }

    fn serialize_to_markdown(&self, _block: &Block, _options: &SerializeOptions) -> String {
        "---".to_string()
    }

    fn serialize_to_markup(&self, _block: &Block) -> String {
        "<hr />".to_string()
    }

    fn can_parse_markup(&self, span: &MarkupSpan) -> bool {
        span.tag == "hr"
    }

    fn parse_from_markup(&self, span: &MarkupSpan) -> Option<Block> {
        self.can_parse_markup(span)
            .then(|| Block::new(BlockKind::Delimiter, ""))
    }

    fn can_parse_markdown(&self, text: &str) -> bool {
        !text.trim().contains('\n') && is_thematic_break(text)
    }

    fn parse_from_markdown(&self, text: &str) -> Option<Block> {
        self.can_parse_markdown(text)
            .then(|| Block::new(BlockKind::Delimiter, ""))
    }

    fn apply_transformation(&self, block: &mut Block, _seed: &str) -> Result<(), TransformError> {
        block.kind = BlockKind::Delimiter;
        block.checked = false;
        block.set_content("");
        block.touch();
        Ok(())
    }

    fn plain_text(&self, _block: &Block) -> String {
        String::new()
    }
}
