use std::sync::LazyLock;

use blockmark_markup::MarkupSpan;
use regex::Regex;

use crate::blocks::kinds::span_inner;
use crate::blocks::{BlockVariant, Capabilities, SerializeOptions, VariantDescriptor};
use crate::editing::commands::Cmd;
use crate::editing::keys::{Key, KeyEvent};
use crate::error::TransformError;
use crate::models::{Block, BlockKind, VariantTag};
use crate::parsing::inline::{inline_markdown_to_markup, markup_to_inline_markdown};

static DESCRIPTOR: VariantDescriptor = VariantDescriptor {
    tag: VariantTag::Paragraph,
    name: "Paragraph",
    capabilities: Capabilities::TEXT.union(Capabilities::MULTILINE),
    triggers: &[],
    priority: 1000,
};

/// Line starts markdown would read as a block: ATX headings, quotes, table
/// rows, bullets, fences, images, thematic breaks and setext underlines.
static BLOCK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:#{1,6}(?:[ \t]|$)|[>|]|[-+*](?:[ \t]|$)|```|~~~|!\[|(?:[-*_][ \t]*){3,}$|=+[ \t]*$|-+[ \t]*$)")
        .expect("valid regex")
});

static ORDERED_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,9})([.)])(?:[ \t]|$)").expect("valid regex"));

static ESCAPED_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,9})?\\([!#*+\-.)=>_|~`])").expect("valid regex"));

/// Escape whatever would make `line` start a block other than a paragraph.
fn escape_line(line: &str) -> String {
    let line = line.trim_start();
    if BLOCK_START.is_match(line) {
        format!("\\{line}")
    } else {
        ORDERED_START.replace(line, "${1}\\${2}").into_owned()
    }
}

fn unescape_line(line: &str) -> String {
    ESCAPED_START.replace(line, "${1}${2}").into_owned()
}

/// The default block, and the fallback for anything unrecognised.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParagraphVariant;

impl BlockVariant for ParagraphVariant {
    fn descriptor(&self) -> &VariantDescriptor {
        &DESCRIPTOR
    }

    fn serialize_to_markdown(&self, block: &Block, _options: &SerializeOptions) -> String {
        block
            .content
            .split('\n')
            .map(escape_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn serialize_to_markup(&self, block: &Block) -> String {
        format!("<p>{}</p>", inline_markdown_to_markup(&block.content))
    }

    fn can_parse_markup(&self, span: &MarkupSpan) -> bool {
        matches!(span.tag.as_str(), "p" | "div" | "del" | "li") && !span.is_task_item()
    }

    fn parse_from_markup(&self, span: &MarkupSpan) -> Option<Block> {
        if !self.can_parse_markup(span) {
            return None;
        }
        let text = markup_to_inline_markdown(span_inner(span));
        let content = if span.tag == "del" && !text.is_empty() {
            format!("~~{text}~~")
        } else {
            text
        };
        Some(Block::paragraph(content))
    }

    fn can_parse_markdown(&self, text: &str) -> bool {
        !text.trim().is_empty()
    }

    fn parse_from_markdown(&self, text: &str) -> Option<Block> {
        if !self.can_parse_markdown(text) {
            return None;
        }
        let content = text
            .trim()
            .lines()
            .map(|line| unescape_line(line.trim()))
            .collect::<Vec<_>>()
            .join("\n");
        Some(Block::paragraph(content))
    }

    fn handle_enter_key(&self, block: &Block, event: &KeyEvent, caret: usize) -> Option<Cmd> {
        if event.key == Key::Enter && event.shift {
            return Some(Cmd::InsertText {
                block: block.id,
                at: caret,
                text: "\n".to_string(),
            });
        }
        None
    }

    fn apply_transformation(&self, block: &mut Block, seed: &str) -> Result<(), TransformError> {
        block.kind = BlockKind::Paragraph;
        block.checked = false;
        block.set_content(seed);
        Ok(())
    }
}
