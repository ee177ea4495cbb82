use blockmark_markup::{MarkupSpan, Node, is_block_tag, nodes};

use crate::blocks::kinds::span_inner;
use crate::blocks::{BlockVariant, Capabilities, SerializeOptions, Trigger, VariantDescriptor};
use crate::editing::commands::Cmd;
use crate::editing::keys::{Key, KeyEvent};
use crate::error::TransformError;
use crate::models::{Block, BlockKind, VariantTag};
use crate::parsing::inline::{inline_markdown_to_markup, markup_to_inline_markdown};

static DESCRIPTOR: VariantDescriptor = VariantDescriptor {
    tag: VariantTag::Quote,
    name: "Quote",
    capabilities: Capabilities::TEXT.union(Capabilities::MULTILINE),
    triggers: &[Trigger::immediate("> ")],
    priority: 60,
};

/// Owns blockquote prefix syntax.
pub struct BlockQuote;

impl BlockQuote {
    pub const MARKER: char = '>';

    /// Strip one level of `>` from a line, with its following space.
    pub fn strip_prefix(line: &str) -> Option<&str> {
        let rest = line.trim_start().strip_prefix(Self::MARKER)?;
        Some(rest.strip_prefix(' ').unwrap_or(rest))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteVariant;

impl BlockVariant for QuoteVariant {
    fn descriptor(&self) -> &VariantDescriptor {
        &DESCRIPTOR
    }

    fn serialize_to_markdown(&self, block: &Block, _options: &SerializeOptions) -> String {
        block
            .content
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    BlockQuote::MARKER.to_string()
                } else {
                    format!("{} {line}", BlockQuote::MARKER)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Content split by blank lines is written as one `<p>` per paragraph.
    fn serialize_to_markup(&self, block: &Block) -> String {
        let paragraphs = paragraphs(&block.content);
        if paragraphs.len() < 2 {
            return format!(
                "<blockquote>{}</blockquote>",
                inline_markdown_to_markup(&block.content)
            );
        }
        let inner: Vec<String> = paragraphs
            .iter()
            .map(|p| format!("<p>{}</p>", inline_markdown_to_markup(p)))
            .collect();
        format!("<blockquote>\n{}\n</blockquote>", inner.join("\n"))
    }

    fn can_parse_markup(&self, span: &MarkupSpan) -> bool {
        span.tag == "blockquote"
    }

    fn parse_from_markup(&self, span: &MarkupSpan) -> Option<Block> {
        if !self.can_parse_markup(span) {
            return None;
        }
        let inner = span_inner(span);
        // Nested blocks other than paragraphs become children
        let mut paragraphs = Vec::new();
        let mut loose = String::new();
        for node in nodes(inner) {
            match node {
                Node::Element(el) if el.name == "p" => {
                    flush_paragraph(&mut loose, &mut paragraphs);
                    loose.push_str(el.inner_markup(inner));
                    flush_paragraph(&mut loose, &mut paragraphs);
                }
                Node::Element(el) if is_block_tag(&el.name) => {}
                Node::Element(el) => loose.push_str(el.outer(inner)),
                Node::Text(range) => loose.push_str(&inner[range]),
            }
        }
        flush_paragraph(&mut loose, &mut paragraphs);
        Some(Block::new(BlockKind::Quote, paragraphs.join("\n\n")))
    }

    fn can_parse_markdown(&self, text: &str) -> bool {
        let mut lines = text.trim().lines().peekable();
        lines.peek().is_some() && lines.all(|line| BlockQuote::strip_prefix(line).is_some())
    }

    fn parse_from_markdown(&self, text: &str) -> Option<Block> {
        if !self.can_parse_markdown(text) {
            return None;
        }
        let content = text
            .trim()
            .lines()
            .filter_map(BlockQuote::strip_prefix)
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
        Some(Block::new(BlockKind::Quote, content))
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
        block.kind = BlockKind::Quote;
        block.checked = false;
        block.set_content(seed);
        Ok(())
    }
}

/// Blank-line separated paragraphs of quote content.
fn paragraphs(content: &str) -> Vec<&str> {
    content
        .split("\n\n")
        .map(|p| p.trim_matches('\n'))
        .filter(|p| !p.is_empty())
        .collect()
}

fn flush_paragraph(loose: &mut String, paragraphs: &mut Vec<String>) {
    let text = markup_to_inline_markdown(loose);
    loose.clear();
    if !text.is_empty() {
        paragraphs.push(text);
    }
}
