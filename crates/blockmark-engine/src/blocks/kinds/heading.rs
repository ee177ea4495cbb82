use blockmark_markup::MarkupSpan;

use crate::blocks::kinds::{single_line, span_inner};
use crate::blocks::{BlockVariant, Capabilities, SerializeOptions, Trigger, VariantDescriptor};
use crate::error::TransformError;
use crate::models::{Block, BlockKind, HeadingLevel, VariantTag};
use crate::parsing::inline::{inline_markdown_to_markup, markup_to_inline_markdown};

const fn descriptor(
    level: HeadingLevel,
    name: &'static str,
    triggers: &'static [Trigger],
) -> VariantDescriptor {
    VariantDescriptor {
        tag: VariantTag::Heading(level),
        name,
        capabilities: Capabilities::TEXT,
        triggers,
        priority: 10,
    }
}

static DESCRIPTORS: [VariantDescriptor; 6] = [
    descriptor(HeadingLevel::H1, "Heading 1", &[Trigger::immediate("# ")]),
    descriptor(HeadingLevel::H2, "Heading 2", &[Trigger::immediate("## ")]),
    descriptor(HeadingLevel::H3, "Heading 3", &[Trigger::immediate("### ")]),
    descriptor(HeadingLevel::H4, "Heading 4", &[Trigger::immediate("#### ")]),
    descriptor(HeadingLevel::H5, "Heading 5", &[Trigger::immediate("##### ")]),
    descriptor(HeadingLevel::H6, "Heading 6", &[Trigger::immediate("###### ")]),
];

/// Owns ATX heading syntax knowledge.
pub struct Atx;

impl Atx {
    pub const MARKER: char = '#';

    /// Split an ATX heading line into its level and text.
    ///
    /// Handles `# text`, `#` alone, and an optional closing `#` run.
    pub fn split(line: &str) -> Option<(HeadingLevel, &str)> {
        let line = line.trim();
        let hashes = line.chars().take_while(|&c| c == Self::MARKER).count();
        let level = HeadingLevel::from_number(u8::try_from(hashes).ok()?)?;

        let rest = &line[hashes..];
        if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
            return None;
        }

        let mut text = rest.trim();
        let without_closing = text.trim_end_matches(Self::MARKER);
        if without_closing.is_empty() || without_closing.ends_with([' ', '\t']) {
            text = without_closing.trim_end();
        }
        Some((level, text))
    }

    /// Escape a trailing `#` run that would read as a closing sequence.
    pub fn escape_closing(text: &str) -> String {
        let run = text.len() - text.trim_end_matches(Self::MARKER).len();
        let body = &text[..text.len() - run];
        if run == 0 || !(body.is_empty() || body.ends_with([' ', '\t'])) {
            return text.to_string();
        }
        format!("{body}\\{}", &text[body.len()..])
    }

    /// Undo [`Atx::escape_closing`].
    pub fn unescape_closing(text: &str) -> String {
        let run = text.len() - text.trim_end_matches(Self::MARKER).len();
        let body = &text[..text.len() - run];
        match body.strip_suffix('\\') {
            Some(head) if run > 0 && (head.is_empty() || head.ends_with([' ', '\t'])) => {
                format!("{head}{}", &text[body.len()..])
            }
            _ => text.to_string(),
        }
    }
}

pub struct HeadingVariant {
    level: HeadingLevel,
}

impl HeadingVariant {
    pub fn new(level: HeadingLevel) -> Self {
        Self { level }
    }

    fn element(&self) -> String {
        format!("h{}", self.level.number())
    }
}

impl BlockVariant for HeadingVariant {
    fn descriptor(&self) -> &VariantDescriptor {
        &DESCRIPTORS[usize::from(self.level.number() - 1)]
    }

    fn serialize_to_markdown(&self, block: &Block, _options: &SerializeOptions) -> String {
        let hashes = "#".repeat(usize::from(self.level.number()));
        let text = Atx::escape_closing(&single_line(&block.content));
        format!("{hashes} {text}").trim_end().to_string()
    }

    fn serialize_to_markup(&self, block: &Block) -> String {
        let tag = self.element();
        format!(
            "<{tag}>{}</{tag}>",
            inline_markdown_to_markup(&single_line(&block.content))
        )
    }

    fn can_parse_markup(&self, span: &MarkupSpan) -> bool {
        span.tag == self.element()
    }

    fn parse_from_markup(&self, span: &MarkupSpan) -> Option<Block> {
        if !self.can_parse_markup(span) {
            return None;
        }
        let content = single_line(&markup_to_inline_markdown(span_inner(span)));
        Some(Block::new(BlockKind::Heading(self.level), content))
    }

    fn can_parse_markdown(&self, text: &str) -> bool {
        let text = text.trim();
        !text.contains('\n') && matches!(Atx::split(text), Some((level, _)) if level == self.level)
    }

    fn parse_from_markdown(&self, text: &str) -> Option<Block> {
        if !self.can_parse_markdown(text) {
            return None;
        }
        let (_, content) = Atx::split(text)?;
        Some(Block::new(
            BlockKind::Heading(self.level),
            Atx::unescape_closing(content),
        ))
    }

    fn apply_transformation(&self, block: &mut Block, seed: &str) -> Result<(), TransformError> {
        block.kind = BlockKind::Heading(self.level);
        block.checked = false;
        block.set_content(single_line(seed));
        Ok(())
    }
}
