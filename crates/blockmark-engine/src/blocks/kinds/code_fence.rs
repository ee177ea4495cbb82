//! Fenced code blocks.
//!
//! The block stores the language as typed (`js`); the highlighter's
//! canonical key (`javascript`) only appears in rendered markup.

use std::sync::{Arc, LazyLock};

use blockmark_markup::MarkupSpan;
use blockmark_markup::text::{code_language, escape_attr, escape_text};
use regex::Regex;

use crate::blocks::{BlockVariant, Capabilities, SerializeOptions, Trigger, VariantDescriptor};
use crate::editing::commands::Cmd;
use crate::editing::keys::{Key, KeyEvent};
use crate::error::TransformError;
use crate::highlight::SyntaxHighlighter;
use crate::models::{Block, BlockKind, VariantTag};

static DESCRIPTOR: VariantDescriptor = VariantDescriptor {
    tag: VariantTag::Code,
    name: "Code",
    capabilities: Capabilities::MULTILINE.union(Capabilities::STRUCTURED),
    triggers: &[Trigger::on_enter("```"), Trigger::on_enter("~~~")],
    priority: 20,
};

static FENCE_TRIGGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:```|~~~)[ \t]*([^\s`]*)[ \t]*$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceKind {
    Backticks,
    Tildes,
}

impl FenceKind {
    pub fn char(self) -> char {
        match self {
            FenceKind::Backticks => '`',
            FenceKind::Tildes => '~',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    pub kind: FenceKind,
    pub len: usize,
}

/// Owns fence syntax knowledge.
pub struct CodeFence;

impl CodeFence {
    pub const BACKTICKS: &'static str = "```";
    pub const TILDES: &'static str = "~~~";

    /// An opening fence and its info string.
    pub fn open(line: &str) -> Option<(Fence, &str)> {
        let line = line.trim();
        let kind = match line.chars().next()? {
            '`' => FenceKind::Backticks,
            '~' => FenceKind::Tildes,
            _ => return None,
        };
        let len = line.chars().take_while(|&c| c == kind.char()).count();
        if len < 3 {
            return None;
        }
        let info = line[len..].trim();
        if kind == FenceKind::Backticks && info.contains('`') {
            return None;
        }
        Some((Fence { kind, len }, info))
    }

    /// Whether `line` closes a block opened by `fence`.
    pub fn closes(fence: Fence, line: &str) -> bool {
        let line = line.trim();
        line.len() >= fence.len && line.chars().all(|c| c == fence.kind.char())
    }

    /// A backtick fence longer than any backtick run in `content`.
    pub fn fence_for(content: &str) -> String {
        let mut longest = 0;
        let mut run = 0;
        for c in content.chars() {
            if c == '`' {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }
        "`".repeat((longest + 1).max(3))
    }
}

pub struct CodeVariant {
    highlighter: Arc<dyn SyntaxHighlighter>,
    default_language: Option<String>,
}

impl CodeVariant {
    pub fn new(highlighter: Arc<dyn SyntaxHighlighter>, default_language: Option<String>) -> Self {
        Self {
            highlighter,
            default_language,
        }
    }

    fn highlighted(&self, code: &str, language: &str) -> String {
        match self.highlighter.highlight(code, language) {
            Ok(markup) if !markup.is_empty() || code.is_empty() => markup,
            Ok(_) => {
                log::warn!("Highlighter returned nothing for {language:?}, rendering plain");
                escape_text(code)
            }
            Err(e) => {
                log::warn!("Highlighting failed, rendering plain: {e}");
                escape_text(code)
            }
        }
    }
}

fn language_of(block: &Block) -> Option<&str> {
    match &block.kind {
        BlockKind::Code { language } => language.as_deref(),
        _ => None,
    }
}

impl BlockVariant for CodeVariant {
    fn descriptor(&self) -> &VariantDescriptor {
        &DESCRIPTOR
    }

    fn serialize_to_markdown(&self, block: &Block, _options: &SerializeOptions) -> String {
        let fence = CodeFence::fence_for(&block.content);
        let language = language_of(block).unwrap_or_default();
        if block.content.is_empty() {
            format!("{fence}{language}\n{fence}")
        } else {
            format!("{fence}{language}\n{}\n{fence}", block.content)
        }
    }

    fn serialize_to_markup(&self, block: &Block) -> String {
        let language = language_of(block).and_then(|l| self.highlighter.normalize_language(l));
        let mut body = self.highlighted(&block.content, language.as_deref().unwrap_or_default());
        if !block.content.is_empty() {
            body.push('\n');
        }
        match language {
            Some(language) => format!(
                "<pre><code class=\"language-{}\">{body}</code></pre>",
                escape_attr(&language)
            ),
            None => format!("<pre><code>{body}</code></pre>"),
        }
    }

    fn can_parse_markup(&self, span: &MarkupSpan) -> bool {
        matches!(span.tag.as_str(), "pre" | "code")
    }

    fn parse_from_markup(&self, span: &MarkupSpan) -> Option<Block> {
        if !self.can_parse_markup(span) {
            return None;
        }
        let language = code_language(&span.markup);
        Some(Block::new(BlockKind::Code { language }, span.text.clone()))
    }

    fn can_parse_markdown(&self, text: &str) -> bool {
        parse_fenced(text).is_some()
    }

    fn parse_from_markdown(&self, text: &str) -> Option<Block> {
        let (language, content) = parse_fenced(text)?;
        Some(Block::new(BlockKind::Code { language }, content))
    }

    fn apply_trigger(&self, block: &mut Block, typed: &str) -> Result<(), TransformError> {
        let captures = FENCE_TRIGGER
            .captures(typed.trim())
            .ok_or_else(|| TransformError::Invalid {
                variant: VariantTag::Code,
                reason: format!("not a fence: {typed:?}"),
            })?;
        let language = captures
            .get(1)
            .map(|m| m.as_str())
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .or_else(|| self.default_language.clone());
        block.kind = BlockKind::Code { language };
        block.checked = false;
        block.set_content("");
        block.touch();
        Ok(())
    }

    fn handle_key_press(&self, block: &Block, event: &KeyEvent, caret: usize) -> Option<Cmd> {
        if event.key == Key::Tab && event.is_plain() && !event.shift {
            return Some(Cmd::InsertText {
                block: block.id,
                at: caret,
                text: "\t".to_string(),
            });
        }
        None
    }

    fn handle_enter_key(&self, block: &Block, event: &KeyEvent, caret: usize) -> Option<Cmd> {
        if event.key != Key::Enter || event.ctrl || event.meta {
            return None;
        }
        // A second Enter on a trailing empty line leaves the block
        if !event.shift && caret >= block.content.len() && block.content.ends_with('\n') {
            return Some(Cmd::ExitBlock { block: block.id });
        }
        Some(Cmd::InsertText {
            block: block.id,
            at: caret,
            text: "\n".to_string(),
        })
    }

    fn apply_transformation(&self, block: &mut Block, seed: &str) -> Result<(), TransformError> {
        let language = match &block.kind {
            BlockKind::Code { language } => language.clone(),
            _ => self.default_language.clone(),
        };
        block.kind = BlockKind::Code { language };
        block.checked = false;
        block.set_content(seed);
        Ok(())
    }
}

/// Language and body of a complete fenced block. An unclosed fence is not a
/// code block.
fn parse_fenced(text: &str) -> Option<(Option<String>, String)> {
    let text = text.trim_matches('\n');
    let mut lines = text.split('\n');
    let (fence, info) = CodeFence::open(lines.next()?)?;

    let body: Vec<&str> = lines.collect();
    let (last, body) = body.split_last()?;
    if !CodeFence::closes(fence, last) || body.iter().any(|l| CodeFence::closes(fence, l)) {
        return None;
    }

    let language = info
        .split_whitespace()
        .next()
        .map(str::to_string);
    Some((language, body.join("\n")))
}
