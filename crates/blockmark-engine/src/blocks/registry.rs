//! The variant registry: dispatch table, factory and trigger table.
//!
//! Built once through [`RegistryBuilder`] and never mutated afterwards, so
//! one registry can be shared by any number of editor sessions.

use std::sync::Arc;

use blockmark_config::EditorConfig;
use blockmark_markup::MarkupSpan;
use blockmark_markup::text::strip_tags;

use crate::blocks::kinds::{ParagraphVariant, default_variants};
use crate::blocks::{BlockVariant, SerializeOptions, Trigger, TriggerCommit};
use crate::error::TransformError;
use crate::highlight::{PlainHighlighter, SyntaxHighlighter};
use crate::models::{Block, BlockKind, VariantTag};

/// A trigger recognised in a block's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    pub tag: VariantTag,
    /// The normalised text that matched.
    pub text: String,
    /// `None` for pattern triggers.
    pub trigger: Option<Trigger>,
}

#[derive(Default)]
pub struct RegistryBuilder {
    variants: Vec<Arc<dyn BlockVariant>>,
    options: SerializeOptions,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: SerializeOptions) -> Self {
        self.options = options;
        self
    }

    /// Register a variant. A second variant for an already registered tag is
    /// ignored; the first registration wins.
    pub fn register(mut self, variant: Arc<dyn BlockVariant>) -> Self {
        let tag = variant.tag();
        if self.variants.iter().any(|v| v.tag() == tag) {
            log::warn!("Variant {tag} already registered, ignoring duplicate");
            return self;
        }
        self.variants.push(variant);
        self
    }

    pub fn register_all(self, variants: impl IntoIterator<Item = Arc<dyn BlockVariant>>) -> Self {
        variants.into_iter().fold(self, Self::register)
    }

    pub fn build(self) -> VariantRegistry {
        let mut variants = self.variants;
        // Stable: equal priorities keep registration order
        variants.sort_by_key(|v| v.descriptor().priority);

        let fallback = match variants.iter().find(|v| v.tag() == VariantTag::Paragraph) {
            Some(paragraph) => Arc::clone(paragraph),
            None => {
                let paragraph: Arc<dyn BlockVariant> = Arc::new(ParagraphVariant);
                variants.push(Arc::clone(&paragraph));
                paragraph
            }
        };

        log::debug!("Variant registry built with {} variants", variants.len());
        VariantRegistry {
            variants,
            fallback,
            options: self.options,
        }
    }
}

pub struct VariantRegistry {
    /// Sorted by priority.
    variants: Vec<Arc<dyn BlockVariant>>,
    fallback: Arc<dyn BlockVariant>,
    options: SerializeOptions,
}

impl VariantRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// All built-in variants with default settings.
    pub fn with_defaults() -> Self {
        Self::with_options(&EditorConfig::default(), Arc::new(PlainHighlighter))
    }

    pub fn with_options(config: &EditorConfig, highlighter: Arc<dyn SyntaxHighlighter>) -> Self {
        Self::builder()
            .options(SerializeOptions::from(&config.markdown))
            .register_all(default_variants(config, highlighter))
            .build()
    }

    pub fn get(&self, tag: VariantTag) -> Option<&dyn BlockVariant> {
        self.variants
            .iter()
            .find(|v| v.tag() == tag)
            .map(|v| v.as_ref())
    }

    pub fn contains(&self, tag: VariantTag) -> bool {
        self.get(tag).is_some()
    }

    /// The variant owning `block`, or the paragraph variant.
    pub fn variant_for(&self, block: &Block) -> &dyn BlockVariant {
        self.get(block.tag()).unwrap_or_else(|| self.fallback())
    }

    pub fn fallback(&self) -> &dyn BlockVariant {
        self.fallback.as_ref()
    }

    /// Variants in priority order.
    pub fn variants(&self) -> impl Iterator<Item = &dyn BlockVariant> {
        self.variants.iter().map(|v| v.as_ref())
    }

    pub fn serialize_options(&self) -> &SerializeOptions {
        &self.options
    }

    /// Build a block from one markup span with the first variant that
    /// recognises it. Children are not attached.
    pub fn create_from_span(&self, span: &MarkupSpan) -> Block {
        for variant in self.variants() {
            if variant.can_parse_markup(span)
                && let Some(block) = variant.parse_from_markup(span)
            {
                return block;
            }
        }
        log::debug!("No variant claimed <{}>, using a paragraph", span.tag);
        Block::paragraph(span.text.clone())
    }

    /// Build a block from one markdown chunk with the first variant that
    /// recognises it.
    pub fn create_from_markdown(&self, text: &str) -> Block {
        for variant in self.variants() {
            if variant.can_parse_markdown(text)
                && let Some(block) = variant.parse_from_markdown(text)
            {
                return block;
            }
        }
        Block::paragraph(text.trim())
    }

    /// A fresh block of `tag`, seeded with plain text.
    pub fn create(&self, tag: VariantTag, seed: &str) -> Result<Block, TransformError> {
        let variant = self
            .get(tag)
            .ok_or(TransformError::Unsupported { variant: tag })?;
        let mut block = Block::new(BlockKind::default_for(tag), "");
        variant.apply_transformation(&mut block, seed)?;
        Ok(block)
    }

    /// Plain-text projection, falling back to the cached markup with tags
    /// stripped.
    pub fn plain_text(&self, block: &Block) -> String {
        let text = self.variant_for(block).plain_text(block);
        if text.is_empty() && !block.markup.is_empty() {
            return strip_tags(&block.markup);
        }
        text
    }

    pub fn render_markup(&self, block: &Block) -> String {
        self.variant_for(block).serialize_to_markup(block)
    }

    pub fn render_markdown(&self, block: &Block) -> String {
        self.variant_for(block)
            .serialize_to_markdown(block, &self.options)
    }

    /// Find the trigger `text` spells out.
    ///
    /// Immediate triggers must equal the whole text. OnEnter triggers may be
    /// followed by a single word (a fence's language). Fixed strings are
    /// tried before pattern triggers; among fixed strings the longest wins,
    /// then the higher priority.
    pub fn match_trigger(&self, text: &str, commit: TriggerCommit) -> Option<TriggerMatch> {
        let text = normalize_trigger_text(text);

        let mut best: Option<(VariantTag, Trigger)> = None;
        for variant in self.variants() {
            for trigger in variant.markdown_triggers() {
                if trigger.commit != commit || !trigger_fits(trigger, &text) {
                    continue;
                }
                let longer = best.is_none_or(|(_, b)| trigger.text.len() > b.text.len());
                if longer {
                    best = Some((variant.tag(), *trigger));
                }
            }
        }
        if let Some((tag, trigger)) = best {
            log::debug!("Trigger {:?} matched {tag}", trigger.text);
            return Some(TriggerMatch {
                tag,
                text,
                trigger: Some(trigger),
            });
        }

        if commit == TriggerCommit::Immediate {
            for variant in self.variants() {
                if variant.matches_trigger_pattern(&text) {
                    log::debug!("Pattern trigger matched {}", variant.tag());
                    return Some(TriggerMatch {
                        tag: variant.tag(),
                        text,
                        trigger: None,
                    });
                }
            }
        }
        None
    }

    /// Whether `text` could still grow into a fixed trigger.
    pub fn is_trigger_prefix(&self, text: &str) -> bool {
        let text = normalize_trigger_text(text);
        !text.is_empty()
            && self
                .variants()
                .flat_map(|v| v.markdown_triggers())
                .any(|t| t.text.starts_with(&text))
    }

    /// Length in chars of the longest fixed trigger.
    pub fn longest_trigger_len(&self) -> usize {
        self.variants()
            .flat_map(|v| v.markdown_triggers())
            .map(|t| t.text.chars().count())
            .max()
            .unwrap_or(0)
    }
}

impl Default for VariantRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn normalize_trigger_text(text: &str) -> String {
    text.replace('\u{a0}', " ")
}

fn trigger_fits(trigger: &Trigger, text: &str) -> bool {
    match trigger.commit {
        TriggerCommit::Immediate => text == trigger.text,
        TriggerCommit::OnEnter => {
            let text = text.trim_end();
            match text.strip_prefix(trigger.text) {
                Some(rest) => {
                    let rest = rest.trim_start();
                    !rest.contains(char::is_whitespace)
                        && !rest.starts_with(|c: char| trigger.text.starts_with(c))
                }
                None => false,
            }
        }
    }
}
