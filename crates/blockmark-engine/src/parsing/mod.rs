//! # Parsing
//!
//! Markdown to blocks runs in four steps:
//!
//! ```text
//! markdown ─ preprocess ─ MarkdownConverter ─ postprocess ─ segment ─ variants
//! ```
//!
//! 1. [`converter::preprocess`] rewrites task items and defuses unterminated
//!    fences.
//! 2. The [`MarkdownConverter`] (pulldown-cmark by default) produces markup.
//! 3. [`converter::postprocess`] reshapes it into one element per block.
//! 4. [`blockmark_markup::segment`] splits the markup into spans and the
//!    [`VariantRegistry`] turns each span into a [`Block`].
//!
//! Serialisation is variant-local: every block asks its own variant.
//!
//! Parsing depends only on the input and the registry, so the same text
//! always yields the same tree.

pub mod converter;
pub mod inline;

use std::sync::Arc;

use blockmark_markup::text::escape_text;
use blockmark_markup::{MarkupSpan, segment};

use crate::blocks::{Capabilities, VariantRegistry};
use crate::blocks::kinds::{TaskListVariant, list};
use crate::models::{Block, Document};
use crate::parsing::inline::markup_to_inline_markdown;

pub use converter::{ConverterOptions, MarkdownConverter, PulldownConverter};

pub struct Parser {
    registry: Arc<VariantRegistry>,
    converter: Box<dyn MarkdownConverter>,
    options: ConverterOptions,
}

impl Parser {
    pub fn new(registry: Arc<VariantRegistry>) -> Self {
        Self::with_converter(registry, Box::new(PulldownConverter))
    }

    pub fn with_converter(registry: Arc<VariantRegistry>, converter: Box<dyn MarkdownConverter>) -> Self {
        Self {
            registry,
            converter,
            options: ConverterOptions::default(),
        }
    }

    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    /// Markdown to block-per-line markup. A failing converter degrades to the
    /// escaped source in one paragraph.
    pub fn markdown_to_markup(&self, markdown: &str) -> String {
        let prepared = converter::preprocess(markdown);
        match self.converter.convert_to_markup(&prepared, &self.options) {
            Ok(raw) => converter::postprocess(&raw, &self.options),
            Err(e) => {
                log::warn!("Markdown conversion failed, keeping source as text: {e}");
                format!("<p>{}</p>", escape_text(markdown))
            }
        }
    }

    pub fn parse(&self, markdown: &str) -> Vec<Block> {
        if markdown.trim().is_empty() {
            return Vec::new();
        }
        self.parse_markup(&self.markdown_to_markup(markdown))
    }

    /// Parse into a document, which is never empty.
    pub fn parse_document(&self, markdown: &str) -> Document {
        Document::from_blocks(self.parse(markdown))
    }

    pub fn parse_markup(&self, markup: &str) -> Vec<Block> {
        let blocks: Vec<Block> = segment(markup).iter().map(|span| self.build_block(span)).collect();
        log::debug!("Parsed {} top-level blocks", blocks.len());
        blocks
    }

    fn build_block(&self, span: &MarkupSpan) -> Block {
        let mut block = if span.is_task_item() {
            let checked = span.attr("data-checked") == Some("true");
            let text = markup_to_inline_markdown(crate::blocks::kinds::span_inner(span));
            TaskListVariant::task(text.replace('\n', " "), checked)
        } else {
            self.registry.create_from_span(span)
        };

        if block.children.is_empty() && !span.children.is_empty() {
            block.children = span
                .children
                .iter()
                .map(|child| Block {
                    item: child.item,
                    ..self.build_block(child)
                })
                .collect();
            list::settle_anchors(&mut block);
        }
        block.markup = self.serialize_block(&block);
        block
    }

    /// Markup for one block, children included.
    pub fn serialize_block(&self, block: &Block) -> String {
        let variant = self.registry.variant_for(block);
        let own = variant.serialize_to_markup(block);
        if block.children.is_empty() || variant.descriptor().has(Capabilities::CHILDREN) {
            return own;
        }

        let children: String = block
            .children
            .iter()
            .map(|child| format!("\n{}", self.serialize_block(child)))
            .collect();
        match own.strip_suffix("</blockquote>") {
            Some(open) => format!("{open}{children}\n</blockquote>"),
            None => format!("{own}{children}"),
        }
    }

    /// Markdown for one block, children included.
    pub fn serialize_block_markdown(&self, block: &Block) -> String {
        let variant = self.registry.variant_for(block);
        let own = variant.serialize_to_markdown(block, self.registry.serialize_options());
        if block.children.is_empty() || variant.descriptor().has(Capabilities::CHILDREN) {
            return own;
        }

        let children: Vec<String> = block
            .children
            .iter()
            .map(|child| self.serialize_block_markdown(child))
            .collect();
        if block.tag() == crate::models::VariantTag::Quote {
            let nested: Vec<String> = children
                .join("\n\n")
                .lines()
                .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {line}") })
                .collect();
            format!("{own}\n>\n{}", nested.join("\n"))
        } else {
            format!("{own}\n\n{}", children.join("\n\n"))
        }
    }

    pub fn to_markdown(&self, document: &Document) -> String {
        document
            .blocks()
            .iter()
            .map(|block| self.serialize_block_markdown(block))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn to_markup(&self, document: &Document) -> String {
        document
            .blocks()
            .iter()
            .map(|block| self.serialize_block(block))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
