use std::sync::LazyLock;

use blockmark_markup::text::escape_attr;
use blockmark_markup::{MarkupSpan, find_first};
use regex::Regex;

use crate::blocks::{BlockVariant, Capabilities, SerializeOptions, VariantDescriptor};
use crate::error::TransformError;
use crate::models::{Block, BlockKind, VariantTag};

static DESCRIPTOR: VariantDescriptor = VariantDescriptor {
    tag: VariantTag::Image,
    name: "Image",
    capabilities: Capabilities::STRUCTURED,
    triggers: &[],
    priority: 80,
};

static IMAGE_MD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^!\[([^\]]*)\]\(\s*(<[^>]*>|[^\s)]+)(?:\s+"([^"]*)")?\s*\)$"#).expect("valid regex")
});

static IMAGE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://\S+|[^\s:]+)\.(?:png|jpe?g|gif|webp|svg|bmp|ico|avif)(?:[?#]\S*)?$")
        .expect("valid regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageData {
    pub src: String,
    pub alt: String,
    pub title: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageData {
    fn of(block: &Block) -> ImageData {
        match &block.kind {
            BlockKind::Image {
                src,
                alt,
                title,
                width,
                height,
            } => ImageData {
                src: src.clone(),
                alt: alt.clone(),
                title: title.clone(),
                width: *width,
                height: *height,
            },
            _ => ImageData::default(),
        }
    }

    fn into_kind(self) -> BlockKind {
        BlockKind::Image {
            src: self.src,
            alt: self.alt,
            title: self.title,
            width: self.width,
            height: self.height,
        }
    }
}

/// A standalone image. `content` mirrors the source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageVariant;

impl ImageVariant {
    pub fn image(data: ImageData) -> Block {
        let content = data.src.clone();
        Block::new(data.into_kind(), content)
    }
}

/// `![alt](src "title")`.
fn parse_image_markdown(text: &str) -> Option<ImageData> {
    let captures = IMAGE_MD.captures(text.trim())?;
    let src = captures.get(2)?.as_str();
    let src = src
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(src);
    Some(ImageData {
        src: src.to_string(),
        alt: captures.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
        title: captures.get(3).map(|m| m.as_str().to_string()),
        ..ImageData::default()
    })
}

/// A data URI or a path/URL ending in an image extension.
fn is_bare_image_source(text: &str) -> bool {
    let text = text.trim();
    text.starts_with("data:image/") || IMAGE_PATH.is_match(text)
}

fn parse_image_content(text: &str) -> Option<ImageData> {
    if let Some(data) = parse_image_markdown(text) {
        return Some(data);
    }
    is_bare_image_source(text).then(|| ImageData {
        src: text.trim().to_string(),
        ..ImageData::default()
    })
}

fn markdown_src(src: &str) -> String {
    if src.contains([' ', '(', ')']) {
        format!("<{src}>")
    } else {
        src.to_string()
    }
}

impl BlockVariant for ImageVariant {
    fn descriptor(&self) -> &VariantDescriptor {
        &DESCRIPTOR
    }

    fn serialize_to_markdown(&self, block: &Block, _options: &SerializeOptions) -> String {
        let data = ImageData::of(block);
        if data.src.is_empty() {
            return String::new();
        }
        let src = markdown_src(&data.src);
        match &data.title {
            Some(title) => format!("![{}]({src} \"{title}\")", data.alt),
            None => format!("![{}]({src})", data.alt),
        }
    }

    fn serialize_to_markup(&self, block: &Block) -> String {
        let data = ImageData::of(block);
        let mut out = format!(
            "<img src=\"{}\" alt=\"{}\"",
            escape_attr(&data.src),
            escape_attr(&data.alt)
        );
        if let Some(title) = &data.title {
            out.push_str(&format!(" title=\"{}\"", escape_attr(title)));
        }
        if let Some(width) = data.width {
            out.push_str(&format!(" width=\"{width}\""));
        }
        if let Some(height) = data.height {
            out.push_str(&format!(" height=\"{height}\""));
        }
        out.push_str(" />");
        out
    }

    fn can_parse_markup(&self, span: &MarkupSpan) -> bool {
        span.tag == "img" || (span.tag == "p" && span.text.is_empty() && find_first(&span.markup, "img").is_some())
    }

    fn parse_from_markup(&self, span: &MarkupSpan) -> Option<Block> {
        if !self.can_parse_markup(span) {
            return None;
        }
        let (img, _) = find_first(&span.markup, "img")?;
        let dimension = |name: &str| img.attr(name).and_then(|v| v.trim_end_matches("px").parse().ok());
        Some(Self::image(ImageData {
            src: img.attr("src").unwrap_or_default().to_string(),
            alt: img.attr("alt").unwrap_or_default().to_string(),
            title: img.attr("title").map(str::to_string),
            width: dimension("width"),
            height: dimension("height"),
        }))
    }

    fn can_parse_markdown(&self, text: &str) -> bool {
        parse_image_content(text).is_some()
    }

    fn parse_from_markdown(&self, text: &str) -> Option<Block> {
        parse_image_content(text).map(Self::image)
    }

    fn matches_trigger_pattern(&self, text: &str) -> bool {
        parse_image_markdown(text).is_some()
    }

    fn apply_trigger(&self, block: &mut Block, typed: &str) -> Result<(), TransformError> {
        let data = parse_image_markdown(typed).ok_or_else(|| TransformError::Invalid {
            variant: VariantTag::Image,
            reason: format!("not image markdown: {typed:?}"),
        })?;
        set_image(block, data);
        Ok(())
    }

    fn apply_transformation(&self, block: &mut Block, seed: &str) -> Result<(), TransformError> {
        // Unrecognised text is kept as the alt text
        let data = parse_image_content(seed).unwrap_or_else(|| ImageData {
            alt: seed.trim().to_string(),
            ..ImageData::default()
        });
        set_image(block, data);
        Ok(())
    }

    fn plain_text(&self, block: &Block) -> String {
        let data = ImageData::of(block);
        if data.src.is_empty() { data.alt } else { data.src }
    }
}

fn set_image(block: &mut Block, data: ImageData) {
    let src = data.src.clone();
    block.kind = data.into_kind();
    block.checked = false;
    block.set_content(src);
    block.touch();
}
