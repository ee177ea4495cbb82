//! Text extraction helpers shared by the segmenter and block variants.

use crate::element::{Element, elements, find_first};
use crate::lexer::{TokenKind, lex};
use crate::tag::{parse_close_tag, parse_open_tag};

/// Tags whose boundaries become line breaks in extracted text.
const LINE_BREAKING: &[&str] = &[
    "p",
    "div",
    "li",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "pre",
    "ul",
    "ol",
    "table",
    "tr",
];

pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

pub fn escape_text(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

pub fn escape_attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Strip every tag, decode entities and tidy lines.
///
/// Block-level boundaries and `<br>` become newlines; blank lines are
/// dropped and each line is trimmed.
pub fn strip_tags(markup: &str) -> String {
    let mut raw = String::new();

    for token in lex(markup) {
        match token.kind {
            TokenKind::Text | TokenKind::Lt => raw.push_str(&decode_entities(token.text)),
            TokenKind::OpenTag => {
                if let Some(tag) = parse_open_tag(token.text)
                    && (tag.name == "br" || LINE_BREAKING.contains(&tag.name.as_str()))
                {
                    raw.push('\n');
                }
            }
            TokenKind::CloseTag => {
                if let Some(name) = parse_close_tag(token.text)
                    && LINE_BREAKING.contains(&name.as_str())
                {
                    raw.push('\n');
                }
            }
            TokenKind::Comment => {}
        }
    }

    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Concatenate character data only, preserving whitespace exactly.
pub fn raw_text(markup: &str) -> String {
    lex(markup)
        .into_iter()
        .filter(|t| matches!(t.kind, TokenKind::Text | TokenKind::Lt))
        .map(|t| decode_entities(t.text))
        .collect()
}

/// Body of the innermost `<code>` element (or of `markup` itself when there
/// is none), with highlighting spans removed and the renderer's single
/// trailing newline dropped.
pub fn code_content(markup: &str) -> String {
    let inner = match find_first(markup, "code") {
        Some((el, _)) => raw_text(el.inner_markup(markup)),
        None => raw_text(markup),
    };
    match inner.strip_suffix('\n') {
        Some(trimmed) => trimmed.to_string(),
        None => inner,
    }
}

/// Language declared on a code element: `class="language-x"`, `lang` or
/// `data-language`, looking at the `<code>` element first and then the
/// outermost element.
pub fn code_language(markup: &str) -> Option<String> {
    let from = |el: &Element| -> Option<String> {
        if let Some(class) = el.attr("class") {
            for part in class.split_whitespace() {
                if let Some(lang) = part.strip_prefix("language-").or(part.strip_prefix("lang-"))
                    && !lang.is_empty()
                {
                    return Some(lang.to_string());
                }
            }
        }
        el.attr("data-language")
            .or(el.attr("lang"))
            .filter(|l| !l.is_empty())
            .map(str::to_string)
    };

    if let Some((code, _)) = find_first(markup, "code")
        && let Some(lang) = from(&code)
    {
        return Some(lang);
    }
    elements(markup).first().and_then(from)
}

/// One `<li>` of a list, split into its own markup and any nested lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMarkup {
    pub attrs: Vec<(String, String)>,
    /// Item markup with nested `<ul>`/`<ol>` removed.
    pub content: String,
    /// Outer markup of each nested list, in order.
    pub nested: Vec<String>,
}

impl ItemMarkup {
    pub fn attr(&self, name: &str) -> Option<&str> {
        crate::tag::find_attr(&self.attrs, name)
    }
}

/// Direct `<li>` children of a list's inner markup.
pub fn list_items(list_inner: &str) -> Vec<ItemMarkup> {
    elements(list_inner)
        .into_iter()
        .filter(|el| el.name == "li")
        .map(|li| split_item(&li, list_inner))
        .collect()
}

/// Split a single `<li>` element.
pub fn split_item(li: &Element, source: &str) -> ItemMarkup {
    let inner = li.inner_markup(source);
    let mut content = String::new();
    let mut nested = Vec::new();
    let mut cursor = 0;

    for el in elements(inner) {
        if el.name == "ul" || el.name == "ol" {
            content.push_str(&inner[cursor..el.range.start]);
            nested.push(el.outer(inner).to_string());
            cursor = el.range.end;
        }
    }
    content.push_str(&inner[cursor..]);

    ItemMarkup {
        attrs: li.attrs.clone(),
        content,
        nested,
    }
}
