//! Segmenting markup into top-level block spans.
//!
//! A span is one block-level element found at the top of a fragment. Its
//! `text` is extracted with rules that depend on the tag, and its `children`
//! hold block spans discovered inside it:
//!
//! | Tag | `text` | `children` |
//! |-----|--------|------------|
//! | `ul`, `ol` | each item's own text, one per line | nested lists inside items |
//! | `pre`, `code` | innermost code body, verbatim | none |
//! | `blockquote` | tag-stripped text | inner block spans other than `p` |
//! | anything else | tag-stripped text | none |
//!
//! Character data and inline elements sitting between block elements are
//! gathered into implicit `p` spans. A `div` whose content contains block
//! elements is unwrapped into those elements.

use std::ops::Range;

use crate::element::{Element, Node, nodes};
use crate::tag::find_attr;
use crate::text::{code_content, list_items, strip_tags};

/// Tag names recognised as block-level, in matching order.
pub const BLOCK_TAGS: &[&str] = &[
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "div",
    "del",
    "p",
    "ol",
    "ul",
    "blockquote",
    "pre",
    "code",
    "li",
    "table",
    "hr",
    "img",
];

pub fn is_block_tag(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupSpan {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    /// Outer markup of the span.
    pub markup: String,
    pub text: String,
    pub children: Vec<MarkupSpan>,
    /// Synthesised from loose inline content rather than a real element.
    pub implicit: bool,
    /// For a span nested in a list, the index of the item holding it.
    pub item: Option<usize>,
}

impl MarkupSpan {
    pub fn attr(&self, name: &str) -> Option<&str> {
        find_attr(&self.attrs, name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// List items marked as tasks by the markdown pre-pass.
    pub fn is_task_item(&self) -> bool {
        self.tag == "li" && self.has_attr("data-task")
    }
}

/// Split `markup` into its top-level block spans.
pub fn segment(markup: &str) -> Vec<MarkupSpan> {
    let mut spans = Vec::new();
    let mut loose: Option<Range<usize>> = None;

    for node in nodes(markup) {
        match node {
            Node::Element(el) if is_block_tag(&el.name) => {
                flush_loose(markup, &mut loose, &mut spans);
                if el.name == "div" && contains_block(el.inner_markup(markup)) {
                    spans.extend(segment(el.inner_markup(markup)));
                } else {
                    spans.push(block_span(&el, markup));
                }
            }
            Node::Element(el) => extend(&mut loose, el.range),
            Node::Text(range) => extend(&mut loose, range),
        }
    }
    flush_loose(markup, &mut loose, &mut spans);

    spans
}

fn contains_block(markup: &str) -> bool {
    nodes(markup)
        .iter()
        .any(|n| matches!(n, Node::Element(el) if is_block_tag(&el.name)))
}

fn extend(loose: &mut Option<Range<usize>>, range: Range<usize>) {
    match loose {
        Some(run) => run.end = range.end,
        None => *loose = Some(range),
    }
}

fn flush_loose(markup: &str, loose: &mut Option<Range<usize>>, spans: &mut Vec<MarkupSpan>) {
    let Some(range) = loose.take() else {
        return;
    };
    let run = markup[range].trim();
    let text = strip_tags(run);
    if text.is_empty() {
        return;
    }
    spans.push(MarkupSpan {
        tag: "p".to_string(),
        attrs: Vec::new(),
        markup: format!("<p>{run}</p>"),
        text,
        children: Vec::new(),
        implicit: true,
        item: None,
    });
}

fn block_span(el: &Element, source: &str) -> MarkupSpan {
    let inner = el.inner_markup(source);
    let (text, children) = match el.name.as_str() {
        "ul" | "ol" => {
            let items = list_items(inner);
            let text = items
                .iter()
                .map(|item| strip_tags(&item.content).replace('\n', " "))
                .collect::<Vec<_>>()
                .join("\n");
            let children = items
                .iter()
                .enumerate()
                .flat_map(|(i, item)| {
                    item.nested
                        .iter()
                        .flat_map(|nested| segment(nested))
                        .map(move |span| MarkupSpan {
                            item: Some(i),
                            ..span
                        })
                })
                .collect();
            (text, children)
        }
        "pre" | "code" => (code_content(el.outer(source)), Vec::new()),
        "blockquote" => {
            let children = segment(inner)
                .into_iter()
                .filter(|s| s.tag != "p")
                .collect();
            (strip_tags(inner), children)
        }
        _ => (strip_tags(inner), Vec::new()),
    };

    MarkupSpan {
        tag: el.name.clone(),
        attrs: el.attrs.clone(),
        markup: el.outer(source).to_string(),
        text,
        children,
        implicit: false,
        item: None,
    }
}
