//! Pairing open and close tags into elements.
//!
//! [`nodes`] walks one level of a markup fragment: every top-level element is
//! matched with its closing tag (depth-counted against tags of the same name)
//! and everything else becomes a text node. Markup that cannot be paired is
//! handled best-effort:
//!
//! - a stray closing tag is ignored;
//! - an open tag with no matching close ends the walk, and the unmatched
//!   trailing content is dropped.

use std::ops::Range;

use crate::lexer::{Token, TokenKind, lex};
use crate::tag::{TagInfo, find_attr, is_void, parse_close_tag, parse_open_tag};

/// A matched element: `range` covers the whole element, `inner` the bytes
/// between its open and close tags (empty for void elements).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub range: Range<usize>,
    pub inner: Range<usize>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        find_attr(&self.attrs, name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn outer<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range.clone()]
    }

    pub fn inner_markup<'a>(&self, source: &'a str) -> &'a str {
        &source[self.inner.clone()]
    }
}

/// One node at the top level of a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data, comments and stray `<`, by byte range.
    Text(Range<usize>),
}

/// Walk the top level of `markup`.
pub fn nodes(markup: &str) -> Vec<Node> {
    let tokens = lex(markup);
    let mut out = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        match token.kind {
            TokenKind::OpenTag => {
                let Some(tag) = parse_open_tag(token.text) else {
                    push_text(&mut out, token.span.clone());
                    i += 1;
                    continue;
                };

                if tag.self_closing || is_void(&tag.name) {
                    out.push(Node::Element(void_element(tag, token)));
                    i += 1;
                    continue;
                }

                match find_close(&tokens, i, &tag.name) {
                    Some(close) => {
                        let close_token = &tokens[close];
                        out.push(Node::Element(Element {
                            name: tag.name,
                            attrs: tag.attrs,
                            range: token.span.start..close_token.span.end,
                            inner: token.span.end..close_token.span.start,
                        }));
                        i = close + 1;
                    }
                    // Unmatched: drop everything from here on
                    None => break,
                }
            }
            TokenKind::CloseTag => {
                i += 1;
            }
            TokenKind::Text | TokenKind::Lt | TokenKind::Comment => {
                push_text(&mut out, token.span.clone());
                i += 1;
            }
        }
    }

    out
}

/// Top-level elements only, in order.
pub fn elements(markup: &str) -> Vec<Element> {
    nodes(markup)
        .into_iter()
        .filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
        .collect()
}

/// First element named `name` anywhere in `markup`, searching depth-first.
pub fn find_first(markup: &str, name: &str) -> Option<(Element, Range<usize>)> {
    find_first_at(markup, name, 0)
}

fn find_first_at(markup: &str, name: &str, base: usize) -> Option<(Element, Range<usize>)> {
    for el in elements(markup) {
        if el.name == name {
            let abs = (el.range.start + base)..(el.range.end + base);
            return Some((shift(el, base), abs));
        }
        let inner = el.inner_markup(markup);
        if let Some(found) = find_first_at(inner, name, base + el.inner.start) {
            return Some(found);
        }
    }
    None
}

fn shift(mut el: Element, by: usize) -> Element {
    el.range = (el.range.start + by)..(el.range.end + by);
    el.inner = (el.inner.start + by)..(el.inner.end + by);
    el
}

fn void_element(tag: TagInfo, token: &Token<'_>) -> Element {
    Element {
        name: tag.name,
        attrs: tag.attrs,
        range: token.span.clone(),
        inner: token.span.end..token.span.end,
    }
}

fn push_text(out: &mut Vec<Node>, span: Range<usize>) {
    if let Some(Node::Text(prev)) = out.last_mut()
        && prev.end == span.start
    {
        prev.end = span.end;
        return;
    }
    out.push(Node::Text(span));
}

/// Index of the token closing the element opened at `open`.
fn find_close(tokens: &[Token<'_>], open: usize, name: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, token) in tokens[open + 1..].iter().enumerate() {
        match token.kind {
            TokenKind::OpenTag => {
                if let Some(tag) = parse_open_tag(token.text)
                    && tag.name == name
                    && !tag.self_closing
                {
                    depth += 1;
                }
            }
            TokenKind::CloseTag => {
                if parse_close_tag(token.text).as_deref() == Some(name) {
                    if depth == 0 {
                        return Some(open + 1 + offset);
                    }
                    depth -= 1;
                }
            }
            _ => {}
        }
    }
    None
}
