//! Markdown to markup conversion.
//!
//! The generic conversion is a black box behind [`MarkdownConverter`]. The
//! passes around it are ours: [`preprocess`] rewrites task items into an
//! intermediate `<task-item>` tag and defuses unterminated fences, and
//! [`postprocess`] reshapes the converter's output into one top-level
//! element per block.

use std::sync::LazyLock;

use blockmark_markup::text::{escape_attr, list_items, strip_tags};
use blockmark_markup::{Node, nodes};
use pulldown_cmark::{Options, Parser, html};
use regex::{Captures, Regex};

use crate::blocks::kinds::list::ListMarker;
use crate::blocks::kinds::{CodeFence, indent_width};
use crate::error::ConvertError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConverterOptions {
    /// Add `id` attributes to headings.
    pub header_ids: bool,
    /// Let the converter render task lists itself.
    pub task_lists: bool,
}

pub trait MarkdownConverter: Send + Sync {
    fn convert_to_markup(&self, markdown: &str, options: &ConverterOptions) -> Result<String, ConvertError>;
}

/// CommonMark plus tables and strikethrough, via pulldown-cmark.
#[derive(Debug, Clone, Copy, Default)]
pub struct PulldownConverter;

impl MarkdownConverter for PulldownConverter {
    fn convert_to_markup(&self, markdown: &str, options: &ConverterOptions) -> Result<String, ConvertError> {
        let mut flags = Options::empty();
        flags.insert(Options::ENABLE_TABLES);
        flags.insert(Options::ENABLE_STRIKETHROUGH);
        if options.task_lists {
            flags.insert(Options::ENABLE_TASKLISTS);
        }

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, Parser::new_ext(markdown, flags));
        Ok(out)
    }
}

static TASK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)[-*+][ \t]+\[([ xX])\](?:[ \t]+(.*))?$").expect("valid regex")
});

static STRIKE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)(?:s|strike)>").expect("valid regex"));

static TASK_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<li>\s*(?:<p>)?<task-item checked="(true|false)">(.*?)</task-item>(?:</p>)?"#)
        .expect("valid regex")
});

/// Rewrite task lines and escape unterminated fences.
///
/// Fenced and indented code pass through untouched. A line indented four or
/// more is indented code only outside a list and after a blank line or
/// more code.
pub fn preprocess(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut prev_blank = true;
    let mut in_list = false;
    let mut in_code = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if line.trim().is_empty() {
            out.push(line.to_string());
            prev_blank = true;
            i += 1;
            continue;
        }

        let indent = indent_width(line);
        if indent >= 4 && !in_list && (prev_blank || in_code) {
            in_code = true;
            prev_blank = false;
            out.push(line.to_string());
            i += 1;
            continue;
        }
        let list_line = indent < 4 && ListMarker::split(line.trim_start()).is_some();
        in_list = list_line || (in_list && (indent > 0 || !prev_blank));
        in_code = false;
        prev_blank = false;

        if indent < 4
            && let Some((fence, _)) = CodeFence::open(line)
        {
            let close = lines[i + 1..]
                .iter()
                .position(|l| CodeFence::closes(fence, l))
                .map(|p| i + 1 + p);
            match close {
                Some(close) => {
                    out.extend(lines[i..=close].iter().map(|l| l.to_string()));
                    i = close + 1;
                }
                None => {
                    log::debug!("Unterminated code fence on line {}", i + 1);
                    out.push(escape_fence(line, fence.kind.char()));
                    i += 1;
                }
            }
            continue;
        }

        match TASK_LINE.captures(line) {
            Some(caps) => {
                let indent = caps.get(1).map_or("", |m| m.as_str());
                let checked = matches!(caps.get(2).map(|m| m.as_str()), Some("x" | "X"));
                let text = caps.get(3).map_or("", |m| m.as_str().trim_end());
                out.push(format!(
                    "{indent}- <task-item checked=\"{checked}\">{text}</task-item>"
                ));
            }
            None => out.push(line.to_string()),
        }
        i += 1;
    }

    out.join("\n")
}

fn escape_fence(line: &str, c: char) -> String {
    let mut out = String::with_capacity(line.len() * 2);
    for ch in line.chars() {
        if ch == c {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Reshape converter output into one top-level block element per line.
pub fn postprocess(markup: &str, options: &ConverterOptions) -> String {
    let markup = STRIKE_TAG.replace_all(markup, "<${1}del>");
    let markup = TASK_ITEM.replace_all(&markup, |caps: &Captures| {
        let checked = &caps[1];
        let checkbox = if checked == "true" {
            "<input type=\"checkbox\" checked />"
        } else {
            "<input type=\"checkbox\" />"
        };
        format!(
            "<li data-task=\"true\" data-checked=\"{checked}\">{checkbox}{}",
            &caps[2]
        )
    });

    let mut blocks = Vec::new();
    for node in nodes(&markup) {
        match node {
            Node::Text(range) => {
                let text = markup[range].trim();
                if !text.is_empty() {
                    blocks.push(text.to_string());
                }
            }
            Node::Element(el) => {
                let outer = el.outer(&markup);
                let inner = el.inner_markup(&markup);
                match el.name.as_str() {
                    "blockquote" => blocks.push(collapse_quote(outer, inner)),
                    "p" => blocks.push(lift_from_paragraph(outer, inner)),
                    "ul" => blocks.extend(unwrap_task_list(outer, inner)),
                    name if options.header_ids && is_heading(name) => {
                        blocks.push(with_heading_id(name, inner))
                    }
                    _ => blocks.push(outer.to_string()),
                }
            }
        }
    }
    blocks.join("\n")
}

/// `<blockquote><p>x</p></blockquote>` becomes `<blockquote>x</blockquote>`.
fn collapse_quote(outer: &str, inner: &str) -> String {
    match sole_element(inner) {
        Some((name, content)) if name == "p" => format!("<blockquote>{content}</blockquote>"),
        _ => outer.to_string(),
    }
}

/// A paragraph holding only inline code or only an image becomes that
/// element.
fn lift_from_paragraph(outer: &str, inner: &str) -> String {
    match sole_element(inner) {
        Some((name, _)) if name == "code" || name == "img" => inner.trim().to_string(),
        _ => outer.to_string(),
    }
}

/// A bulleted list made only of task items becomes the bare items.
fn unwrap_task_list(outer: &str, inner: &str) -> Vec<String> {
    let items = list_items(inner);
    let all_tasks = !items.is_empty()
        && items
            .iter()
            .all(|item| item.attr("data-task").is_some() && item.nested.is_empty());
    if !all_tasks {
        return vec![outer.to_string()];
    }
    items
        .iter()
        .map(|item| {
            let checked = item.attr("data-checked").unwrap_or("false");
            format!(
                "<li data-task=\"true\" data-checked=\"{checked}\">{}</li>",
                item.content.trim()
            )
        })
        .collect()
}

fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn with_heading_id(name: &str, inner: &str) -> String {
    let slug = strip_tags(inner)
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    format!("<{name} id=\"{}\">{inner}</{name}>", escape_attr(&slug))
}

/// The single element in `markup` (ignoring surrounding whitespace), with
/// its inner markup.
fn sole_element(markup: &str) -> Option<(String, &str)> {
    let mut found = None;
    for node in nodes(markup) {
        match node {
            Node::Text(range) if markup[range.clone()].trim().is_empty() => {}
            Node::Element(el) if found.is_none() => {
                found = Some((el.name.clone(), el.inner_markup(markup)));
            }
            _ => return None,
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn convert(markdown: &str) -> String {
        let options = ConverterOptions::default();
        let raw = PulldownConverter
            .convert_to_markup(&preprocess(markdown), &options)
            .unwrap();
        postprocess(&raw, &options)
    }

    #[rstest]
    #[case("- [x] done", "- <task-item checked=\"true\">done</task-item>")]
    #[case("  * [ ] nested", "  - <task-item checked=\"false\">nested</task-item>")]
    #[case("- [ ]", "- <task-item checked=\"false\"></task-item>")]
    #[case("- [y] no", "- [y] no")]
    #[case("[x] bare", "[x] bare")]
    fn rewrites_task_lines(#[case] line: &str, #[case] expected: &str) {
        assert_eq!(preprocess(line), expected);
    }

    #[test]
    fn leaves_task_syntax_inside_fences() {
        let md = "```\n- [x] code\n```";
        assert_eq!(preprocess(md), md);
    }

    #[test]
    fn leaves_task_syntax_inside_indented_code() {
        let md = "intro\n\n    - [x] literal\n\n    - [ ] still code";
        assert_eq!(preprocess(md), md);
    }

    #[test]
    fn indented_tasks_inside_lists_are_rewritten() {
        assert_eq!(
            preprocess("- item\n\n    - [x] nested"),
            "- item\n\n    - <task-item checked=\"true\">nested</task-item>"
        );
    }

    #[test]
    fn escapes_unterminated_fence() {
        assert_eq!(preprocess("```\nno closing"), "\\`\\`\\`\nno closing");
    }

    #[test]
    fn separates_blocks() {
        assert_snapshot!(convert("# Title\n\nSome ~~old~~ text\n\n> quoted\n\n---"), @r"
        <h1>Title</h1>
        <p>Some <del>old</del> text</p>
        <blockquote>quoted</blockquote>
        <hr />
        ");
    }

    #[test]
    fn task_lists_become_items() {
        assert_snapshot!(convert("- [x] done\n- [ ] todo"), @r#"
        <li data-task="true" data-checked="true"><input type="checkbox" checked />done</li>
        <li data-task="true" data-checked="false"><input type="checkbox" />todo</li>
        "#);
    }

    #[test]
    fn mixed_lists_keep_their_wrapper() {
        let markup = convert("- [x] done\n- plain");
        assert!(markup.starts_with("<ul>"));
        assert!(markup.contains("<li data-task=\"true\" data-checked=\"true\">"));
    }

    #[test]
    fn lifts_code_and_images_out_of_paragraphs() {
        assert_eq!(convert("`just code`"), "<code>just code</code>");
        assert_eq!(convert("![a](b.png)"), "<img src=\"b.png\" alt=\"a\" />");
    }

    #[test]
    fn strike_tags_normalise() {
        assert_eq!(
            postprocess("<p><s>a</s> <strike>b</strike></p>", &ConverterOptions::default()),
            "<p><del>a</del> <del>b</del></p>"
        );
    }

    #[test]
    fn heading_ids_on_request() {
        let options = ConverterOptions {
            header_ids: true,
            ..ConverterOptions::default()
        };
        assert_eq!(
            postprocess("<h2>Hello, World</h2>\n", &options),
            "<h2 id=\"hello-world\">Hello, World</h2>"
        );
    }

    #[test]
    fn fenced_code_passes_through() {
        assert_eq!(
            convert("```js\nconsole.log(1)\n```"),
            "<pre><code class=\"language-js\">console.log(1)\n</code></pre>"
        );
    }
}
