//! Inline formatting in both directions.
//!
//! Text-bearing blocks store their content as inline markdown (`**bold**`,
//! `*em*`, `` `code` ``, `~~del~~`, `[text](href)`) so formatting survives a
//! trip through markup. Line breaks inside content are plain `\n`.

use blockmark_markup::text::{decode_entities, escape_text, raw_text};
use blockmark_markup::{Node, nodes};
use pulldown_cmark::{Options, Parser, html};

/// Convert inline markup to inline markdown.
///
/// Unknown elements contribute their inner content. Block boundaries inside
/// the fragment (`<p>`, `<br>`) become line breaks; blank lines are dropped.
pub fn markup_to_inline_markdown(markup: &str) -> String {
    let mut out = String::new();
    write_inline(markup, &mut out);
    tidy_lines(&out)
}

fn write_inline(markup: &str, out: &mut String) {
    for node in nodes(markup) {
        match node {
            Node::Text(range) => out.push_str(&decode_entities(&markup[range])),
            Node::Element(el) => {
                let inner = el.inner_markup(markup);
                match el.name.as_str() {
                    "strong" | "b" => wrap(inner, "**", out),
                    "em" | "i" => wrap(inner, "*", out),
                    "del" | "s" | "strike" => wrap(inner, "~~", out),
                    "code" => {
                        let code = raw_text(inner);
                        let fence = if code.contains('`') { "``" } else { "`" };
                        out.push_str(fence);
                        out.push_str(&code);
                        out.push_str(fence);
                    }
                    "a" => {
                        out.push('[');
                        write_inline(inner, out);
                        out.push_str("](");
                        out.push_str(el.attr("href").unwrap_or_default());
                        out.push(')');
                    }
                    "img" => {
                        out.push_str("![");
                        out.push_str(el.attr("alt").unwrap_or_default());
                        out.push_str("](");
                        out.push_str(el.attr("src").unwrap_or_default());
                        out.push(')');
                    }
                    "br" => out.push('\n'),
                    "input" => {}
                    "p" | "div" | "li" => {
                        write_inline(inner, out);
                        out.push('\n');
                    }
                    _ => write_inline(inner, out),
                }
            }
        }
    }
}

fn wrap(inner: &str, marker: &str, out: &mut String) {
    out.push_str(marker);
    write_inline(inner, out);
    out.push_str(marker);
}

fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render inline markdown to inline markup.
///
/// Content that markdown would read as a block construct (`# x`, `1. x`)
/// is escaped literally instead.
pub fn inline_markdown_to_markup(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let lines: Vec<String> = text
        .split('\n')
        .map(|line| render_line(line, options))
        .collect();
    lines.join("<br />\n")
}

fn render_line(line: &str, options: Options) -> String {
    if line.trim().is_empty() {
        return escape_text(line);
    }
    let mut rendered = String::new();
    html::push_html(&mut rendered, Parser::new_ext(line, options));
    let rendered = rendered.trim_end();

    match rendered
        .strip_prefix("<p>")
        .and_then(|r| r.strip_suffix("</p>"))
    {
        Some(inner) if !inner.contains("<p>") => inner.to_string(),
        _ => escape_text(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("plain", "plain")]
    #[case("a <strong>b</strong> <em>c</em>", "a **b** *c*")]
    #[case("<code>x &lt; y</code>", "`x < y`")]
    #[case("<del>gone</del>", "~~gone~~")]
    #[case("<a href=\"https://e.com\">link</a>", "[link](https://e.com)")]
    #[case("one<br />\ntwo", "one\ntwo")]
    #[case("<p>one</p>\n<p>two</p>", "one\ntwo")]
    #[case("<input type=\"checkbox\" checked />done", "done")]
    #[case("  padded  ", "padded")]
    fn markup_to_markdown(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(markup_to_inline_markdown(input), expected);
    }

    #[rstest]
    #[case("", "")]
    #[case("plain", "plain")]
    #[case("a **b**", "a <strong>b</strong>")]
    #[case("~~x~~", "<del>x</del>")]
    #[case("1 < 2", "1 &lt; 2")]
    #[case("one\ntwo", "one<br />\ntwo")]
    #[case("# not a heading", "# not a heading")]
    #[case("1. not a list", "1. not a list")]
    fn markdown_to_markup(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(inline_markdown_to_markup(input), expected);
    }

    #[rstest]
    #[case("Hello **world** and `code`")]
    #[case("a [link](https://example.com) here")]
    #[case("first line\nsecond *line*")]
    fn inline_round_trip(#[case] text: &str) {
        assert_eq!(
            markup_to_inline_markdown(&inline_markdown_to_markup(text)),
            text
        );
    }
}
