//! Unordered and ordered lists.
//!
//! Content holds one item per line. Nested lists are child blocks; each
//! child's `item` names the line it hangs under, with `None` standing for
//! the last one.

use blockmark_markup::MarkupSpan;
use blockmark_markup::text::list_items;

use crate::blocks::kinds::{indent_width, single_line, span_inner};
use crate::blocks::{
    BlockVariant, Capabilities, SerializeOptions, Trigger, VariantDescriptor, insert_at,
};
use crate::editing::commands::Cmd;
use crate::editing::keys::{Key, KeyEvent};
use crate::error::TransformError;
use crate::models::{Block, BlockKind, VariantTag};
use crate::parsing::inline::{inline_markdown_to_markup, markup_to_inline_markdown};

static UNORDERED: VariantDescriptor = VariantDescriptor {
    tag: VariantTag::UnorderedList,
    name: "Bulleted list",
    capabilities: Capabilities::TEXT
        .union(Capabilities::MULTILINE)
        .union(Capabilities::LIST)
        .union(Capabilities::CHILDREN),
    triggers: &[
        Trigger::immediate("- "),
        Trigger::immediate("* "),
        Trigger::immediate("+ "),
    ],
    priority: 40,
};

static ORDERED: VariantDescriptor = VariantDescriptor {
    tag: VariantTag::OrderedList,
    name: "Numbered list",
    capabilities: Capabilities::TEXT
        .union(Capabilities::MULTILINE)
        .union(Capabilities::LIST)
        .union(Capabilities::CHILDREN),
    triggers: &[Trigger::immediate("1. "), Trigger::immediate("1) ")],
    priority: 50,
};

/// Item text that turns a single-item bulleted list into a task.
pub const TASK_PREFIXES: &[&str] = &["[ ] ", "[x] ", "[X] ", "[] "];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Bullet(char),
    Number(u64),
}

/// Owns list-marker syntax.
pub struct ListMarker;

impl ListMarker {
    pub const BULLETS: [char; 3] = ['-', '*', '+'];

    /// Split an unindented list line into marker and item text.
    pub fn split(line: &str) -> Option<(Marker, &str)> {
        let (marker, rest) = if let Some(c) = line.chars().next()
            && Self::BULLETS.contains(&c)
        {
            (Marker::Bullet(c), &line[1..])
        } else {
            let digits = line.chars().take_while(char::is_ascii_digit).count();
            if digits == 0 || digits > 9 {
                return None;
            }
            let rest = &line[digits..];
            let rest = rest.strip_prefix(['.', ')'])?;
            let n = line[..digits].parse().ok()?;
            (Marker::Number(n), rest)
        };

        if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
            return None;
        }
        Some((marker, rest.trim()))
    }
}

pub struct ListVariant {
    ordered: bool,
}

impl ListVariant {
    pub fn unordered() -> Self {
        Self { ordered: false }
    }

    pub fn ordered() -> Self {
        Self { ordered: true }
    }
}

impl BlockVariant for ListVariant {
    fn descriptor(&self) -> &VariantDescriptor {
        if self.ordered { &ORDERED } else { &UNORDERED }
    }

    fn serialize_to_markdown(&self, block: &Block, options: &SerializeOptions) -> String {
        list_markdown(block, options)
    }

    fn serialize_to_markup(&self, block: &Block) -> String {
        list_markup(block)
    }

    fn can_parse_markup(&self, span: &MarkupSpan) -> bool {
        span.tag == if self.ordered { "ol" } else { "ul" }
    }

    fn parse_from_markup(&self, span: &MarkupSpan) -> Option<Block> {
        if !self.can_parse_markup(span) {
            return None;
        }
        let items: Vec<String> = list_items(span_inner(span))
            .iter()
            .map(|item| {
                let text = single_line(&markup_to_inline_markdown(&item.content));
                match item.attr("data-task") {
                    Some(_) if item.attr("data-checked") == Some("true") => format!("[x] {text}"),
                    Some(_) => format!("[ ] {text}"),
                    None => text,
                }
            })
            .collect();

        let kind = if self.ordered {
            let start = span.attr("start").and_then(|s| s.parse().ok()).unwrap_or(1);
            BlockKind::OrderedList { start }
        } else {
            BlockKind::UnorderedList
        };
        Some(Block::new(kind, items.join("\n")))
    }

    fn can_parse_markdown(&self, text: &str) -> bool {
        parse_list_markdown(text).is_some_and(|b| b.tag() == self.tag())
    }

    fn parse_from_markdown(&self, text: &str) -> Option<Block> {
        parse_list_markdown(text).filter(|b| b.tag() == self.tag())
    }

    fn handle_key_press(&self, block: &Block, event: &KeyEvent, caret: usize) -> Option<Cmd> {
        let Key::Char(c) = event.key else {
            return None;
        };
        if self.ordered || !event.is_plain() || block.content.contains('\n') {
            return None;
        }
        let after = insert_at(&block.content, caret, &c.to_string());
        if TASK_PREFIXES.contains(&after.as_str()) {
            log::debug!("Bulleted list item became a task prefix: {after:?}");
            return Some(Cmd::Convert {
                block: block.id,
                to: VariantTag::TaskList,
                typed: Some(after),
            });
        }
        None
    }

    fn handle_enter_key(&self, block: &Block, event: &KeyEvent, caret: usize) -> Option<Cmd> {
        if event.key == Key::Enter && event.is_plain() && caret < block.content.len() {
            return Some(Cmd::SplitListItem {
                block: block.id,
                at: caret,
            });
        }
        None
    }

    fn apply_transformation(&self, block: &mut Block, seed: &str) -> Result<(), TransformError> {
        block.kind = if self.ordered {
            let start = match block.kind {
                BlockKind::OrderedList { start } => start,
                _ => 1,
            };
            BlockKind::OrderedList { start }
        } else {
            BlockKind::UnorderedList
        };
        block.checked = false;
        block.set_content(seed);
        Ok(())
    }
}

/// Parse a markdown list, including nested lists, into one block.
///
/// A bulleted list whose items are all tasks is not a list here: each task
/// is its own block.
pub(crate) fn parse_list_markdown(text: &str) -> Option<Block> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let first = *lines.first()?;
    let base = indent_width(first);
    let (first_marker, _) = ListMarker::split(first.trim_start())?;
    let ordered = matches!(first_marker, Marker::Number(_));

    let mut items: Vec<String> = Vec::new();
    let mut children = Vec::new();
    let mut nested: Vec<&str> = Vec::new();

    for line in lines {
        let indent = indent_width(line);
        if indent > base {
            nested.push(line);
            continue;
        }
        flush_nested(&mut nested, &mut items, &mut children);

        match ListMarker::split(line.trim_start()) {
            Some((marker, item)) if matches!(marker, Marker::Number(_)) == ordered => {
                items.push(item.to_string());
            }
            // A different list type starts a second list
            Some(_) => return None,
            // Lazy continuation of the previous item
            None => {
                let last = items.last_mut()?;
                last.push(' ');
                last.push_str(line.trim());
            }
        }
    }
    flush_nested(&mut nested, &mut items, &mut children);

    if !ordered && items.iter().all(|item| task_prefix(item).is_some()) {
        return None;
    }

    let kind = match first_marker {
        Marker::Number(start) => BlockKind::OrderedList { start },
        Marker::Bullet(_) => BlockKind::UnorderedList,
    };
    let mut block = Block::new(kind, items.join("\n")).with_children(children);
    settle_anchors(&mut block);
    Some(block)
}

fn flush_nested(nested: &mut Vec<&str>, items: &mut [String], children: &mut Vec<Block>) {
    if nested.is_empty() {
        return;
    }
    let min = nested.iter().map(|l| indent_width(l)).min().unwrap_or(0);
    let chunk = nested
        .drain(..)
        .map(|l| dedent(l, min))
        .collect::<Vec<_>>()
        .join("\n");

    match parse_list_markdown(&chunk) {
        Some(mut child) => {
            child.item = items.len().checked_sub(1);
            children.push(child);
        }
        None => {
            if let Some(last) = items.last_mut() {
                last.push(' ');
                last.push_str(&single_line(&chunk));
            }
        }
    }
}

fn dedent(line: &str, width: usize) -> &str {
    let spaces = line.chars().take(width).take_while(|&c| c == ' ').count();
    if spaces == width {
        &line[spaces..]
    } else {
        line.trim_start()
    }
}

/// `Some(checked)` if the item text starts with a task checkbox.
pub(crate) fn task_prefix(item: &str) -> Option<bool> {
    let rest = item.strip_prefix('[')?;
    let (mark, rest) = rest.split_at_checked(1)?;
    if !rest.starts_with(']') {
        return None;
    }
    match mark {
        " " => Some(false),
        "x" | "X" => Some(true),
        _ => None,
    }
}

pub(crate) fn items(content: &str) -> impl Iterator<Item = &str> {
    content.split('\n')
}

/// Index of the item `child` hangs under, clamped to the items `block` has.
pub(crate) fn anchored_to(block: &Block, child: &Block) -> usize {
    let last = items(&block.content).count().saturating_sub(1);
    child.item.map_or(last, |i| i.min(last))
}

/// Children under the last item carry `None`.
pub(crate) fn settle_anchors(block: &mut Block) {
    let last = items(&block.content).count().saturating_sub(1);
    for child in &mut block.children {
        if child.item.is_some_and(|i| i >= last) {
            child.item = None;
        }
    }
}

/// Item `split` was broken in two: children of later items move down one.
pub(crate) fn shift_anchors(block: &mut Block, split: usize) {
    for child in &mut block.children {
        if let Some(i) = child.item.as_mut()
            && *i > split
        {
            *i += 1;
        }
    }
    settle_anchors(block);
}

pub(crate) fn list_markdown(block: &Block, options: &SerializeOptions) -> String {
    let mut lines = Vec::new();
    write_markdown(block, options, 0, &mut lines);
    lines.join("\n")
}

fn write_markdown(block: &Block, options: &SerializeOptions, indent: usize, lines: &mut Vec<String>) {
    let pad = " ".repeat(indent);

    match &block.kind {
        BlockKind::UnorderedList => {
            let child_indent = indent + options.indent.max(2);
            for (i, item) in items(&block.content).enumerate() {
                lines.push(format!("{pad}{} {item}", options.bullet).trim_end().to_string());
                write_item_children(block, i, options, child_indent, lines);
            }
            return;
        }
        BlockKind::OrderedList { start } => {
            for (i, item) in items(&block.content).enumerate() {
                let marker = format!("{}.", start + i as u64);
                let child_indent = indent + options.indent.max(marker.len() + 1);
                lines.push(format!("{pad}{marker} {item}").trim_end().to_string());
                write_item_children(block, i, options, child_indent, lines);
            }
            return;
        }
        BlockKind::TaskList => {
            let mark = if block.checked { 'x' } else { ' ' };
            lines.push(
                format!("{pad}{} [{mark}] {}", options.bullet, single_line(&block.content))
                    .trim_end()
                    .to_string(),
            );
        }
        _ => {
            for line in block.content.lines() {
                lines.push(format!("{pad}{line}"));
            }
        }
    }

    let child_indent = indent + options.indent.max(2);
    for child in &block.children {
        write_markdown(child, options, child_indent, lines);
    }
}

fn write_item_children(
    block: &Block,
    item: usize,
    options: &SerializeOptions,
    indent: usize,
    lines: &mut Vec<String>,
) {
    for child in block.children.iter().filter(|c| anchored_to(block, c) == item) {
        write_markdown(child, options, indent, lines);
    }
}

pub(crate) fn list_markup(block: &Block) -> String {
    let (open, close) = match &block.kind {
        BlockKind::OrderedList { start } if *start != 1 => (format!("<ol start=\"{start}\">"), "</ol>"),
        BlockKind::OrderedList { .. } => ("<ol>".to_string(), "</ol>"),
        _ => ("<ul>".to_string(), "</ul>"),
    };

    let all: Vec<&str> = items(&block.content).collect();
    let mut out = open;
    out.push('\n');
    for (i, item) in all.iter().enumerate() {
        out.push_str("<li>");
        out.push_str(&inline_markdown_to_markup(item));
        let mut nested = block
            .children
            .iter()
            .filter(|c| anchored_to(block, c) == i)
            .peekable();
        if nested.peek().is_some() {
            out.push('\n');
            for child in nested {
                out.push_str(&child_markup(child));
                out.push('\n');
            }
        }
        out.push_str("</li>\n");
    }
    out.push_str(close);
    out
}

fn child_markup(child: &Block) -> String {
    match child.kind {
        BlockKind::UnorderedList | BlockKind::OrderedList { .. } => list_markup(child),
        _ => format!("<p>{}</p>", inline_markdown_to_markup(&child.content)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockmark_markup::segment;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn ul(content: &str) -> Block {
        Block::new(BlockKind::UnorderedList, content)
    }

    #[rstest]
    #[case("- item", Some((Marker::Bullet('-'), "item")))]
    #[case("*", Some((Marker::Bullet('*'), "")))]
    #[case("12. twelve", Some((Marker::Number(12), "twelve")))]
    #[case("3) paren", Some((Marker::Number(3), "paren")))]
    #[case("-nospace", None)]
    #[case("1.5 ratio", None)]
    #[case("text", None)]
    fn splits_markers(#[case] line: &str, #[case] expected: Option<(Marker, &str)>) {
        assert_eq!(ListMarker::split(line), expected);
    }

    #[test]
    fn parses_flat_bullets() {
        let block = parse_list_markdown("- a\n- b\n- c").unwrap();
        assert_eq!(block, ul("a\nb\nc"));
    }

    #[test]
    fn parses_ordered_start() {
        let block = parse_list_markdown("3. c\n4. d").unwrap();
        assert_eq!(block.kind, BlockKind::OrderedList { start: 3 });
        assert_eq!(block.content, "c\nd");
    }

    #[test]
    fn parses_nested_lists_as_children() {
        let block = parse_list_markdown("- a\n- b\n  1. x\n  2. y\n- c").unwrap();
        assert_eq!(block.content, "a\nb\nc");
        assert_eq!(
            block.children,
            vec![Block::new(BlockKind::OrderedList { start: 1 }, "x\ny").with_item(1)]
        );
    }

    #[test]
    fn nested_list_under_last_item_has_no_anchor() {
        let block = parse_list_markdown("- a\n- b\n  - x").unwrap();
        assert_eq!(block.children, vec![ul("x")]);
    }

    #[test]
    fn lazy_continuation_joins_item() {
        let block = parse_list_markdown("- first\nstill first\n- second").unwrap();
        assert_eq!(block.content, "first still first\nsecond");
    }

    #[test]
    fn all_task_bullets_are_not_a_list() {
        assert_eq!(parse_list_markdown("- [ ] a\n- [x] b"), None);
        let mixed = parse_list_markdown("- [ ] a\n- plain").unwrap();
        assert_eq!(mixed.content, "[ ] a\nplain");
    }

    #[test]
    fn mixed_list_types_are_rejected() {
        assert_eq!(parse_list_markdown("- a\n1. b"), None);
    }

    #[rstest]
    #[case(ul("a\nb"))]
    #[case(ul("a\nb\n"))]
    #[case(ul(""))]
    #[case(Block::new(BlockKind::OrderedList { start: 7 }, "seven\neight"))]
    #[case(ul("outer\nlast").with_children(vec![ul("inner")]))]
    #[case(Block::new(BlockKind::OrderedList { start: 1 }, "one").with_children(vec![ul("sub")]))]
    #[case(ul("a\nb").with_children(vec![ul("x").with_item(0)]))]
    #[case(ul("a\nb\nc").with_children(vec![ul("x").with_item(0), ul("y").with_item(1), ul("z")]))]
    fn markdown_round_trip(#[case] block: Block) {
        let variant = if matches!(block.kind, BlockKind::OrderedList { .. }) {
            ListVariant::ordered()
        } else {
            ListVariant::unordered()
        };
        let md = variant.serialize_to_markdown(&block, &SerializeOptions::default());
        assert_eq!(variant.parse_from_markdown(&md), Some(block), "markdown was {md:?}");
    }

    #[test]
    fn serializes_with_configured_bullet() {
        let options = SerializeOptions {
            bullet: '*',
            indent: 4,
        };
        let block = ul("a").with_children(vec![ul("b")]);
        assert_eq!(list_markdown(&block, &options), "* a\n    * b");
    }

    #[test]
    fn markup_nests_children_in_last_item() {
        let block = ul("a\nb").with_children(vec![ul("c")]);
        assert_eq!(
            list_markup(&block),
            "<ul>\n<li>a</li>\n<li>b\n<ul>\n<li>c</li>\n</ul>\n</li>\n</ul>"
        );
    }

    #[test]
    fn nested_list_stays_under_its_item() {
        let block = parse_list_markdown("- a\n  - x\n- b").unwrap();
        assert_eq!(
            list_markdown(&block, &SerializeOptions::default()),
            "- a\n  - x\n- b"
        );
        assert_eq!(
            list_markup(&block),
            "<ul>\n<li>a\n<ul>\n<li>x</li>\n</ul>\n</li>\n<li>b</li>\n</ul>"
        );
    }

    #[test]
    fn anchors_past_the_end_fall_back_to_last_item() {
        let block = ul("a\nb").with_children(vec![ul("x").with_item(7)]);
        assert_eq!(anchored_to(&block, &block.children[0]), 1);
    }

    #[test]
    fn splitting_an_item_moves_later_anchors() {
        let mut block = ul("a\nb\nc").with_children(vec![ul("x").with_item(0), ul("y").with_item(1)]);
        block.content = "a\na2\nb\nc".to_string();
        shift_anchors(&mut block, 0);
        let owners: Vec<Option<usize>> = block.children.iter().map(|c| c.item).collect();
        assert_eq!(owners, vec![Some(0), Some(2)]);
    }

    #[test]
    fn parses_markup_items_and_start() {
        let span = segment("<ol start=\"4\">\n<li>d</li>\n<li><strong>e</strong></li>\n</ol>").remove(0);
        let block = ListVariant::ordered().parse_from_markup(&span).unwrap();
        assert_eq!(block.kind, BlockKind::OrderedList { start: 4 });
        assert_eq!(block.content, "d\n**e**");
        assert!(ListVariant::unordered().parse_from_markup(&span).is_none());
    }

    #[test]
    fn task_items_inside_mixed_markup_list_keep_their_box() {
        let span = segment(
            "<ul><li data-task=\"true\" data-checked=\"true\">done</li><li>plain</li></ul>",
        )
        .remove(0);
        let block = ListVariant::unordered().parse_from_markup(&span).unwrap();
        assert_eq!(block.content, "[x] done\nplain");
    }

    #[test]
    fn enter_inside_list_splits_item() {
        let block = ul("ab\ncd");
        let cmd = ListVariant::unordered().handle_enter_key(&block, &KeyEvent::enter(), 1);
        assert_eq!(cmd, Some(Cmd::SplitListItem { block: block.id, at: 1 }));
        assert_eq!(
            ListVariant::unordered().handle_enter_key(&block, &KeyEvent::enter(), 5),
            None
        );
    }

    #[rstest]
    #[case("[ ]", 3)]
    #[case("[x]", 3)]
    #[case("[]", 2)]
    fn single_item_becomes_task(#[case] content: &str, #[case] caret: usize) {
        let block = ul(content);
        let cmd = ListVariant::unordered().handle_key_press(&block, &KeyEvent::char(' '), caret);
        assert_eq!(
            cmd,
            Some(Cmd::Convert {
                block: block.id,
                to: VariantTag::TaskList,
                typed: Some(format!("{content} ")),
            })
        );
    }

    #[test]
    fn task_prefix_needs_single_item() {
        let block = ul("a
[ ]");
        let cmd = ListVariant::unordered().handle_key_press(&block, &KeyEvent::char(' '), 5);
        assert_eq!(cmd, None);
        let partial = ListVariant::unordered().handle_key_press(&ul("[x"), &KeyEvent::char(']'), 2);
        assert_eq!(partial, None);
    }

    #[test]
    fn task_prefix_detection() {
        assert_eq!(task_prefix("[ ] a"), Some(false));
        assert_eq!(task_prefix("[X] a"), Some(true));
        assert_eq!(task_prefix("[y] a"), None);
        assert_eq!(task_prefix("a"), None);
    }
}
