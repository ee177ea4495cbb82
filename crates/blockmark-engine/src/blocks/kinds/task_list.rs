use blockmark_markup::MarkupSpan;

use crate::blocks::kinds::list::{ListMarker, Marker, task_prefix};
use crate::blocks::kinds::{single_line, span_inner};
use crate::blocks::{BlockVariant, Capabilities, SerializeOptions, Trigger, VariantDescriptor};
use crate::editing::commands::Cmd;
use crate::editing::keys::{Key, KeyEvent};
use crate::error::TransformError;
use crate::models::{Block, BlockKind, VariantTag};
use crate::parsing::inline::{inline_markdown_to_markup, markup_to_inline_markdown};

static DESCRIPTOR: VariantDescriptor = VariantDescriptor {
    tag: VariantTag::TaskList,
    name: "Task",
    capabilities: Capabilities::TEXT.union(Capabilities::LIST),
    triggers: &[
        Trigger::immediate("- [ ] "),
        Trigger::immediate("- [x] "),
        Trigger::immediate("[ ] "),
        Trigger::immediate("[x] "),
        Trigger::immediate("[] "),
    ],
    priority: 30,
};

/// One checkbox item per block.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskListVariant;

impl TaskListVariant {
    /// Build a task block directly from a checkbox state.
    pub fn task(content: impl Into<String>, checked: bool) -> Block {
        Block::new(BlockKind::TaskList, content).with_checked(checked)
    }
}

impl BlockVariant for TaskListVariant {
    fn descriptor(&self) -> &VariantDescriptor {
        &DESCRIPTOR
    }

    fn serialize_to_markdown(&self, block: &Block, options: &SerializeOptions) -> String {
        let mark = if block.checked { 'x' } else { ' ' };
        format!("{} [{mark}] {}", options.bullet, single_line(&block.content))
            .trim_end()
            .to_string()
    }

    fn serialize_to_markup(&self, block: &Block) -> String {
        let checkbox = if block.checked {
            "<input type=\"checkbox\" checked />"
        } else {
            "<input type=\"checkbox\" />"
        };
        format!(
            "<li data-task=\"true\" data-checked=\"{}\">{checkbox}{}</li>",
            block.checked,
            inline_markdown_to_markup(&single_line(&block.content))
        )
    }

    fn can_parse_markup(&self, span: &MarkupSpan) -> bool {
        span.is_task_item()
    }

    fn parse_from_markup(&self, span: &MarkupSpan) -> Option<Block> {
        if !self.can_parse_markup(span) {
            return None;
        }
        let checked = span.attr("data-checked") == Some("true");
        let content = single_line(&markup_to_inline_markdown(span_inner(span)));
        Some(Self::task(content, checked))
    }

    fn can_parse_markdown(&self, text: &str) -> bool {
        parse_task_line(text).is_some()
    }

    fn parse_from_markdown(&self, text: &str) -> Option<Block> {
        let (content, checked) = parse_task_line(text)?;
        Some(Self::task(content, checked))
    }

    fn apply_trigger(&self, block: &mut Block, typed: &str) -> Result<(), TransformError> {
        self.apply_transformation(block, "")?;
        block.checked = typed.contains("[x]") || typed.contains("[X]");
        Ok(())
    }

    fn handle_enter_key(&self, block: &Block, event: &KeyEvent, _caret: usize) -> Option<Cmd> {
        if event.key == Key::Enter && event.ctrl {
            return Some(Cmd::ToggleChecked { block: block.id });
        }
        None
    }

    fn apply_transformation(&self, block: &mut Block, seed: &str) -> Result<(), TransformError> {
        let was_task = block.kind == BlockKind::TaskList;
        block.kind = BlockKind::TaskList;
        if !was_task {
            block.checked = false;
        }
        block.set_content(single_line(seed));
        Ok(())
    }
}

/// `- [x] text` on a single line.
fn parse_task_line(text: &str) -> Option<(String, bool)> {
    let line = text.trim();
    if line.contains('\n') {
        return None;
    }
    let (Marker::Bullet(_), item) = ListMarker::split(line)? else {
        return None;
    };
    let checked = task_prefix(item)?;
    Some((item[3..].trim().to_string(), checked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockmark_markup::segment;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("- [x] done", Some(("done", true)))]
    #[case("- [ ] todo", Some(("todo", false)))]
    #[case("* [X] shout", Some(("shout", true)))]
    #[case("- [ ]", Some(("", false)))]
    #[case("1. [ ] numbered", None)]
    #[case("- plain", None)]
    #[case("- [ ] a\n- [ ] b", None)]
    fn parses_task_lines(#[case] text: &str, #[case] expected: Option<(&str, bool)>) {
        assert_eq!(
            parse_task_line(text),
            expected.map(|(c, k)| (c.to_string(), k))
        );
    }

    #[rstest]
    #[case(TaskListVariant::task("ship it", true))]
    #[case(TaskListVariant::task("later", false))]
    #[case(TaskListVariant::task("", false))]
    fn markdown_round_trip(#[case] block: Block) {
        let md = TaskListVariant.serialize_to_markdown(&block, &SerializeOptions::default());
        assert_eq!(TaskListVariant.parse_from_markdown(&md), Some(block));
    }

    #[test]
    fn markup_round_trip() {
        let block = TaskListVariant::task("with **bold**", true);
        let markup = TaskListVariant.serialize_to_markup(&block);
        assert_eq!(
            markup,
            "<li data-task=\"true\" data-checked=\"true\"><input type=\"checkbox\" checked />with <strong>bold</strong></li>"
        );
        let span = segment(&markup).remove(0);
        assert_eq!(TaskListVariant.parse_from_markup(&span), Some(block));
    }

    #[rstest]
    #[case("[x] ", true)]
    #[case("- [ ] ", false)]
    #[case("[] ", false)]
    fn trigger_sets_checked(#[case] typed: &str, #[case] checked: bool) {
        let mut block = Block::paragraph("");
        TaskListVariant.apply_trigger(&mut block, typed).unwrap();
        assert_eq!(block, TaskListVariant::task("", checked));
    }

    #[test]
    fn ctrl_enter_toggles() {
        let block = TaskListVariant::task("x", false);
        assert_eq!(
            TaskListVariant.handle_enter_key(&block, &KeyEvent::enter().with_ctrl(), 1),
            Some(Cmd::ToggleChecked { block: block.id })
        );
        assert_eq!(
            TaskListVariant.handle_enter_key(&block, &KeyEvent::enter(), 1),
            None
        );
    }
}
