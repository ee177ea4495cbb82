//! Key events and the trigger state machine.
//!
//! [`KeyStateMachine::classify`] maps one key press in a focused block to a
//! [`KeyAction`]: let the surface insert the key, swallow it, or apply a
//! [`Cmd`]. Variant handlers get the first say; the machine falls back to
//! trigger detection and the default Enter and Backspace rules.

use std::sync::Arc;

use crate::blocks::{BlockVariant, TriggerCommit, VariantRegistry, clamp_caret, insert_at};
use crate::editing::commands::Cmd;
use crate::editing::key_buffer::KeyBuffer;
use crate::models::{Block, BlockId, Document, VariantTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            ctrl: false,
            alt: false,
            meta: false,
        }
    }

    pub fn char(c: char) -> Self {
        Self::new(Key::Char(c))
    }

    pub fn enter() -> Self {
        Self::new(Key::Enter)
    }

    pub fn backspace() -> Self {
        Self::new(Key::Backspace)
    }

    pub fn tab() -> Self {
        Self::new(Key::Tab)
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// No modifiers other than Shift.
    pub fn is_plain(&self) -> bool {
        !self.ctrl && !self.alt && !self.meta
    }
}

/// Caret position: a block and a byte offset into its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    pub block: BlockId,
    pub caret: usize,
}

impl Focus {
    pub fn new(block: BlockId, caret: usize) -> Self {
        Self { block, caret }
    }

    pub fn start(block: BlockId) -> Self {
        Self::new(block, 0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TriggerState {
    #[default]
    Idle,
    /// The focused paragraph spells the start of a trigger.
    BufferingTrigger,
    /// A conversion command has been issued and not yet settled.
    Converting,
}

/// What the surface should do with a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Not ours; perform the default for the key.
    Pass,
    /// Swallow the key.
    Consume,
    /// Apply `cmd`; if it fails, apply `fallback` instead.
    Apply { cmd: Cmd, fallback: Option<Cmd> },
}

impl KeyAction {
    fn apply(cmd: Cmd) -> Self {
        KeyAction::Apply { cmd, fallback: None }
    }
}

pub struct KeyStateMachine {
    registry: Arc<VariantRegistry>,
    buffer: KeyBuffer,
    state: TriggerState,
    focused: Option<BlockId>,
}

impl KeyStateMachine {
    pub fn new(registry: Arc<VariantRegistry>, capacity: usize) -> Self {
        Self {
            registry,
            buffer: KeyBuffer::new(capacity),
            state: TriggerState::Idle,
            focused: None,
        }
    }

    /// Buffer sized to hold the longest trigger.
    pub fn with_default_capacity(registry: Arc<VariantRegistry>) -> Self {
        let capacity = registry.longest_trigger_len().max(4);
        Self::new(registry, capacity)
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn buffer(&self) -> &KeyBuffer {
        &self.buffer
    }

    /// Moving the caret to another block forgets what was typed.
    pub fn focus_changed(&mut self, block: Option<BlockId>) {
        if self.focused != block {
            self.buffer.clear();
            self.state = TriggerState::Idle;
            self.focused = block;
        }
    }

    /// Back to idle once the surface has applied the action.
    pub fn settle(&mut self) {
        if self.state == TriggerState::Converting {
            self.state = TriggerState::Idle;
        }
    }

    pub fn classify(&mut self, document: &Document, focus: &Focus, event: &KeyEvent) -> KeyAction {
        self.focus_changed(Some(focus.block));
        let Some(block) = document.get(focus.block) else {
            log::warn!("Key event for unknown block {}", focus.block);
            return KeyAction::Pass;
        };
        let caret = clamp_caret(&block.content, focus.caret);
        let registry = Arc::clone(&self.registry);
        let variant = registry.variant_for(block);

        match event.key {
            Key::Char(c) if !event.ctrl && !event.meta => self.on_char(block, variant, event, c, caret),
            Key::Enter => {
                let action = self.on_enter(block, variant, event, caret);
                self.buffer.clear();
                action
            }
            Key::Backspace => self.on_backspace(document, block, variant, event, caret),
            Key::Tab => match variant.handle_key_press(block, event, caret) {
                Some(cmd) => KeyAction::apply(cmd),
                None => KeyAction::Pass,
            },
            Key::Escape => {
                self.buffer.clear();
                self.state = TriggerState::Idle;
                KeyAction::Pass
            }
            _ => KeyAction::Pass,
        }
    }

    fn on_char(
        &mut self,
        block: &Block,
        variant: &dyn BlockVariant,
        event: &KeyEvent,
        c: char,
        caret: usize,
    ) -> KeyAction {
        let insert = Cmd::InsertText {
            block: block.id,
            at: caret,
            text: c.to_string(),
        };

        if let Some(cmd) = variant.handle_key_press(block, event, caret) {
            let fallback = matches!(cmd, Cmd::Convert { .. }).then(|| insert.clone());
            self.consumed_trigger(&cmd);
            return KeyAction::Apply { cmd, fallback };
        }

        self.buffer.push(c);
        if block.tag() != VariantTag::Paragraph {
            return KeyAction::apply(insert);
        }

        let after = insert_at(&block.content, caret, &c.to_string());
        if let Some(found) = self.registry.match_trigger(&after, TriggerCommit::Immediate) {
            let cmd = Cmd::Convert {
                block: block.id,
                to: found.tag,
                typed: Some(found.text),
            };
            self.consumed_trigger(&cmd);
            return KeyAction::Apply {
                cmd,
                fallback: Some(insert),
            };
        }

        self.state = if self.registry.is_trigger_prefix(&after) {
            TriggerState::BufferingTrigger
        } else {
            TriggerState::Idle
        };
        KeyAction::apply(insert)
    }

    fn on_enter(&mut self, block: &Block, variant: &dyn BlockVariant, event: &KeyEvent, caret: usize) -> KeyAction {
        if block.tag() == VariantTag::Paragraph
            && event.is_plain()
            && !event.shift
            && let Some(found) = self.fence_trigger(&block.content)
        {
            let cmd = Cmd::Convert {
                block: block.id,
                to: found.0,
                typed: Some(found.1),
            };
            self.consumed_trigger(&cmd);
            return KeyAction::Apply {
                cmd,
                fallback: Some(Cmd::InsertBlockAfter {
                    block: block.id,
                    at: caret,
                }),
            };
        }

        if let Some(cmd) = variant.handle_enter_key(block, event, caret) {
            return KeyAction::apply(cmd);
        }
        if event.shift || !event.is_plain() {
            return KeyAction::Pass;
        }

        let cmd = match block.tag() {
            VariantTag::UnorderedList | VariantTag::OrderedList => {
                let last_item = block.content.rsplit('\n').next().unwrap_or_default();
                if last_item.trim().is_empty() {
                    Cmd::ExitBlock { block: block.id }
                } else {
                    Cmd::SplitListItem {
                        block: block.id,
                        at: block.content.len(),
                    }
                }
            }
            VariantTag::TaskList if block.content.trim().is_empty() => Cmd::ExitBlock { block: block.id },
            VariantTag::TaskList => Cmd::SplitListItem {
                block: block.id,
                at: caret,
            },
            _ => Cmd::InsertBlockAfter {
                block: block.id,
                at: caret,
            },
        };
        KeyAction::apply(cmd)
    }

    /// A fence typed into a paragraph, with its optional language.
    ///
    /// The run of fence keys in the buffer decides; the block text has to
    /// spell the same trigger. A full buffer whose scan reaches its oldest
    /// key may have dropped part of the run and defers to the text.
    fn fence_trigger(&self, text: &str) -> Option<(VariantTag, String)> {
        let found = self.registry.match_trigger(text, TriggerCommit::OnEnter)?;
        let trigger = found.trigger?;
        let fence = trigger.text.chars().next()?;
        let needed = trigger.text.chars().count();

        let run = self.buffer.fence_run(fence);
        if run.len < needed && !(run.at_start && self.buffer.is_full()) {
            log::debug!(
                "Fence {:?} in block text but {} of {needed} fence keys typed",
                found.text,
                run.len
            );
            return None;
        }
        log::trace!("Fence {:?} from {} buffered keys", found.text, run.len);
        Some((found.tag, found.text))
    }

    fn on_backspace(
        &mut self,
        document: &Document,
        block: &Block,
        variant: &dyn BlockVariant,
        event: &KeyEvent,
        caret: usize,
    ) -> KeyAction {
        self.buffer.pop();

        if caret > 0 {
            let cmd = variant
                .handle_key_press(block, event, caret)
                .unwrap_or(Cmd::DeleteBackward {
                    block: block.id,
                    at: caret,
                });
            return KeyAction::apply(cmd);
        }

        let index = document.index_of(block.id).unwrap_or(0);
        let previous = index.checked_sub(1).and_then(|i| document.block_at(i));

        if block.is_empty() {
            return match previous {
                Some(_) => KeyAction::apply(Cmd::MergeWithPrevious { block: block.id }),
                None if block.tag() != VariantTag::Paragraph => KeyAction::apply(Cmd::Convert {
                    block: block.id,
                    to: VariantTag::Paragraph,
                    typed: None,
                }),
                None => KeyAction::Consume,
            };
        }

        match block.tag() {
            VariantTag::Heading(_) | VariantTag::Quote => KeyAction::apply(Cmd::Convert {
                block: block.id,
                to: VariantTag::Paragraph,
                typed: None,
            }),
            VariantTag::Paragraph if previous.is_some_and(|p| p.tag().is_text()) => {
                KeyAction::apply(Cmd::MergeWithPrevious { block: block.id })
            }
            _ => KeyAction::Consume,
        }
    }

    fn consumed_trigger(&mut self, cmd: &Cmd) {
        if let Cmd::Convert { to, .. } = cmd {
            log::debug!("Trigger consumed, converting to {to}");
            self.buffer.clear();
            self.state = TriggerState::Converting;
        }
    }
}
