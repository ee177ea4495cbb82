use std::sync::Arc;

use blockmark_config::EditorConfig;

use crate::blocks::kinds::{TaskListVariant, list};
use crate::blocks::kinds::table::edit_cell;
use crate::blocks::{Capabilities, VariantRegistry, clamp_caret, insert_at};
use crate::editing::commands::{Cmd, previous_boundary};
use crate::editing::conversion::ConversionEngine;
use crate::editing::guard::ReentrancyGuard;
use crate::editing::keys::{Focus, KeyAction, KeyEvent, KeyStateMachine};
use crate::editing::patch::Patch;
use crate::error::TransformError;
use crate::highlight::{PlainHighlighter, SyntaxHighlighter};
use crate::models::{Block, BlockId, Document, VariantTag};
use crate::parsing::Parser;

/// How a key press was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The surface should perform the key's default behaviour.
    Pass,
    Handled(Patch),
}

/// One editing session over one document.
///
/// Every operation ends with the document repaired (never empty) and, when
/// something changed, the version bumped. Transformation failures are
/// logged and leave the document as it was.
pub struct Editor {
    registry: Arc<VariantRegistry>,
    parser: Parser,
    conversion: ConversionEngine,
    keys: KeyStateMachine,
    guard: ReentrancyGuard,
    document: Document,
}

type Edit = (Vec<BlockId>, Option<Focus>);

impl Editor {
    pub fn new(registry: Arc<VariantRegistry>) -> Self {
        let keys = KeyStateMachine::with_default_capacity(Arc::clone(&registry));
        Self::assemble(registry, keys)
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::with_highlighter(config, Arc::new(PlainHighlighter))
    }

    pub fn with_highlighter(config: &EditorConfig, highlighter: Arc<dyn SyntaxHighlighter>) -> Self {
        let registry = Arc::new(VariantRegistry::with_options(config, highlighter));
        let capacity = config
            .keys
            .buffer_capacity
            .unwrap_or_else(|| registry.longest_trigger_len().max(4));
        let keys = KeyStateMachine::new(Arc::clone(&registry), capacity);
        Self::assemble(registry, keys)
    }

    fn assemble(registry: Arc<VariantRegistry>, keys: KeyStateMachine) -> Self {
        let guard = ReentrancyGuard::new();
        Self {
            parser: Parser::new(Arc::clone(&registry)),
            conversion: ConversionEngine::new(Arc::clone(&registry), guard.clone()),
            keys,
            guard,
            document: Document::new(),
            registry,
        }
    }

    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn keys(&self) -> &KeyStateMachine {
        &self.keys
    }

    pub fn load_markdown(&mut self, markdown: &str) {
        self.document = self.parser.parse_document(markdown);
        self.keys.focus_changed(None);
        log::info!("Loaded document with {} blocks", self.document.len());
    }

    pub fn load_markup(&mut self, markup: &str) {
        self.document = Document::from_blocks(self.parser.parse_markup(markup));
        self.keys.focus_changed(None);
        log::info!("Loaded document with {} blocks", self.document.len());
    }

    pub fn to_markdown(&self) -> String {
        self.parser.to_markdown(&self.document)
    }

    pub fn to_markup(&self) -> String {
        self.parser.to_markup(&self.document)
    }

    pub fn focus_changed(&mut self, block: Option<BlockId>) {
        self.keys.focus_changed(block);
    }

    pub fn handle_key_event(&mut self, focus: &Focus, event: &KeyEvent) -> KeyOutcome {
        let outcome = match self.keys.classify(&self.document, focus, event) {
            KeyAction::Pass => KeyOutcome::Pass,
            KeyAction::Consume => KeyOutcome::Handled(Patch::unchanged(self.document.version())),
            KeyAction::Apply { cmd, fallback } => {
                let patch = match self.execute(&cmd) {
                    Ok(patch) => patch,
                    Err(e) => {
                        log::warn!("{cmd:?} failed: {e}");
                        match fallback {
                            Some(fallback) => self.apply(fallback),
                            None => Patch::unchanged(self.document.version()),
                        }
                    }
                };
                KeyOutcome::Handled(patch)
            }
        };

        self.keys.settle();
        if let KeyOutcome::Handled(Patch { focus: Some(moved), .. }) = &outcome {
            self.keys.focus_changed(Some(moved.block));
        }
        outcome
    }

    /// Convert a block, e.g. from a toolbar.
    pub fn convert(&mut self, block: BlockId, to: VariantTag) -> Patch {
        self.apply(Cmd::Convert {
            block,
            to,
            typed: None,
        })
    }

    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        match self.execute(&cmd) {
            Ok(patch) => patch,
            Err(e) => {
                log::warn!("{cmd:?} failed: {e}");
                Patch::unchanged(self.document.version())
            }
        }
    }

    fn execute(&mut self, cmd: &Cmd) -> Result<Patch, TransformError> {
        let id = cmd.block();
        let index = self
            .document
            .index_of(id)
            .ok_or(TransformError::BlockNotFound(id))?;

        let (changed, focus) = match cmd {
            Cmd::InsertText { at, text, .. } => self.insert_text(id, *at, text)?,
            Cmd::DeleteBackward { at, .. } => self.delete_backward(id, *at)?,
            Cmd::ReplaceContent { text, .. } => self.replace_content(id, text)?,
            Cmd::Convert { to, typed, .. } => {
                let block = block_mut(&mut self.document, id)?;
                let converted = match typed {
                    Some(typed) => self.conversion.convert_with_trigger(block, *to, typed)?,
                    None => self.conversion.convert(block, *to)?,
                };
                if converted {
                    (vec![id], Some(Focus::start(id)))
                } else {
                    (Vec::new(), None)
                }
            }
            Cmd::SplitListItem { at, .. } => self.split_list_item(id, index, *at)?,
            Cmd::ExitBlock { .. } => self.exit_block(id, index)?,
            Cmd::InsertBlockAfter { at, .. } => self.insert_block_after(id, index, *at)?,
            Cmd::MergeWithPrevious { .. } => self.merge_with_previous(id, index)?,
            Cmd::RemoveBlock { .. } => {
                self.document.remove(id);
                let focus = match index.checked_sub(1).and_then(|i| self.document.block_at(i)) {
                    Some(prev) => Some(Focus::new(prev.id, prev.content.len())),
                    None => self.document.block_at(index).map(|next| Focus::start(next.id)),
                };
                (vec![id], focus)
            }
            Cmd::ToggleChecked { .. } => {
                let block = block_mut(&mut self.document, id)?;
                if block.tag() != VariantTag::TaskList {
                    return Err(TransformError::Unsupported {
                        variant: VariantTag::TaskList,
                    });
                }
                block.checked = !block.checked;
                block.touch();
                (vec![id], None)
            }
            Cmd::EditCell { row, col, text, .. } => {
                edit_cell(block_mut(&mut self.document, id)?, *row, *col, text)?;
                (vec![id], None)
            }
        };

        Ok(self.finish(changed, focus))
    }

    fn insert_text(&mut self, id: BlockId, at: usize, text: &str) -> Result<Edit, TransformError> {
        let block = inline_editable(&mut self.document, id)?;
        let at = clamp_caret(&block.content, at);
        let content = insert_at(&block.content, at, text);
        block.set_content(content);
        Ok((vec![id], Some(Focus::new(id, at + text.len()))))
    }

    fn delete_backward(&mut self, id: BlockId, at: usize) -> Result<Edit, TransformError> {
        let block = inline_editable(&mut self.document, id)?;
        let at = clamp_caret(&block.content, at);
        let Some(start) = previous_boundary(&block.content, at) else {
            return Ok((Vec::new(), None));
        };
        let mut content = block.content.clone();
        content.replace_range(start..at, "");
        block.set_content(content);
        Ok((vec![id], Some(Focus::new(id, start))))
    }

    /// Structured variants re-derive their payload from the new text.
    fn replace_content(&mut self, id: BlockId, text: &str) -> Result<Edit, TransformError> {
        let block = block_mut(&mut self.document, id)?;
        let variant = self.registry.variant_for(block);
        if variant.descriptor().has(Capabilities::STRUCTURED) && block.tag() != VariantTag::Code {
            variant.apply_transformation(block, text)?;
        } else {
            block.set_content(text);
        }
        Ok((vec![id], Some(Focus::new(id, block.content.len()))))
    }

    fn split_list_item(&mut self, id: BlockId, index: usize, at: usize) -> Result<Edit, TransformError> {
        let block = block_mut(&mut self.document, id)?;
        let at = clamp_caret(&block.content, at);
        match block.tag() {
            VariantTag::TaskList => {
                let tail = block.content[at..].trim_start().to_string();
                let head = block.content[..at].trim_end().to_string();
                block.set_content(head);
                let task = TaskListVariant::task(tail, false);
                let task_id = task.id;
                self.document.insert(index + 1, task);
                Ok((vec![id, task_id], Some(Focus::start(task_id))))
            }
            VariantTag::UnorderedList | VariantTag::OrderedList => {
                let split = block.content[..at].matches('\n').count();
                let content = insert_at(&block.content, at, "\n");
                block.set_content(content);
                list::shift_anchors(block, split);
                Ok((vec![id], Some(Focus::new(id, at + 1))))
            }
            tag => Err(TransformError::Unsupported { variant: tag }),
        }
    }

    fn exit_block(&mut self, id: BlockId, index: usize) -> Result<Edit, TransformError> {
        let block = block_mut(&mut self.document, id)?;
        if block.tag().is_list() && block.is_empty() {
            self.conversion.convert(block, VariantTag::Paragraph)?;
            return Ok((vec![id], Some(Focus::start(id))));
        }

        if let Some(trimmed) = block.content.strip_suffix('\n') {
            let trimmed = trimmed.to_string();
            block.set_content(trimmed);
        }
        let paragraph = Block::paragraph("");
        let paragraph_id = paragraph.id;
        self.document.insert(index + 1, paragraph);
        Ok((vec![id, paragraph_id], Some(Focus::start(paragraph_id))))
    }

    fn insert_block_after(&mut self, id: BlockId, index: usize, at: usize) -> Result<Edit, TransformError> {
        let block = block_mut(&mut self.document, id)?;
        let mut changed = vec![id];
        let tail = if block.tag().is_text() {
            let at = clamp_caret(&block.content, at);
            let tail = block.content[at..].to_string();
            let head = block.content[..at].to_string();
            block.set_content(head);
            tail
        } else {
            changed.clear();
            String::new()
        };

        let paragraph = Block::paragraph(tail);
        let paragraph_id = paragraph.id;
        self.document.insert(index + 1, paragraph);
        changed.push(paragraph_id);
        Ok((changed, Some(Focus::start(paragraph_id))))
    }

    /// Fold a block into the one before it. An empty block just goes away;
    /// text is appended only when the previous block holds inline text.
    fn merge_with_previous(&mut self, id: BlockId, index: usize) -> Result<Edit, TransformError> {
        let Some(previous) = index.checked_sub(1).and_then(|i| self.document.block_at(i)) else {
            return Err(TransformError::Invalid {
                variant: VariantTag::Paragraph,
                reason: "no previous block to merge into".to_string(),
            });
        };
        let previous_id = previous.id;
        let previous_tag = previous.tag();
        let current_empty = self.document.get(id).is_none_or(|b| b.content.is_empty());
        if !current_empty && !previous_tag.is_text() {
            return Err(TransformError::Unsupported { variant: previous_tag });
        }

        let removed = self
            .document
            .remove(id)
            .ok_or(TransformError::BlockNotFound(id))?;
        let previous = block_mut(&mut self.document, previous_id)?;
        let caret = previous.content.len();
        if !removed.content.is_empty() {
            let merged = format!("{}{}", previous.content, removed.content);
            previous.set_content(merged);
        }
        if !removed.children.is_empty() {
            previous.children.extend(removed.children);
            previous.touch();
        }
        Ok((vec![previous_id, id], Some(Focus::new(previous_id, caret))))
    }

    fn finish(&mut self, mut changed: Vec<BlockId>, mut focus: Option<Focus>) -> Patch {
        if self.document.repair(&self.guard)
            && let Some(block) = self.document.block_at(0)
        {
            changed.push(block.id);
            focus = Some(Focus::start(block.id));
        }
        if changed.is_empty() {
            return Patch::unchanged(self.document.version());
        }

        for id in &changed {
            if let Some(block) = self.document.get_mut(*id) {
                block.markup = self.parser.serialize_block(block);
            }
        }
        let version = self.document.bump_version();
        log::debug!("Document v{version}: {} blocks changed", changed.len());
        Patch {
            changed,
            focus,
            version,
        }
    }
}

fn block_mut(document: &mut Document, id: BlockId) -> Result<&mut Block, TransformError> {
    document.get_mut(id).ok_or(TransformError::BlockNotFound(id))
}

/// Blocks whose content takes typed text directly.
fn inline_editable(document: &mut Document, id: BlockId) -> Result<&mut Block, TransformError> {
    let block = block_mut(document, id)?;
    match block.tag() {
        tag @ (VariantTag::Table | VariantTag::Image | VariantTag::Delimiter) => {
            Err(TransformError::Unsupported { variant: tag })
        }
        _ => Ok(block),
    }
}
