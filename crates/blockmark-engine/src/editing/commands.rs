use crate::models::{BlockId, VariantTag};

/// Edits the editor applies to a document.
///
/// Carets are byte offsets into the target block's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    InsertText {
        block: BlockId,
        at: usize,
        text: String,
    },
    /// Delete the character before `at`.
    DeleteBackward {
        block: BlockId,
        at: usize,
    },
    ReplaceContent {
        block: BlockId,
        text: String,
    },
    /// Re-type a block. `typed` carries trigger text when the conversion
    /// came from typing rather than a toolbar.
    Convert {
        block: BlockId,
        to: VariantTag,
        typed: Option<String>,
    },
    SplitListItem {
        block: BlockId,
        at: usize,
    },
    /// Leave a list or code block for a fresh paragraph.
    ExitBlock {
        block: BlockId,
    },
    /// Split the block at `at`, moving the tail into a new paragraph.
    InsertBlockAfter {
        block: BlockId,
        at: usize,
    },
    MergeWithPrevious {
        block: BlockId,
    },
    RemoveBlock {
        block: BlockId,
    },
    ToggleChecked {
        block: BlockId,
    },
    EditCell {
        block: BlockId,
        row: usize,
        col: usize,
        text: String,
    },
}

impl Cmd {
    /// The block the command targets.
    pub fn block(&self) -> BlockId {
        match self {
            Cmd::InsertText { block, .. }
            | Cmd::DeleteBackward { block, .. }
            | Cmd::ReplaceContent { block, .. }
            | Cmd::Convert { block, .. }
            | Cmd::SplitListItem { block, .. }
            | Cmd::ExitBlock { block }
            | Cmd::InsertBlockAfter { block, .. }
            | Cmd::MergeWithPrevious { block }
            | Cmd::RemoveBlock { block }
            | Cmd::ToggleChecked { block }
            | Cmd::EditCell { block, .. } => *block,
        }
    }
}

/// Start of the character before `at`, or `None` at the start.
pub(crate) fn previous_boundary(text: &str, at: usize) -> Option<usize> {
    text[..at].char_indices().next_back().map(|(i, _)| i)
}
