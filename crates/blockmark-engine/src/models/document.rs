use serde::{Deserialize, Serialize};

use crate::editing::guard::ReentrancyGuard;
use crate::models::{Block, BlockId};

/// Ordered sequence of top-level blocks.
///
/// Removal may transiently leave it empty; [`Document::repair`] restores the
/// single-default-paragraph invariant and is called once per editing
/// operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    blocks: Vec<Block>,
    version: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document holding one empty paragraph.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::paragraph("")],
            version: 0,
        }
    }

    /// Build from parsed blocks; an empty list yields the default paragraph.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut doc = Self { blocks, version: 0 };
        if doc.blocks.is_empty() {
            doc.blocks.push(Block::paragraph(""));
        }
        doc
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    pub fn index_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    pub fn block_at(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Whether any block in the tree carries `id`.
    pub fn contains_id(&self, id: BlockId) -> bool {
        self.blocks.iter().any(|b| b.contains_id(id))
    }

    /// Insert a block at `index` (clamped to the end).
    ///
    /// Refused when any id in the incoming subtree is already in the
    /// document, so a block can never end up inside itself.
    pub fn insert(&mut self, index: usize, block: Block) -> bool {
        let mut clash = false;
        block.walk(&mut |b| clash |= self.contains_id(b.id));
        if clash {
            log::warn!("Refusing to insert block {}: id already present", block.id);
            return false;
        }
        let index = index.min(self.blocks.len());
        self.blocks.insert(index, block);
        true
    }

    pub fn push(&mut self, block: Block) -> bool {
        self.insert(self.blocks.len(), block)
    }

    /// Remove a block. Does not repair; see [`Document::repair`].
    pub fn remove(&mut self, id: BlockId) -> Option<Block> {
        let index = self.index_of(id)?;
        Some(self.blocks.remove(index))
    }

    pub fn replace(&mut self, id: BlockId, block: Block) -> Option<Block> {
        let index = self.index_of(id)?;
        Some(std::mem::replace(&mut self.blocks[index], block))
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Re-establish non-emptiness by synthesising a default paragraph.
    ///
    /// Suppressed while `guard` is active. Returns whether a block was added.
    pub fn repair(&mut self, guard: &ReentrancyGuard) -> bool {
        if guard.is_active() || !self.blocks.is_empty() {
            return false;
        }
        log::debug!("Document emptied; synthesising default paragraph");
        self.blocks.push(Block::paragraph(""));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_document_has_one_empty_paragraph() {
        let doc = Document::new();
        assert_eq!(doc.blocks(), &[Block::paragraph("")]);
    }

    #[test]
    fn from_empty_blocks_is_repaired() {
        assert_eq!(Document::from_blocks(vec![]).len(), 1);
    }

    #[test]
    fn repair_after_removing_last_block() {
        let mut doc = Document::new();
        let id = doc.blocks()[0].id;
        let guard = ReentrancyGuard::new();

        doc.remove(id);
        assert!(doc.is_empty());

        assert!(doc.repair(&guard));
        assert_eq!(doc.len(), 1);
        assert!(!doc.repair(&guard));
    }

    #[test]
    fn repair_is_suppressed_while_guarded() {
        let mut doc = Document::new();
        doc.clear();
        let guard = ReentrancyGuard::new();

        let token = guard.enter();
        assert!(!doc.repair(&guard));
        assert!(doc.is_empty());

        drop(token);
        assert!(doc.repair(&guard));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn insert_refuses_duplicate_ids() {
        let mut doc = Document::new();
        let existing = doc.blocks()[0].clone();

        assert!(!doc.push(existing.clone()));

        let wrapper = Block::new(BlockKind::UnorderedList, "x").with_children(vec![existing]);
        assert!(!doc.push(wrapper));
        assert_eq!(doc.len(), 1);

        assert!(doc.insert(0, Block::paragraph("first")));
        assert_eq!(doc.blocks()[0].content, "first");
    }
}
