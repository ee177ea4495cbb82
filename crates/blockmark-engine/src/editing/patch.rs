use crate::editing::keys::Focus;
use crate::models::BlockId;

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Blocks that were modified, created or removed.
    pub changed: Vec<BlockId>,
    /// Where the caret should go, if it moved.
    pub focus: Option<Focus>,
    pub version: u64,
}

impl Patch {
    pub fn unchanged(version: u64) -> Self {
        Self {
            changed: Vec::new(),
            focus: None,
            version,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.changed.is_empty()
    }
}
