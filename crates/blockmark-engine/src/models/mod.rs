pub mod block;
pub mod document;

pub use block::{Alignment, Block, BlockId, BlockKind, HeadingLevel, UnknownVariant, VariantTag};
pub use document::Document;
