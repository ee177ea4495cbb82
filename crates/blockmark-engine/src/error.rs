use thiserror::Error;

use crate::models::{BlockId, VariantTag};

/// A variant or edit could not be applied to a block.
///
/// Never escapes a public editing operation: the editor logs it and falls
/// back to default handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("cannot produce {variant} from this block")]
    Unsupported { variant: VariantTag },

    #[error("invalid {variant} content: {reason}")]
    Invalid { variant: VariantTag, reason: String },

    #[error("block {0} not found")]
    BlockNotFound(BlockId),
}

/// The markdown to markup converter failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("markdown conversion failed: {0}")]
    Failed(String),
}
