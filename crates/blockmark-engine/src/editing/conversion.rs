use std::sync::Arc;

use crate::blocks::{Capabilities, VariantRegistry};
use crate::editing::guard::ReentrancyGuard;
use crate::error::TransformError;
use crate::models::{Block, VariantTag};

/// Re-types blocks in place.
///
/// A conversion works on a copy of the block and only commits it once the
/// target variant has accepted the seed, so a failed conversion leaves the
/// block untouched. While one is in flight the shared [`ReentrancyGuard`]
/// is held; a nested conversion is refused.
pub struct ConversionEngine {
    registry: Arc<VariantRegistry>,
    guard: ReentrancyGuard,
}

impl ConversionEngine {
    pub fn new(registry: Arc<VariantRegistry>, guard: ReentrancyGuard) -> Self {
        Self { registry, guard }
    }

    pub fn guard(&self) -> &ReentrancyGuard {
        &self.guard
    }

    /// Convert `block` to `target`, seeded with its plain text.
    ///
    /// `Ok(false)` when nothing happened: unknown target, same variant, or
    /// a conversion already running.
    pub fn convert(&self, block: &mut Block, target: VariantTag) -> Result<bool, TransformError> {
        self.run(block, target, None)
    }

    /// Convert after `typed` matched one of the target's triggers.
    pub fn convert_with_trigger(
        &self,
        block: &mut Block,
        target: VariantTag,
        typed: &str,
    ) -> Result<bool, TransformError> {
        self.run(block, target, Some(typed))
    }

    fn run(&self, block: &mut Block, target: VariantTag, typed: Option<&str>) -> Result<bool, TransformError> {
        let Some(variant) = self.registry.get(target) else {
            log::warn!("Cannot convert block {} to unregistered variant {target}", block.id);
            return Ok(false);
        };
        if block.tag() == target {
            return Ok(false);
        }
        let Some(_token) = self.guard.enter() else {
            log::debug!("Conversion of block {} to {target} refused: one already running", block.id);
            return Ok(false);
        };

        let mut work = block.clone();
        let mut seed = self.registry.plain_text(&work);
        if !variant.descriptor().has(Capabilities::CHILDREN) && !work.children.is_empty() {
            for child in std::mem::take(&mut work.children) {
                child.walk(&mut |b| {
                    let text = self.registry.plain_text(b);
                    if !text.is_empty() {
                        if !seed.is_empty() {
                            seed.push('\n');
                        }
                        seed.push_str(&text);
                    }
                });
            }
        }

        match typed {
            Some(typed) => variant.apply_trigger(&mut work, typed)?,
            None => variant.apply_transformation(&mut work, &seed)?,
        }
        work.touch();
        work.markup = variant.serialize_to_markup(&work);

        log::debug!("Converted block {} from {} to {target}", block.id, block.tag());
        *block = work;
        Ok(true)
    }
}
