use crate::models::VariantTag;

/// Capability flags describing what a variant can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    /// Inline-formatted text content.
    pub const TEXT: Capabilities = Capabilities(1);
    /// Content may span several lines.
    pub const MULTILINE: Capabilities = Capabilities(1 << 1);
    /// Content lines are list items.
    pub const LIST: Capabilities = Capabilities(1 << 2);
    /// May own nested child blocks.
    pub const CHILDREN: Capabilities = Capabilities(1 << 3);
    /// Carries a structured payload beyond its content.
    pub const STRUCTURED: Capabilities = Capabilities(1 << 4);

    pub const fn union(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 | other.0)
    }

    pub const fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        self.union(rhs)
    }
}

/// When a typed trigger takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCommit {
    /// As soon as the block text equals the trigger.
    Immediate,
    /// When Enter is pressed with the block text starting with the trigger.
    OnEnter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub text: &'static str,
    pub commit: TriggerCommit,
}

impl Trigger {
    pub const fn immediate(text: &'static str) -> Self {
        Self {
            text,
            commit: TriggerCommit::Immediate,
        }
    }

    pub const fn on_enter(text: &'static str) -> Self {
        Self {
            text,
            commit: TriggerCommit::OnEnter,
        }
    }
}

/// Static metadata for a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDescriptor {
    pub tag: VariantTag,
    pub name: &'static str,
    pub capabilities: Capabilities,
    /// Ordered; see [`crate::blocks::VariantRegistry::match_trigger`].
    pub triggers: &'static [Trigger],
    /// Lower wins ties. Equal priorities fall back to registration order.
    pub priority: u16,
}

impl VariantDescriptor {
    pub fn has(&self, capabilities: Capabilities) -> bool {
        self.capabilities.contains(capabilities)
    }
}
