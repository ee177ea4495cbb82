use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;
use uuid::Uuid;

/// Stable identity for a block, independent of its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    pub const ALL: [HeadingLevel; 6] = [
        HeadingLevel::H1,
        HeadingLevel::H2,
        HeadingLevel::H3,
        HeadingLevel::H4,
        HeadingLevel::H5,
        HeadingLevel::H6,
    ];

    pub fn number(self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
            HeadingLevel::H5 => 5,
            HeadingLevel::H6 => 6,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }
}

/// The closed set of block variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantTag {
    Paragraph,
    Heading(HeadingLevel),
    UnorderedList,
    OrderedList,
    TaskList,
    Quote,
    Code,
    Table,
    Image,
    Delimiter,
}

impl VariantTag {
    pub const ALL: [VariantTag; 15] = [
        VariantTag::Paragraph,
        VariantTag::Heading(HeadingLevel::H1),
        VariantTag::Heading(HeadingLevel::H2),
        VariantTag::Heading(HeadingLevel::H3),
        VariantTag::Heading(HeadingLevel::H4),
        VariantTag::Heading(HeadingLevel::H5),
        VariantTag::Heading(HeadingLevel::H6),
        VariantTag::UnorderedList,
        VariantTag::OrderedList,
        VariantTag::TaskList,
        VariantTag::Quote,
        VariantTag::Code,
        VariantTag::Table,
        VariantTag::Image,
        VariantTag::Delimiter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VariantTag::Paragraph => "paragraph",
            VariantTag::Heading(HeadingLevel::H1) => "h1",
            VariantTag::Heading(HeadingLevel::H2) => "h2",
            VariantTag::Heading(HeadingLevel::H3) => "h3",
            VariantTag::Heading(HeadingLevel::H4) => "h4",
            VariantTag::Heading(HeadingLevel::H5) => "h5",
            VariantTag::Heading(HeadingLevel::H6) => "h6",
            VariantTag::UnorderedList => "ul",
            VariantTag::OrderedList => "ol",
            VariantTag::TaskList => "task",
            VariantTag::Quote => "quote",
            VariantTag::Code => "code",
            VariantTag::Table => "table",
            VariantTag::Image => "image",
            VariantTag::Delimiter => "delimiter",
        }
    }

    /// Variants whose content is editable inline text.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            VariantTag::Paragraph | VariantTag::Heading(_) | VariantTag::Quote
        )
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            VariantTag::UnorderedList | VariantTag::OrderedList | VariantTag::TaskList
        )
    }
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);

impl FromStr for VariantTag {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VariantTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Column alignment in a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

/// Variant tag plus the payload that only some variants carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Paragraph,
    Heading(HeadingLevel),
    UnorderedList,
    OrderedList {
        start: u64,
    },
    TaskList,
    Quote,
    Code {
        language: Option<String>,
    },
    Table {
        headers: Vec<String>,
        alignments: Vec<Alignment>,
        rows: Vec<Vec<String>>,
    },
    Image {
        src: String,
        alt: String,
        title: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    },
    Delimiter,
}

impl BlockKind {
    pub fn tag(&self) -> VariantTag {
        match self {
            BlockKind::Paragraph => VariantTag::Paragraph,
            BlockKind::Heading(level) => VariantTag::Heading(*level),
            BlockKind::UnorderedList => VariantTag::UnorderedList,
            BlockKind::OrderedList { .. } => VariantTag::OrderedList,
            BlockKind::TaskList => VariantTag::TaskList,
            BlockKind::Quote => VariantTag::Quote,
            BlockKind::Code { .. } => VariantTag::Code,
            BlockKind::Table { .. } => VariantTag::Table,
            BlockKind::Image { .. } => VariantTag::Image,
            BlockKind::Delimiter => VariantTag::Delimiter,
        }
    }

    /// Empty payload for a tag.
    pub fn default_for(tag: VariantTag) -> Self {
        match tag {
            VariantTag::Paragraph => BlockKind::Paragraph,
            VariantTag::Heading(level) => BlockKind::Heading(level),
            VariantTag::UnorderedList => BlockKind::UnorderedList,
            VariantTag::OrderedList => BlockKind::OrderedList { start: 1 },
            VariantTag::TaskList => BlockKind::TaskList,
            VariantTag::Quote => BlockKind::Quote,
            VariantTag::Code => BlockKind::Code { language: None },
            VariantTag::Table => BlockKind::Table {
                headers: Vec::new(),
                alignments: Vec::new(),
                rows: Vec::new(),
            },
            VariantTag::Image => BlockKind::Image {
                src: String::new(),
                alt: String::new(),
                title: None,
                width: None,
                height: None,
            },
            VariantTag::Delimiter => BlockKind::Delimiter,
        }
    }
}

/// The atomic unit of content.
///
/// Equality compares structure only (`kind`, `content`, `children`,
/// `checked`, `item`); ids, cached markup and timestamps are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub content: String,
    /// Rendered markup cache. Never authoritative.
    pub markup: String,
    pub children: Vec<Block>,
    /// Only meaningful for task blocks.
    pub checked: bool,
    /// For a list nested in a list, the index of the parent item it sits
    /// under. `None` means the last item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<usize>,
    pub last_modified: SystemTime,
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.content == other.content
            && self.children == other.children
            && self.checked == other.checked
            && self.item == other.item
    }
}

impl Block {
    pub fn new(kind: BlockKind, content: impl Into<String>) -> Self {
        Self {
            id: BlockId::new(),
            kind,
            content: content.into(),
            markup: String::new(),
            children: Vec::new(),
            checked: false,
            item: None,
            last_modified: SystemTime::now(),
        }
    }

    pub fn paragraph(content: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, content)
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    pub fn with_item(mut self, item: usize) -> Self {
        self.item = Some(item);
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn tag(&self) -> VariantTag {
        self.kind.tag()
    }

    /// Replace the content, invalidating the markup cache.
    pub fn set_content(&mut self, content: impl Into<String>) {
        let content = content.into();
        if content != self.content {
            self.content = content;
            self.touch();
        }
    }

    /// Mark the block as modified.
    pub fn touch(&mut self) {
        self.markup.clear();
        self.last_modified = SystemTime::now();
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.children.is_empty()
    }

    /// Whether this block or any descendant has the given id.
    pub fn contains_id(&self, id: BlockId) -> bool {
        self.id == id || self.children.iter().any(|child| child.contains_id(id))
    }

    /// Visit this block and every descendant, depth-first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Block)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(VariantTag::Paragraph, "paragraph")]
    #[case(VariantTag::Heading(HeadingLevel::H3), "h3")]
    #[case(VariantTag::TaskList, "task")]
    #[case(VariantTag::Delimiter, "delimiter")]
    fn tag_names_round_trip(#[case] tag: VariantTag, #[case] name: &str) {
        assert_eq!(tag.as_str(), name);
        assert_eq!(name.parse::<VariantTag>(), Ok(tag));
    }

    #[test]
    fn unknown_tag_name_is_an_error() {
        assert_eq!(
            "h7".parse::<VariantTag>(),
            Err(UnknownVariant("h7".to_string()))
        );
    }

    #[test]
    fn heading_levels_from_numbers() {
        assert_eq!(HeadingLevel::from_number(1), Some(HeadingLevel::H1));
        assert_eq!(HeadingLevel::from_number(6), Some(HeadingLevel::H6));
        assert_eq!(HeadingLevel::from_number(0), None);
        assert_eq!(HeadingLevel::from_number(7), None);
    }

    #[test]
    fn kind_projects_to_tag() {
        for tag in VariantTag::ALL {
            assert_eq!(BlockKind::default_for(tag).tag(), tag);
        }
    }

    #[test]
    fn equality_ignores_identity() {
        let a = Block::paragraph("same");
        let b = Block::paragraph("same");
        assert_ne!(a.id, b.id);
        assert_eq!(a, b);
        assert_ne!(a, Block::paragraph("other"));
        assert_ne!(a, Block::paragraph("same").with_checked(true));
    }

    #[test]
    fn set_content_bumps_timestamp_and_clears_markup() {
        let mut block = Block::paragraph("a");
        block.markup = "<p>a</p>".to_string();
        let before = block.last_modified;

        block.set_content("b");

        assert_eq!(block.content, "b");
        assert!(block.markup.is_empty());
        assert!(block.last_modified >= before);
    }

    #[test]
    fn contains_id_searches_descendants() {
        let grandchild = Block::new(BlockKind::UnorderedList, "deep");
        let id = grandchild.id;
        let child = Block::new(BlockKind::UnorderedList, "mid").with_children(vec![grandchild]);
        let root = Block::new(BlockKind::UnorderedList, "top").with_children(vec![child]);

        assert!(root.contains_id(id));
        assert!(!root.contains_id(BlockId::new()));

        let mut seen = Vec::new();
        root.walk(&mut |b| seen.push(b.content.as_str()));
        assert_eq!(seen, vec!["top", "mid", "deep"]);
    }
}
