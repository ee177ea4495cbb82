use blockmark_engine::blocks::VariantRegistry;
use blockmark_engine::{Parser, VariantTag};
use blockmark_engine::blocks::kinds::TableVariant;
use blockmark_engine::blocks::kinds::table::TableData;
use blockmark_engine::models::{Alignment, Block, BlockKind, Document, HeadingLevel};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[rstest]
#[case(VariantTag::Paragraph, "hello world")]
#[case(VariantTag::Paragraph, "2. apples")]
#[case(VariantTag::Paragraph, "2024. a good year")]
#[case(VariantTag::Paragraph, "* starred")]
#[case(VariantTag::Paragraph, "> not a quote")]
#[case(VariantTag::Paragraph, "# hash")]
#[case(VariantTag::Paragraph, "| a | b |\n| - | - |")]
#[case(VariantTag::Heading(HeadingLevel::H2), "Title #")]
#[case(VariantTag::Heading(HeadingLevel::H1), "Title")]
#[case(VariantTag::Heading(HeadingLevel::H4), "Deeper")]
#[case(VariantTag::UnorderedList, "a\nb")]
#[case(VariantTag::OrderedList, "one\ntwo")]
#[case(VariantTag::TaskList, "todo")]
#[case(VariantTag::Quote, "said")]
#[case(VariantTag::Code, "let x = 1;")]
#[case(VariantTag::Table, "Name | Age\nAda | 36")]
#[case(VariantTag::Image, "pic.png")]
#[case(VariantTag::Delimiter, "")]
fn variant_survives_markdown(#[case] tag: VariantTag, #[case] content: &str) {
    init_logging();
    let registry = VariantRegistry::with_defaults();

    let block = registry.create(tag, content).unwrap();
    let markdown = registry.render_markdown(&block);
    let parsed = registry.create_from_markdown(&markdown);

    assert_eq!(parsed.tag(), tag, "markdown was {markdown:?}");
    assert_eq!(registry.plain_text(&parsed), content);
}

#[rstest]
#[case("# Title")]
#[case("Some *emphasis* and `code`")]
#[case("3. three\n4. four")]
#[case("- [x] done")]
#[case("> quoted")]
#[case("```rust\nfn main() {}\n```")]
#[case("| a | b |\n| :-- | --: |\n| 1 | 2 |")]
#[case("![alt](pic.png \"A title\")")]
#[case("---")]
#[case(r"2\. apples")]
#[case(r"2024\. a good year")]
#[case(r"\* starred")]
#[case(r"\> not a quote")]
#[case(r"\# hash")]
#[case("\\| a | b |\n\\| - | - |")]
#[case(r"## Title \#")]
#[case("- a\n  - x\n- b")]
#[case("1. one\n   - x\n2. two\n3. three\n   - y")]
#[case("> a\n>\n> b")]
#[case("|  |  |\n| --- | --- |\n| a | b |")]
fn document_markdown_is_stable(#[case] markdown: &str) {
    init_logging();
    let parser = Parser::new(Arc::new(VariantRegistry::with_defaults()));

    let doc = parser.parse_document(markdown);
    assert_eq!(parser.to_markdown(&doc), markdown);
}

#[test]
fn code_fence_language_is_kept_raw_and_normalised_in_markup() {
    let parser = Parser::new(Arc::new(VariantRegistry::with_defaults()));

    let blocks = parser.parse("```js\nconsole.log(1)\n```");

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].content, "console.log(1)");
    assert_eq!(
        blocks[0].kind,
        BlockKind::Code {
            language: Some("js".to_string())
        }
    );
    assert!(blocks[0].markup.contains("language-javascript"));
}

#[rstest]
#[case("- [x] done", "done", true)]
#[case("- [ ] todo", "todo", false)]
fn task_items_parse(#[case] markdown: &str, #[case] content: &str, #[case] checked: bool) {
    let parser = Parser::new(Arc::new(VariantRegistry::with_defaults()));

    let blocks = parser.parse(markdown);

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].tag(), VariantTag::TaskList);
    assert_eq!(blocks[0].content, content);
    assert_eq!(blocks[0].checked, checked);
}

#[test]
fn unterminated_fence_is_not_code() {
    let registry = VariantRegistry::with_defaults();
    let code = registry.get(VariantTag::Code).unwrap();

    assert!(!code.can_parse_markdown("```\nno closing"));
    assert!(code.parse_from_markdown("```\nno closing").is_none());

    let parser = Parser::new(Arc::new(registry));
    let blocks = parser.parse("```\nno closing");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].tag(), VariantTag::Paragraph);
}

#[rstest]
#[case("2. apples")]
#[case("2024. a good year")]
#[case("* starred")]
#[case("> not a quote")]
#[case("# hash")]
#[case("| a | b |\n| - | - |")]
#[case("first\n---")]
fn paragraph_text_never_becomes_another_block(#[case] content: &str) {
    init_logging();
    let parser = Parser::new(Arc::new(VariantRegistry::with_defaults()));
    let doc = Document::from_blocks(vec![Block::paragraph(content)]);

    let blocks = parser.parse(&parser.to_markdown(&doc));

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].tag(), VariantTag::Paragraph);
    assert_eq!(blocks[0].content, content);
}

#[test]
fn nested_list_keeps_its_item() {
    let parser = Parser::new(Arc::new(VariantRegistry::with_defaults()));

    let blocks = parser.parse("- a\n  - x\n- b");

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].content, "a\nb");
    assert_eq!(blocks[0].children.len(), 1);
    assert_eq!(blocks[0].children[0].item, Some(0));
    assert!(blocks[0].markup.starts_with("<ul>\n<li>a\n<ul>"));
}

#[test]
fn quote_paragraphs_survive_the_parser() {
    let parser = Parser::new(Arc::new(VariantRegistry::with_defaults()));
    let doc = Document::from_blocks(vec![Block::new(BlockKind::Quote, "a\n\nb")]);

    let markdown = parser.to_markdown(&doc);
    let blocks = parser.parse(&markdown);

    assert_eq!(markdown, "> a\n>\n> b");
    assert_eq!(blocks, vec![Block::new(BlockKind::Quote, "a\n\nb")]);
    assert_eq!(parser.parse_markup(&blocks[0].markup), blocks);
}

#[test]
fn indented_code_keeps_task_syntax() {
    let parser = Parser::new(Arc::new(VariantRegistry::with_defaults()));

    let blocks = parser.parse("intro\n\n    - [x] literal");

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].tag(), VariantTag::Code);
    assert_eq!(blocks[1].content, "- [x] literal");
}

#[test]
fn table_with_empty_header_stays_a_table() {
    let parser = Parser::new(Arc::new(VariantRegistry::with_defaults()));
    let table = TableVariant::table(TableData {
        headers: vec![],
        alignments: vec![],
        rows: vec![vec!["a".to_string(), "b".to_string()]],
    });
    let doc = Document::from_blocks(vec![table]);

    let blocks = parser.parse(&parser.to_markdown(&doc));

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].tag(), VariantTag::Table);
    assert_eq!(
        blocks[0].kind,
        BlockKind::Table {
            headers: vec![],
            alignments: vec![Alignment::None, Alignment::None],
            rows: vec![vec!["a".to_string(), "b".to_string()]],
        }
    );
}
