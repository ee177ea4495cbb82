use std::sync::Arc;

use blockmark_engine::{Cmd, Editor, Parser, VariantRegistry, VariantTag};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Remove(usize),
    Split(usize, usize),
    Merge(usize),
    Type(usize, char),
    Convert(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<usize>().prop_map(Op::Remove),
        (any::<usize>(), any::<usize>()).prop_map(|(b, at)| Op::Split(b, at)),
        any::<usize>().prop_map(Op::Merge),
        (any::<usize>(), prop::sample::select(vec!['a', ' ', '#', '-', '`', '\n'])).prop_map(|(b, c)| Op::Type(b, c)),
        (any::<usize>(), 0..VariantTag::ALL.len()).prop_map(|(b, t)| Op::Convert(b, t)),
    ]
}

fn markdown() -> impl Strategy<Value = String> {
    "[a-z #>*`~|\\-\\[\\]x0-9.\n]{0,80}"
}

proptest! {
    #[test]
    fn document_is_never_empty(ops in prop::collection::vec(op(), 1..40)) {
        let mut editor = Editor::new(Arc::new(VariantRegistry::with_defaults()));
        editor.load_markdown("# start\n\nbody\n\n- a\n- b");

        for op in ops {
            let blocks = editor.document().blocks();
            prop_assert!(!blocks.is_empty());
            let pick = |i: usize| blocks[i % blocks.len()].id;
            let cmd = match op {
                Op::Remove(i) => Cmd::RemoveBlock { block: pick(i) },
                Op::Split(i, at) => Cmd::InsertBlockAfter { block: pick(i), at: at % 8 },
                Op::Merge(i) => Cmd::MergeWithPrevious { block: pick(i) },
                Op::Type(i, c) => Cmd::InsertText { block: pick(i), at: 0, text: c.to_string() },
                Op::Convert(i, t) => Cmd::Convert { block: pick(i), to: VariantTag::ALL[t], typed: None },
            };
            editor.apply(cmd);
            prop_assert!(!editor.document().is_empty());
        }
    }

    #[test]
    fn parsing_is_deterministic(md in markdown()) {
        let parser = Parser::new(Arc::new(VariantRegistry::with_defaults()));
        prop_assert_eq!(parser.parse(&md), parser.parse(&md));
    }

    #[test]
    fn parsed_documents_reserialise(md in markdown()) {
        let parser = Parser::new(Arc::new(VariantRegistry::with_defaults()));
        let doc = parser.parse_document(&md);
        prop_assert!(!doc.is_empty());
        let _ = parser.to_markdown(&doc);
        let _ = parser.to_markup(&doc);
    }
}
