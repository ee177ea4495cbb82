pub mod block_quote;
pub mod code_fence;
pub mod delimiter;
pub mod heading;
pub mod image;
pub mod list;
pub mod paragraph;
pub mod table;
pub mod task_list;

use std::sync::Arc;

use blockmark_config::EditorConfig;
use blockmark_markup::{MarkupSpan, elements};

use crate::blocks::BlockVariant;
use crate::highlight::SyntaxHighlighter;
use crate::models::HeadingLevel;

pub use block_quote::QuoteVariant;
pub use code_fence::{CodeFence, CodeVariant};
pub use delimiter::DelimiterVariant;
pub use heading::HeadingVariant;
pub use image::ImageVariant;
pub use list::ListVariant;
pub use paragraph::ParagraphVariant;
pub use table::TableVariant;
pub use task_list::TaskListVariant;

/// The built-in variants in registration order. Paragraph comes last as
/// the fallback.
pub fn default_variants(
    config: &EditorConfig,
    highlighter: Arc<dyn SyntaxHighlighter>,
) -> Vec<Arc<dyn BlockVariant>> {
    let mut variants: Vec<Arc<dyn BlockVariant>> = HeadingLevel::ALL
        .into_iter()
        .map(|level| Arc::new(HeadingVariant::new(level)) as Arc<dyn BlockVariant>)
        .collect();
    variants.push(Arc::new(CodeVariant::new(
        highlighter,
        config.code.default_language.clone(),
    )));
    variants.push(Arc::new(DelimiterVariant));
    variants.push(Arc::new(TaskListVariant));
    variants.push(Arc::new(ListVariant::unordered()));
    variants.push(Arc::new(ListVariant::ordered()));
    variants.push(Arc::new(QuoteVariant));
    variants.push(Arc::new(TableVariant));
    variants.push(Arc::new(ImageVariant));
    variants.push(Arc::new(ParagraphVariant));
    variants
}

/// Inner markup of a span's element.
pub(crate) fn span_inner(span: &MarkupSpan) -> &str {
    match elements(&span.markup).into_iter().next() {
        Some(el) => &span.markup[el.inner],
        None => &span.markup,
    }
}

/// Join lines into a single line.
pub(crate) fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Leading-space width of a line, tabs counted as four.
pub(crate) fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += 4,
            _ => break,
        }
    }
    width
}
