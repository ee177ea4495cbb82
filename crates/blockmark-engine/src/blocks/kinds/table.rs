//! Pipe tables.
//!
//! The payload (`headers`, `alignments`, `rows`) is authoritative; `content`
//! always holds the same table rendered as pipe-table markdown.

use blockmark_markup::{Element, MarkupSpan, elements};

use crate::blocks::kinds::{single_line, span_inner};
use crate::blocks::{BlockVariant, Capabilities, SerializeOptions, VariantDescriptor};
use crate::error::TransformError;
use crate::models::{Alignment, Block, BlockKind, VariantTag};
use crate::parsing::inline::{inline_markdown_to_markup, markup_to_inline_markdown};

static DESCRIPTOR: VariantDescriptor = VariantDescriptor {
    tag: VariantTag::Table,
    name: "Table",
    capabilities: Capabilities::MULTILINE.union(Capabilities::STRUCTURED),
    triggers: &[],
    priority: 70,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    pub headers: Vec<String>,
    pub alignments: Vec<Alignment>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    fn into_kind(self) -> BlockKind {
        BlockKind::Table {
            headers: self.headers,
            alignments: self.alignments,
            rows: self.rows,
        }
    }

    fn of(block: &Block) -> TableData {
        match &block.kind {
            BlockKind::Table {
                headers,
                alignments,
                rows,
            } => TableData {
                headers: headers.clone(),
                alignments: alignments.clone(),
                rows: rows.clone(),
            },
            _ => TableData::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableVariant;

impl TableVariant {
    /// Build a table block; `content` is rendered from the payload.
    pub fn table(data: TableData) -> Block {
        let content = render_table_content(&data);
        Block::new(data.into_kind(), content)
    }
}

impl BlockVariant for TableVariant {
    fn descriptor(&self) -> &VariantDescriptor {
        &DESCRIPTOR
    }

    fn serialize_to_markdown(&self, block: &Block, _options: &SerializeOptions) -> String {
        render_table_content(&TableData::of(block))
    }

    fn serialize_to_markup(&self, block: &Block) -> String {
        let data = TableData::of(block);
        let mut out = String::from("<table>\n");
        if !data.headers.is_empty() {
            out.push_str("<thead>\n");
            push_row(&mut out, "th", &data.headers, &data.alignments);
            out.push_str("</thead>\n");
        }
        if !data.rows.is_empty() {
            out.push_str("<tbody>\n");
            for row in &data.rows {
                push_row(&mut out, "td", row, &data.alignments);
            }
            out.push_str("</tbody>\n");
        }
        out.push_str("</table>");
        out
    }

    fn can_parse_markup(&self, span: &MarkupSpan) -> bool {
        span.tag == "table"
    }

    fn parse_from_markup(&self, span: &MarkupSpan) -> Option<Block> {
        if !self.can_parse_markup(span) {
            return None;
        }
        let inner = span_inner(span);
        let mut trs = Vec::new();
        collect_rows(inner, &mut trs);

        let mut data = TableData::default();
        for (i, (tr, source)) in trs.iter().enumerate() {
            let cells: Vec<Element> = elements(tr.inner_markup(source))
                .into_iter()
                .filter(|el| el.name == "th" || el.name == "td")
                .collect();
            let row_source = tr.inner_markup(source);
            let texts: Vec<String> = cells
                .iter()
                .map(|cell| escape_pipes(&single_line(&markup_to_inline_markdown(cell.inner_markup(row_source)))))
                .collect();
            if i == 0 {
                data.alignments = cells.iter().map(cell_alignment).collect();
                data.headers = trim_trailing_empty(texts);
            } else {
                data.rows.push(trim_trailing_empty(texts));
            }
        }
        Some(Self::table(data))
    }

    fn can_parse_markdown(&self, text: &str) -> bool {
        let mut lines = text.trim().lines();
        let (Some(header), Some(separator)) = (lines.next(), lines.next()) else {
            return false;
        };
        if !header.contains('|') {
            return false;
        }
        match parse_separator(separator) {
            Some(alignments) => alignments.len() == split_cells(header).len(),
            None => false,
        }
    }

    fn parse_from_markdown(&self, text: &str) -> Option<Block> {
        if !self.can_parse_markdown(text) {
            return None;
        }
        Some(Self::table(parse_table_content(text)))
    }

    fn apply_transformation(&self, block: &mut Block, seed: &str) -> Result<(), TransformError> {
        let data = if seed.trim().lines().count() < 2 {
            // A single line becomes the header row
            TableData {
                headers: split_row(seed.trim()),
                ..TableData::default()
            }
        } else {
            parse_table_content(seed)
        };
        block.kind = data.clone().into_kind();
        block.checked = false;
        block.set_content(render_table_content(&data));
        block.touch();
        Ok(())
    }

    fn plain_text(&self, block: &Block) -> String {
        let data = TableData::of(block);
        std::iter::once(&data.headers)
            .chain(data.rows.iter())
            .filter(|row| !row.is_empty())
            .map(|row| row.join(" | "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse `header | separator | rows` table text.
///
/// Fewer than two lines yields an empty table. The second line is skipped
/// only when it is a separator row; otherwise it is data.
pub fn parse_table_content(content: &str) -> TableData {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < 2 {
        return TableData::default();
    }

    let headers = split_row(lines[0]);
    let (alignments, body) = match parse_separator(lines[1]) {
        Some(alignments) => (alignments, &lines[2..]),
        None => (vec![Alignment::None; headers.len()], &lines[1..]),
    };
    let rows = body.iter().map(|line| split_row(line)).collect();

    TableData {
        headers,
        alignments,
        rows,
    }
}

/// Render a table as pipe-table markdown. An empty table renders as `""`.
///
/// The header row is padded with empty cells to the widest row.
pub fn render_table_content(data: &TableData) -> String {
    if data.is_empty() {
        return String::new();
    }
    let width = data
        .rows
        .iter()
        .map(Vec::len)
        .chain([data.headers.len(), 1])
        .max()
        .unwrap_or(1);
    let mut headers = data.headers.clone();
    headers.resize(width, String::new());
    let separator: Vec<&str> = (0..width)
        .map(|i| match data.alignments.get(i).copied().unwrap_or_default() {
            Alignment::None => "---",
            Alignment::Left => ":--",
            Alignment::Center => ":-:",
            Alignment::Right => "--:",
        })
        .collect();

    let mut lines = vec![render_row(&headers), render_row(&separator)];
    lines.extend(data.rows.iter().map(|row| render_row(row)));
    lines.join("\n")
}

/// Replace one cell. Row 0 is the header; a short row is padded up to the
/// header width.
pub fn edit_cell(block: &mut Block, row: usize, col: usize, text: &str) -> Result<(), TransformError> {
    let BlockKind::Table { headers, rows, .. } = &mut block.kind else {
        return Err(TransformError::Unsupported {
            variant: VariantTag::Table,
        });
    };
    let width = headers.len();
    let target = match row {
        0 => Some(headers),
        n => rows.get_mut(n - 1),
    };
    let Some(cells) = target.filter(|_| col < width) else {
        return Err(TransformError::Invalid {
            variant: VariantTag::Table,
            reason: format!("no cell at row {row}, column {col}"),
        });
    };
    if cells.len() <= col {
        cells.resize(col + 1, String::new());
    }
    cells[col] = escape_pipes(&single_line(text));

    let content = render_table_content(&TableData::of(block));
    block.set_content(content);
    block.touch();
    Ok(())
}

fn render_row<S: AsRef<str>>(cells: &[S]) -> String {
    if cells.is_empty() {
        return "|".to_string();
    }
    let cells: Vec<&str> = cells.iter().map(AsRef::as_ref).collect();
    format!("| {} |", cells.join(" | "))
}

/// Split a row on unescaped pipes, dropping the outer pipes and any empty
/// trailing cells.
fn split_row(line: &str) -> Vec<String> {
    trim_trailing_empty(split_cells(line))
}

/// Every cell between unescaped pipes, empty ones included.
fn split_cells(line: &str) -> Vec<String> {
    let line = line.trim();
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in line.chars() {
        match c {
            '|' if !escaped => cells.push(std::mem::take(&mut current)),
            _ => {
                escaped = c == '\\' && !escaped;
                current.push(c);
            }
        }
    }
    cells.push(current);

    if line.starts_with('|') {
        cells.remove(0);
    }
    if line.len() > 1 && line.ends_with('|') && !line.ends_with("\\|") {
        cells.pop();
    }
    cells.into_iter().map(|c| c.trim().to_string()).collect()
}

fn trim_trailing_empty(mut cells: Vec<String>) -> Vec<String> {
    while cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

fn parse_separator(line: &str) -> Option<Vec<Alignment>> {
    if !line.contains('-') {
        return None;
    }
    let cells = split_row(line);
    if cells.is_empty() {
        return None;
    }
    cells
        .iter()
        .map(|cell| {
            let left = cell.starts_with(':');
            let right = cell.ends_with(':');
            let dashes = cell.trim_matches(':');
            if dashes.is_empty() || !dashes.chars().all(|c| c == '-') {
                return None;
            }
            Some(match (left, right) {
                (true, true) => Alignment::Center,
                (true, false) => Alignment::Left,
                (false, true) => Alignment::Right,
                (false, false) => Alignment::None,
            })
        })
        .collect()
}

fn escape_pipes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = None;
    for c in text.chars() {
        if c == '|' && prev != Some('\\') {
            out.push('\\');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

fn push_row(out: &mut String, cell: &str, cells: &[String], alignments: &[Alignment]) {
    out.push_str("<tr>");
    for (i, text) in cells.iter().enumerate() {
        match alignments.get(i).copied().unwrap_or_default() {
            Alignment::None => out.push_str(&format!("<{cell}>")),
            Alignment::Left => out.push_str(&format!("<{cell} style=\"text-align: left\">")),
            Alignment::Center => out.push_str(&format!("<{cell} style=\"text-align: center\">")),
            Alignment::Right => out.push_str(&format!("<{cell} style=\"text-align: right\">")),
        }
        out.push_str(&inline_markdown_to_markup(text));
        out.push_str(&format!("</{cell}>"));
    }
    out.push_str("</tr>\n");
}

/// Every `<tr>`, looking through `thead`, `tbody` and `tfoot`.
fn collect_rows<'a>(markup: &'a str, out: &mut Vec<(Element, &'a str)>) {
    for el in elements(markup) {
        match el.name.as_str() {
            "tr" => out.push((el, markup)),
            "thead" | "tbody" | "tfoot" => collect_rows(el.inner_markup(markup), out),
            _ => {}
        }
    }
}

fn cell_alignment(cell: &Element) -> Alignment {
    let from_style = cell.attr("style").and_then(|style| {
        style.split(';').find_map(|decl| {
            let (key, value) = decl.split_once(':')?;
            (key.trim() == "text-align").then(|| value.trim().to_ascii_lowercase())
        })
    });
    match from_style.as_deref().or(cell.attr("align")) {
        Some("left") => Alignment::Left,
        Some("center") => Alignment::Center,
        Some("right") => Alignment::Right,
        _ => Alignment::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockmark_markup::segment;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sample() -> TableData {
        TableData {
            headers: strings(&["Name", "Age"]),
            alignments: vec![Alignment::Left, Alignment::Right],
            rows: vec![strings(&["Ada", "36"]), strings(&["Alan", "41"])],
        }
    }

    #[rstest]
    #[case("| a | b |", &["a", "b"])]
    #[case("a | b", &["a", "b"])]
    #[case("| a | b |  |  |", &["a", "b"])]
    #[case(r"| a \| b | c |", &[r"a \| b", "c"])]
    #[case("|", &[])]
    fn splits_rows(#[case] line: &str, #[case] cells: &[&str]) {
        assert_eq!(split_row(line), strings(cells));
    }

    #[test]
    fn parses_content_with_alignment() {
        let data = parse_table_content("| Name | Age |\n| :-- | --: |\n| Ada | 36 |\n| Alan | 41 |");
        assert_eq!(data, sample());
    }

    #[rstest]
    #[case("")]
    #[case("| only | header |")]
    fn short_content_is_empty(#[case] content: &str) {
        assert!(parse_table_content(content).is_empty());
    }

    #[test]
    fn second_line_is_data_without_separator() {
        let data = parse_table_content("a | b\nc | d");
        assert_eq!(data.headers, strings(&["a", "b"]));
        assert_eq!(data.rows, vec![strings(&["c", "d"])]);
    }

    #[test]
    fn renders_content() {
        assert_eq!(
            render_table_content(&sample()),
            "| Name | Age |\n| :-- | --: |\n| Ada | 36 |\n| Alan | 41 |"
        );
        assert_eq!(render_table_content(&TableData::default()), "");
    }

    #[rstest]
    #[case(sample())]
    #[case(TableData { headers: strings(&["x"]), alignments: vec![Alignment::Center], rows: vec![] })]
    #[case(TableData { headers: strings(&["pipe \\| here", "b"]), alignments: vec![Alignment::None; 2], rows: vec![strings(&["**bold**"])] })]
    fn markdown_round_trip(#[case] data: TableData) {
        let block = TableVariant::table(data);
        let md = TableVariant.serialize_to_markdown(&block, &SerializeOptions::default());
        assert_eq!(TableVariant.parse_from_markdown(&md), Some(block));
    }

    #[test]
    fn empty_header_is_padded_to_the_body() {
        let data = TableData {
            headers: vec![],
            alignments: vec![],
            rows: vec![strings(&["a", "b"])],
        };
        let md = render_table_content(&data);
        assert_eq!(md, "|  |  |\n| --- | --- |\n| a | b |");

        let block = TableVariant.parse_from_markdown(&md).unwrap();
        assert_eq!(block.tag(), VariantTag::Table);
        assert_eq!(TableData::of(&block).headers, Vec::<String>::new());
        assert_eq!(TableData::of(&block).rows, vec![strings(&["a", "b"])]);
    }

    #[test]
    fn short_header_is_padded_to_the_body() {
        let data = TableData {
            headers: strings(&["h"]),
            alignments: vec![Alignment::None],
            rows: vec![strings(&["a", "b"])],
        };
        assert_eq!(render_table_content(&data), "| h |  |\n| --- | --- |\n| a | b |");
    }

    #[test]
    fn markdown_needs_matching_separator() {
        assert!(TableVariant.can_parse_markdown("a | b\n--- | ---"));
        assert!(!TableVariant.can_parse_markdown("a | b\n---"));
        assert!(!TableVariant.can_parse_markdown("a | b"));
        assert!(!TableVariant.can_parse_markdown("plain\n---"));
    }

    #[test]
    fn markup_round_trip() {
        let block = TableVariant::table(sample());
        let markup = TableVariant.serialize_to_markup(&block);
        assert_eq!(
            markup,
            "<table>\n<thead>\n<tr><th style=\"text-align: left\">Name</th><th style=\"text-align: right\">Age</th></tr>\n</thead>\n<tbody>\n<tr><td style=\"text-align: left\">Ada</td><td style=\"text-align: right\">36</td></tr>\n<tr><td style=\"text-align: left\">Alan</td><td style=\"text-align: right\">41</td></tr>\n</tbody>\n</table>"
        );
        let span = segment(&markup).remove(0);
        assert_eq!(TableVariant.parse_from_markup(&span), Some(block));
    }

    #[test]
    fn markup_reads_align_attribute() {
        let span = segment("<table><tr><th align=\"center\">h</th></tr><tr><td>v</td></tr></table>").remove(0);
        let block = TableVariant.parse_from_markup(&span).unwrap();
        assert_eq!(
            TableData::of(&block),
            TableData {
                headers: strings(&["h"]),
                alignments: vec![Alignment::Center],
                rows: vec![strings(&["v"])],
            }
        );
    }

    #[test]
    fn plain_text_flattens_rows() {
        let block = TableVariant::table(sample());
        assert_eq!(TableVariant.plain_text(&block), "Name | Age\nAda | 36\nAlan | 41");
    }

    #[test]
    fn flattened_text_converts_back() {
        let mut block = Block::paragraph("Name | Age\nAda | 36");
        TableVariant
            .apply_transformation(&mut block, "Name | Age\nAda | 36")
            .unwrap();
        let data = TableData::of(&block);
        assert_eq!(data.headers, strings(&["Name", "Age"]));
        assert_eq!(data.rows, vec![strings(&["Ada", "36"])]);
        assert_eq!(block.content, "| Name | Age |\n| --- | --- |\n| Ada | 36 |");
    }

    #[test]
    fn single_line_seed_becomes_header() {
        let mut block = Block::paragraph("a | b");
        TableVariant.apply_transformation(&mut block, "a | b").unwrap();
        assert_eq!(TableData::of(&block).headers, strings(&["a", "b"]));
    }

    #[test]
    fn edits_cells() {
        let mut block = TableVariant::table(sample());
        edit_cell(&mut block, 2, 1, "42").unwrap();
        edit_cell(&mut block, 0, 0, "Who").unwrap();
        assert_eq!(block.content, "| Who | Age |\n| :-- | --: |\n| Ada | 36 |\n| Alan | 42 |");

        assert!(matches!(
            edit_cell(&mut block, 5, 0, "x"),
            Err(TransformError::Invalid { .. })
        ));
        assert!(matches!(
            edit_cell(&mut block, 1, 2, "x"),
            Err(TransformError::Invalid { .. })
        ));
    }

    #[test]
    fn edit_cell_rejects_other_blocks() {
        let mut block = Block::paragraph("x");
        assert!(matches!(
            edit_cell(&mut block, 0, 0, "y"),
            Err(TransformError::Unsupported { .. })
        ));
    }
}
