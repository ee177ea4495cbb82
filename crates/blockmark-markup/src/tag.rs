//! Open/close tag decoding.
//!
//! The lexer only guarantees that an `OpenTag` token looks like `<name ...>`.
//! This module pulls the name and attributes back out of it.

/// A decoded open tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    /// Lowercased tag name.
    pub name: String,
    /// Attributes in source order; values are entity-decoded. Valueless
    /// attributes (`checked`) carry an empty string.
    pub attrs: Vec<(String, String)>,
    /// `<name />`
    pub self_closing: bool,
}

impl TagInfo {
    pub fn attr(&self, name: &str) -> Option<&str> {
        find_attr(&self.attrs, name)
    }
}

/// Look up an attribute by (case-insensitive) name.
pub fn find_attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Elements that never have a closing tag.
pub const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "col", "wbr"];

pub fn is_void(name: &str) -> bool {
    VOID_TAGS.contains(&name)
}

/// Decode an `OpenTag` token's text.
pub fn parse_open_tag(text: &str) -> Option<TagInfo> {
    let body = text.strip_prefix('<')?.strip_suffix('>')?;
    let (body, self_closing) = match body.strip_suffix('/') {
        Some(rest) => (rest, true),
        None => (body, false),
    };

    let name_end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(body.len());
    if name_end == 0 {
        return None;
    }
    let name = body[..name_end].to_ascii_lowercase();
    let attrs = parse_attrs(&body[name_end..]);

    Some(TagInfo {
        name,
        attrs,
        self_closing,
    })
}

/// Decode a `CloseTag` token's text into its lowercased name.
pub fn parse_close_tag(text: &str) -> Option<String> {
    let body = text.strip_prefix("</")?.strip_suffix('>')?;
    let name = body.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_ascii_lowercase())
    }
}

fn parse_attrs(mut rest: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
        if rest.is_empty() {
            break;
        }

        let key_end = rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();

        let Some(after_eq) = rest.strip_prefix('=') else {
            if !key.is_empty() {
                attrs.push((key, String::new()));
            }
            continue;
        };
        let after_eq = after_eq.trim_start();

        let (raw, remaining) = match after_eq.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let inner = &after_eq[1..];
                match inner.find(q) {
                    Some(end) => (&inner[..end], &inner[end + 1..]),
                    // Unterminated quote: take the rest
                    None => (inner, ""),
                }
            }
            _ => {
                let end = after_eq
                    .find(char::is_whitespace)
                    .unwrap_or(after_eq.len());
                (&after_eq[..end], &after_eq[end..])
            }
        };

        if !key.is_empty() {
            attrs.push((key, html_escape::decode_html_entities(raw).into_owned()));
        }
        rest = remaining;
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn plain_tag() {
        let tag = parse_open_tag("<p>").unwrap();
        assert_eq!(tag.name, "p");
        assert!(tag.attrs.is_empty());
        assert!(!tag.self_closing);
    }

    #[test]
    fn attributes_in_all_quoting_styles() {
        let tag = parse_open_tag(r#"<img src="a.png" alt='A &amp; B' width=40 hidden />"#).unwrap();
        assert_eq!(tag.name, "img");
        assert!(tag.self_closing);
        assert_eq!(tag.attr("src"), Some("a.png"));
        assert_eq!(tag.attr("alt"), Some("A & B"));
        assert_eq!(tag.attr("width"), Some("40"));
        assert_eq!(tag.attr("hidden"), Some(""));
        assert_eq!(tag.attr("title"), None);
    }

    #[test]
    fn names_are_lowercased() {
        let tag = parse_open_tag(r#"<LI Data-Task="true">"#).unwrap();
        assert_eq!(tag.name, "li");
        assert_eq!(tag.attr("data-task"), Some("true"));
    }

    #[test]
    fn unterminated_quote_does_not_panic() {
        let tag = parse_open_tag(r#"<a href="oops>"#).unwrap();
        assert_eq!(tag.attr("href"), Some("oops"));
    }

    #[rstest]
    #[case("</p>", Some("p"))]
    #[case("</UL >", Some("ul"))]
    #[case("</>", None)]
    fn close_tags(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_close_tag(input).as_deref(), expected);
    }
}
