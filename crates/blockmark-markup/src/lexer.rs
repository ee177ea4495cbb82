//! # Lexer - Tokenizing Markup
//!
//! The first stage of reading markup: break the source into tags and text
//! runs using the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte in the input appears in exactly one token. Nothing is skipped,
//! so byte ranges taken from tokens always slice back into the source:
//!
//! ```
//! use blockmark_markup::lexer::lex;
//!
//! let input = "<p>Hello <b>world</b></p>";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Token Design
//!
//! Tokens are context-free. The lexer does not know whether `<li>` is
//! nested in a list or stranded at the top level; pairing open and close
//! tags is the job of [`crate::element`].
//!
//! A `<` that does not start a well-formed tag becomes [`TokenKind::Lt`], so
//! truncated markup like `<p>abc <` still lexes.

use std::ops::Range;

use logos::Logos;

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<!-- ... -->`
    #[regex(r"<!--[^>]*-->")]
    Comment,

    /// `</name>`
    #[regex(r"</[A-Za-z][A-Za-z0-9-]*[ \t\r\n]*>")]
    CloseTag,

    /// `<name attr="v">` or `<name />`
    #[regex(r"<[A-Za-z][A-Za-z0-9-]*([ \t\r\n/][^<>]*)?>")]
    OpenTag,

    /// A `<` that does not begin a tag
    #[token("<")]
    Lt,

    /// Run of character data between tags
    #[regex(r"[^<]+")]
    Text,
}

/// A lexed token with its kind, text slice and byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

impl Token<'_> {
    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Text && self.text.trim().is_empty()
    }
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let text = lexer.slice();
        // Unrecognised input degrades to character data
        let kind = result.unwrap_or(TokenKind::Text);
        tokens.push(Token { kind, text, span });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<(TokenKind, &str)> {
        lex(input).into_iter().map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(lex(""), vec![]);
    }

    #[test]
    fn lex_plain_text() {
        assert_eq!(kinds("hello"), vec![(TokenKind::Text, "hello")]);
    }

    #[test]
    fn lex_simple_element() {
        assert_eq!(
            kinds("<p>hi</p>"),
            vec![
                (TokenKind::OpenTag, "<p>"),
                (TokenKind::Text, "hi"),
                (TokenKind::CloseTag, "</p>"),
            ]
        );
    }

    #[test]
    fn lex_attributes_and_self_closing() {
        assert_eq!(
            kinds(r#"<img src="a.png" alt="x" />"#),
            vec![(TokenKind::OpenTag, r#"<img src="a.png" alt="x" />"#)]
        );
        assert_eq!(kinds("<hr/>"), vec![(TokenKind::OpenTag, "<hr/>")]);
    }

    #[test]
    fn lex_comment() {
        assert_eq!(
            kinds("<!-- note --><p>x</p>"),
            vec![
                (TokenKind::Comment, "<!-- note -->"),
                (TokenKind::OpenTag, "<p>"),
                (TokenKind::Text, "x"),
                (TokenKind::CloseTag, "</p>"),
            ]
        );
    }

    #[test]
    fn stray_angle_bracket_is_tolerated() {
        assert_eq!(
            kinds("a < b"),
            vec![
                (TokenKind::Text, "a "),
                (TokenKind::Lt, "<"),
                (TokenKind::Text, " b"),
            ]
        );
    }

    #[test]
    fn all_bytes_preserved() {
        let input = "<h1>T</h1>\n<ul>\n<li>a <code>&lt;x&gt;</code></li>\n</ul>\n<p>trailing <";
        let reconstructed: String = lex(input).iter().map(|t| t.text).collect();
        assert_eq!(input, reconstructed);
    }

    #[test]
    fn spans_are_correct() {
        let input = "<p>hello</p> world";
        for token in lex(input) {
            assert_eq!(token.text, &input[token.span.clone()]);
        }
    }
}
