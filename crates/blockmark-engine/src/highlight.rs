//! Syntax highlighting collaborator used when code blocks render to markup.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("highlighter failed: {0}")]
    Failed(String),
}

pub trait SyntaxHighlighter: Send + Sync {
    /// Render `code` as markup for `language` (a canonical key, or empty).
    fn highlight(&self, code: &str, language: &str) -> Result<String, HighlightError>;

    /// Canonical key for a language name, or `None` if the name is blank.
    fn normalize_language(&self, name: &str) -> Option<String>;
}

/// Short names and their canonical keys.
const ALIASES: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("mjs", "javascript"),
    ("node", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("py", "python"),
    ("python3", "python"),
    ("rs", "rust"),
    ("rb", "ruby"),
    ("sh", "bash"),
    ("shell", "bash"),
    ("zsh", "bash"),
    ("console", "bash"),
    ("yml", "yaml"),
    ("md", "markdown"),
    ("htm", "html"),
    ("xhtml", "html"),
    ("c++", "cpp"),
    ("cc", "cpp"),
    ("cs", "csharp"),
    ("c#", "csharp"),
    ("golang", "go"),
    ("kt", "kotlin"),
    ("ps1", "powershell"),
    ("text", "plaintext"),
    ("txt", "plaintext"),
];

/// Highlighter that performs no colouring: it escapes the code and knows the
/// alias table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl SyntaxHighlighter for PlainHighlighter {
    fn highlight(&self, code: &str, _language: &str) -> Result<String, HighlightError> {
        Ok(html_escape::encode_text(code).into_owned())
    }

    fn normalize_language(&self, name: &str) -> Option<String> {
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            return None;
        }
        let canonical = ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, canonical)| (*canonical).to_string())
            .unwrap_or(name);
        Some(canonical)
    }
}
