use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Settings for an editing session. Every section and field is optional in
/// the file; anything missing takes its default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub keys: KeysConfig,
    pub markdown: MarkdownConfig,
    pub code: CodeConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Upper bound on remembered keystrokes. Unset means "as long as the
    /// longest registered trigger".
    pub buffer_capacity: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Marker for unordered and task list items.
    pub bullet: char,
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            bullet: '-',
            indent: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    /// Language given to code blocks opened with a bare fence.
    pub default_language: Option<String>,
}

impl EditorConfig {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: EditorConfig =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.normalize();

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    /// `$BLOCKMARK_CONFIG` when set, otherwise `~/.config/blockmark/config.toml`.
    pub fn config_path() -> PathBuf {
        if let Ok(custom) = std::env::var("BLOCKMARK_CONFIG")
            && let Some(path) = Self::expand_path(Path::new(&custom))
        {
            return path;
        }
        let config_dir = shellexpand::tilde("~/.config/blockmark");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }

    /// Bring hand-edited values back into range.
    fn normalize(&mut self) {
        if self.markdown.bullet != '*' && self.markdown.bullet != '+' {
            self.markdown.bullet = '-';
        }
        if self.markdown.indent == 0 {
            self.markdown.indent = MarkdownConfig::default().indent;
        }
        if let Some(lang) = &self.code.default_language
            && lang.trim().is_empty()
        {
            self.code.default_language = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = EditorConfig::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        if env::var("BLOCKMARK_CONFIG").is_err() {
            assert!(path_str.ends_with(".config/blockmark/config.toml"));
        }
    }

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.keys.buffer_capacity, None);
        assert_eq!(config.markdown.bullet, '-');
        assert_eq!(config.markdown.indent, 2);
        assert_eq!(config.code.default_language, None);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = EditorConfig {
            keys: KeysConfig {
                buffer_capacity: Some(12),
            },
            markdown: MarkdownConfig {
                bullet: '*',
                indent: 4,
            },
            code: CodeConfig {
                default_language: Some("rust".to_string()),
            },
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: EditorConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: EditorConfig = toml::from_str("[code]\ndefault_language = \"python\"\n").unwrap();

        assert_eq!(config.code.default_language.as_deref(), Some("python"));
        assert_eq!(config.markdown, MarkdownConfig::default());
        assert_eq!(config.keys, KeysConfig::default());
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = EditorConfig::expand_path(&path).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("BLOCKMARK_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$BLOCKMARK_TEST_VAR/subdir");
        let expanded = EditorConfig::expand_path(&path).unwrap();

        assert_eq!(expanded, PathBuf::from("/test/env/path/subdir"));

        unsafe {
            env::remove_var("BLOCKMARK_TEST_VAR");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = EditorConfig::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_invalid_toml_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[markdown\nindent = ").unwrap();

        let err = EditorConfig::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let mut test_config = EditorConfig::default();
        test_config.keys.buffer_capacity = Some(8);

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = EditorConfig::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_out_of_range_values_are_normalized() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "[markdown]\nbullet = \"x\"\nindent = 0\n\n[code]\ndefault_language = \"  \"\n",
        )
        .unwrap();

        let loaded = EditorConfig::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded.markdown, MarkdownConfig::default());
        assert_eq!(loaded.code.default_language, None);
    }
}
