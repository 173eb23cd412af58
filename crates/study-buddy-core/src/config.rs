use crate::backend::{ReplyField, DEFAULT_BASE_URL};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the backend URL from the config file
pub const BACKEND_URL_ENV: &str = "STUDY_BUDDY_URL";

pub const DEFAULT_COPY_FLASH_MS: u64 = 2000;

pub const DEFAULT_SUGGESTIONS: [&str; 4] = [
    "Explain quantum physics",
    "Help me make a study plan",
    "Quiz me on world history",
    "Summarize the water cycle",
];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub backend_url: Option<String>,
    pub reply_field: Option<ReplyField>,
    pub copy_flash_ms: Option<u64>,
    pub suggestions: Option<Vec<String>>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Let `STUDY_BUDDY_URL` override the backend URL from the file
    pub fn with_env(self) -> Self {
        self.with_backend_url_override(std::env::var(BACKEND_URL_ENV).ok())
    }

    pub fn with_backend_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|url| !url.trim().is_empty()) {
            self.backend_url = Some(url);
        }
        self
    }

    pub fn with_reply_field_override(mut self, reply_field: Option<ReplyField>) -> Self {
        if reply_field.is_some() {
            self.reply_field = reply_field;
        }
        self
    }

    pub fn backend_url(&self) -> String {
        self.backend_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn reply_field(&self) -> ReplyField {
        self.reply_field.unwrap_or_default()
    }

    pub fn copy_flash(&self) -> Duration {
        Duration::from_millis(self.copy_flash_ms.unwrap_or(DEFAULT_COPY_FLASH_MS))
    }

    pub fn suggestions(&self) -> Vec<String> {
        match &self.suggestions {
            Some(list) => list
                .iter()
                .filter(|s| !s.trim().is_empty())
                .cloned()
                .collect(),
            None => DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("study-buddy").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();

        assert_eq!(config, Config::new());
        assert_eq!(config.reply_field(), ReplyField::Reply);
        assert_eq!(config.copy_flash(), Duration::from_secs(2));
        assert_eq!(config.suggestions().len(), DEFAULT_SUGGESTIONS.len());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            backend_url: Some("http://buddy.local:8080".to_string()),
            reply_field: Some(ReplyField::Response),
            copy_flash_ms: Some(500),
            suggestions: Some(vec!["Explain photosynthesis".to_string()]),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.copy_flash(), Duration::from_millis(500));
    }

    #[test]
    fn test_reply_field_is_lowercase_in_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"reply_field": "response"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.reply_field(), ReplyField::Response);
        assert_eq!(loaded.backend_url, None);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_backend_url_precedence() {
        let config = Config {
            backend_url: Some("http://from-file:1".to_string()),
            ..Config::default()
        };

        assert_eq!(
            config
                .clone()
                .with_backend_url_override(Some("http://from-env:2".to_string()))
                .backend_url(),
            "http://from-env:2"
        );
        assert_eq!(
            config.clone().with_backend_url_override(Some("  ".to_string())).backend_url(),
            "http://from-file:1"
        );
        assert_eq!(config.with_backend_url_override(None).backend_url(), "http://from-file:1");
        assert_eq!(Config::new().backend_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_reply_field_override() {
        let config = Config {
            reply_field: Some(ReplyField::Response),
            ..Config::default()
        };

        assert_eq!(config.clone().with_reply_field_override(None).reply_field(), ReplyField::Response);
        assert_eq!(
            config.with_reply_field_override("reply".parse().ok()).reply_field(),
            ReplyField::Reply
        );
    }

    #[test]
    fn test_blank_suggestions_are_dropped() {
        let config = Config {
            suggestions: Some(vec!["".to_string(), "Define entropy".to_string()]),
            ..Config::default()
        };
        assert_eq!(config.suggestions(), vec!["Define entropy".to_string()]);
    }
}
