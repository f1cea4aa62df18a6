//! Configuration loaded from `letterhub.toml`.
//!
//! Every field has a default, so a missing file or a partial file both work.
//! `LETTERHUB_DATA_DIR` and `LETTERHUB_WEBHOOK_URL` override the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::workflow::{EngineSettings, RevisionPolicy};

pub const CONFIG_FILE: &str = "letterhub.toml";

/// Backoff used when a save loses an optimistic-concurrency race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Reload-and-retry attempts before the change is reported as failed.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// delay = base_delay_ms * 2^(attempt - 1)
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        self.base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterHubConfig {
    /// Directory holding the order document.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Mailer webhook; notifications are only logged when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,

    #[serde(default = "default_notify_timeout_ms")]
    pub notify_timeout_ms: u64,

    #[serde(default = "default_escalation_threshold")]
    pub escalation_threshold: u32,

    #[serde(default = "default_max_proof_rounds")]
    pub max_proof_rounds: u32,

    #[serde(default)]
    pub conflict_retry: RetryConfig,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".letterhub")
}

fn default_notify_timeout_ms() -> u64 {
    5000
}

fn default_escalation_threshold() -> u32 {
    3
}

fn default_max_proof_rounds() -> u32 {
    4
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    50
}

impl Default for LetterHubConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            webhook_url: None,
            notify_timeout_ms: default_notify_timeout_ms(),
            escalation_threshold: default_escalation_threshold(),
            max_proof_rounds: default_max_proof_rounds(),
            conflict_retry: RetryConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl LetterHubConfig {
    /// Loads `letterhub.toml` from the working directory, then applies
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(Path::new(CONFIG_FILE))?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Reads a config file, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("invalid config in {}", path.display()))
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("LETTERHUB_DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("LETTERHUB_WEBHOOK_URL").filter(|v| !v.is_empty()) {
            self.webhook_url = Some(url);
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            retry: self.conflict_retry,
            revision: RevisionPolicy {
                escalation_threshold: self.escalation_threshold,
                max_proof_rounds: self.max_proof_rounds,
            },
            notify_timeout_ms: self.notify_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = LetterHubConfig::default();
        assert_eq!(config.data_dir, PathBuf::from(".letterhub"));
        assert!(config.webhook_url.is_none());
        assert_eq!(config.notify_timeout_ms, 5000);
        assert_eq!(config.escalation_threshold, 3);
        assert_eq!(config.max_proof_rounds, 4);
        assert_eq!(config.conflict_retry.max_retries, 2);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            webhook_url = "https://mailer.internal/hooks/letters"
            escalation_threshold = 2
            log_format = "json"

            [conflict_retry]
            max_retries = 5
        "#;
        let config: LetterHubConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://mailer.internal/hooks/letters")
        );
        assert_eq!(config.escalation_threshold, 2);
        assert_eq!(config.max_proof_rounds, 4);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.conflict_retry.max_retries, 5);
        assert_eq!(config.conflict_retry.base_delay_ms, 50);
    }

    #[test]
    fn retry_exponential_backoff() {
        let retry = RetryConfig {
            max_retries: 5,
            base_delay_ms: 100,
        };
        assert_eq!(retry.delay_for_attempt(1), 100);
        assert_eq!(retry.delay_for_attempt(2), 200);
        assert_eq!(retry.delay_for_attempt(3), 400);
        assert_eq!(retry.delay_for_attempt(80), u64::MAX);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = LetterHubConfig::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.max_proof_rounds, 4);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "escalation_threshold = \"three\"").unwrap();
        assert!(LetterHubConfig::load_from(&path).is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = LetterHubConfig::default();
        config.apply_env(|key| match key {
            "LETTERHUB_DATA_DIR" => Some("/srv/letterhub".to_string()),
            "LETTERHUB_WEBHOOK_URL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.data_dir, PathBuf::from("/srv/letterhub"));
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn engine_settings_mirror_config() {
        let config = LetterHubConfig {
            escalation_threshold: 2,
            max_proof_rounds: 6,
            ..Default::default()
        };
        let settings = config.engine_settings();
        assert_eq!(settings.revision.escalation_threshold, 2);
        assert_eq!(settings.revision.max_proof_rounds, 6);
        assert_eq!(settings.notify_timeout_ms, 5000);
    }
}
