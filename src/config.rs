//! Layered configuration loaded with figment.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `~/.daily-bread/config.toml`
//! 3. `./daily-bread.toml`
//! 4. `DAILY_BREAD_*` environment variables (`__` separates sections, so
//!    `DAILY_BREAD_GENAI__API_KEY` maps to `genai.api_key`)
//!
//! `GEMINI_API_KEY` or `API_KEY` fill in the service key when none of the
//! layers set one.

use std::path::PathBuf;

use directories::BaseDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, StoreError};

/// Folder name used beneath the user's home directory for application data.
pub const DATA_DIR_NAME: &str = ".daily-bread";
const CONFIG_FILE_NAME: &str = "config.toml";
const PROJECT_CONFIG_FILE: &str = "daily-bread.toml";
const ENV_PREFIX: &str = "DAILY_BREAD_";
const API_KEY_FALLBACKS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

fn default_db_file() -> String {
    "daily-bread.sqlite".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

const fn default_studies_per_journey() -> usize {
    7
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Overrides `~/.daily-bread`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// SQLite file name inside the data directory.
    #[serde(default = "default_db_file")]
    pub db_file: String,

    /// `tracing` filter directive used when `DAILY_BREAD_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// How many studies make up the guided journey.
    #[serde(default = "default_studies_per_journey")]
    pub studies_per_journey: usize,

    #[serde(default)]
    pub genai: GenAiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            db_file: default_db_file(),
            log_filter: default_log_filter(),
            studies_per_journey: default_studies_per_journey(),
            genai: GenAiConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_text_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_speech_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}

fn default_voice() -> String {
    "Kore".to_string()
}

fn default_language() -> String {
    "English".to_string()
}

/// Settings for the generative content service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenAiConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_text_model")]
    pub text_model: String,

    #[serde(default = "default_speech_model")]
    pub speech_model: String,

    #[serde(default = "default_voice")]
    pub voice: String,

    /// Language the prompts ask the model to answer in.
    #[serde(default = "default_language")]
    pub language: String,

    /// Unset means no timeout: requests fire once and wait.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            text_model: default_text_model(),
            speech_model: default_speech_model(),
            voice: default_voice(),
            language: default_language(),
            request_timeout_secs: None,
        }
    }
}

impl GenAiConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl AppConfig {
    /// Load configuration from every source.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config: Self = Self::figment().extract()?;
        config.apply_key_fallback(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Build the provider chain. Public so tests can layer extra providers.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(PROJECT_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Directory holding the database, the log file and exported audio.
    pub fn resolved_data_dir(&self) -> Result<PathBuf, StoreError> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let base_dirs = BaseDirs::new().ok_or(StoreError::NoDataDir)?;
        Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
    }

    pub fn db_path(&self) -> Result<PathBuf, StoreError> {
        Ok(self.resolved_data_dir()?.join(&self.db_file))
    }

    fn global_config_path() -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| dirs.home_dir().join(DATA_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    fn apply_key_fallback<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.genai.is_configured() {
            return;
        }
        if let Some(key) = API_KEY_FALLBACKS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
        {
            self.genai.api_key = key;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = AppConfig::default();
        assert!(config.data_dir.is_none());
        assert_eq!(config.db_file, "daily-bread.sqlite");
        assert_eq!(config.studies_per_journey, 7);
        assert!(!config.genai.is_configured());
        assert!(config.genai.request_timeout_secs.is_none());
    }

    #[test]
    fn toml_layer_overrides_defaults() {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string(
                r#"
                studies_per_journey = 5

                [genai]
                api_key = "secret"
                request_timeout_secs = 30
                "#,
            ))
            .extract()
            .expect("should extract");

        assert_eq!(config.studies_per_journey, 5);
        assert_eq!(config.genai.api_key, "secret");
        assert_eq!(config.genai.request_timeout_secs, Some(30));
        assert_eq!(config.genai.voice, "Kore");
    }

    #[test]
    fn key_fallback_only_fills_missing_key() {
        let mut config = AppConfig::default();
        config.apply_key_fallback(|name| (name == "API_KEY").then(|| "from-env".to_string()));
        assert_eq!(config.genai.api_key, "from-env");

        config.apply_key_fallback(|_| Some("other".to_string()));
        assert_eq!(config.genai.api_key, "from-env");
    }

    #[test]
    fn explicit_data_dir_wins() {
        let config = AppConfig {
            data_dir: Some(PathBuf::from("/tmp/bread")),
            ..AppConfig::default()
        };
        assert_eq!(
            config.db_path().unwrap(),
            PathBuf::from("/tmp/bread/daily-bread.sqlite")
        );
    }
}
