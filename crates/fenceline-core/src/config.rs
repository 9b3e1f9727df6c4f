use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AssistantError, Result};
use crate::provider::Provider;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_LOCALE: &str = "en-US";
const DEFAULT_NAVIGATION_DELAY_MS: u64 = 1500;
const DEFAULT_SPEECH_DELAY_MS: u64 = 500;
const DEFAULT_VOICE_SUBMIT_DELAY_MS: u64 = 100;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub default_model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub ollama_url: Option<String>,
    pub speak_responses: Option<bool>,
    pub locale: Option<String>,
    pub navigation_delay_ms: Option<u64>,
    pub speech_delay_ms: Option<u64>,
    pub voice_submit_delay_ms: Option<u64>,
}

/// Timings and switches the assistant loop runs with
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantSettings {
    /// Speak replies aloud when a synthesizer is available
    pub speak_responses: bool,
    /// Recognition locale
    pub locale: String,
    /// How long a reply stays on screen before its navigation fires
    pub navigation_delay: Duration,
    /// Pause between appending a reply and speaking it
    pub speech_delay: Duration,
    /// Pause between a voice result and its submission
    pub voice_submit_delay: Duration,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            speak_responses: true,
            locale: DEFAULT_LOCALE.to_string(),
            navigation_delay: Duration::from_millis(DEFAULT_NAVIGATION_DELAY_MS),
            speech_delay: Duration::from_millis(DEFAULT_SPEECH_DELAY_MS),
            voice_submit_delay: Duration::from_millis(DEFAULT_VOICE_SUBMIT_DELAY_MS),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::default().as_str().to_string()),
            ..Self::default()
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load from an explicit path; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(Provider::parse)
            .unwrap_or_default()
    }

    /// The configured model, or the provider's default.
    ///
    /// `default_model` only applies to the provider stored in config, so
    /// switching providers never sends a Gemini model name to Ollama.
    pub fn model_for(&self, provider: Provider) -> String {
        match &self.default_model {
            Some(model) if provider == self.provider() => model.clone(),
            _ => provider.default_model().to_string(),
        }
    }

    /// API key for `provider`, environment first, then config
    pub fn api_key_for(&self, provider: Provider) -> Option<String> {
        let (env_var, stored) = match provider {
            Provider::Gemini => ("GEMINI_API_KEY", &self.gemini_api_key),
            Provider::OpenAI => ("OPENAI_API_KEY", &self.openai_api_key),
            Provider::Ollama => return None,
        };
        resolve_key(std::env::var(env_var).ok(), stored.as_ref())
    }

    /// Where the key for `provider` came from, for the settings view
    pub fn key_source(&self, provider: Provider) -> Option<&'static str> {
        let (env_var, stored) = match provider {
            Provider::Gemini => ("GEMINI_API_KEY", &self.gemini_api_key),
            Provider::OpenAI => ("OPENAI_API_KEY", &self.openai_api_key),
            Provider::Ollama => return None,
        };
        if std::env::var(env_var).is_ok_and(|k| !k.trim().is_empty()) {
            Some("env")
        } else if stored.as_ref().is_some_and(|k| !k.trim().is_empty()) {
            Some("config")
        } else {
            None
        }
    }

    pub fn ollama_url(&self) -> &str {
        self.ollama_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL)
    }

    pub fn assistant_settings(&self) -> AssistantSettings {
        let defaults = AssistantSettings::default();
        AssistantSettings {
            speak_responses: self.speak_responses.unwrap_or(defaults.speak_responses),
            locale: self.locale.clone().unwrap_or(defaults.locale),
            navigation_delay: self
                .navigation_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.navigation_delay),
            speech_delay: self
                .speech_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.speech_delay),
            voice_submit_delay: self
                .voice_submit_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.voice_submit_delay),
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(AssistantError::NoConfigDir)?;
        Ok(config_dir.join("fenceline"))
    }
}

fn resolve_key(from_env: Option<String>, stored: Option<&String>) -> Option<String> {
    from_env
        .filter(|k| !k.trim().is_empty())
        .or_else(|| stored.filter(|k| !k.trim().is_empty()).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.provider(), Provider::Gemini);
        assert_eq!(config.assistant_settings(), AssistantSettings::default());
    }

    #[test]
    fn test_save_then_load_keeps_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            provider: Some("ollama".to_string()),
            default_model: Some("mistral:latest".to_string()),
            navigation_delay_ms: Some(2000),
            speak_responses: Some(false),
            ..Config::new()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.provider(), Provider::Ollama);
        assert_eq!(loaded.model_for(Provider::Ollama), "mistral:latest");
        let settings = loaded.assistant_settings();
        assert_eq!(settings.navigation_delay, Duration::from_millis(2000));
        assert!(!settings.speak_responses);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"provider":"openai"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.provider(), Provider::OpenAI);
        assert_eq!(config.ollama_url(), DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_stored_model_does_not_leak_across_providers() {
        let config = Config {
            provider: Some("gemini".to_string()),
            default_model: Some("gemini-1.5-pro".to_string()),
            ..Config::new()
        };
        assert_eq!(config.model_for(Provider::Gemini), "gemini-1.5-pro");
        assert_eq!(config.model_for(Provider::Ollama), "llama3.2:latest");
    }

    #[test]
    fn test_env_key_wins_and_blank_keys_are_ignored() {
        let stored = "from-config".to_string();
        assert_eq!(
            resolve_key(Some("from-env".to_string()), Some(&stored)),
            Some("from-env".to_string())
        );
        assert_eq!(
            resolve_key(Some("  ".to_string()), Some(&stored)),
            Some("from-config".to_string())
        );
        assert_eq!(resolve_key(None, Some(&"".to_string())), None);
    }
}
