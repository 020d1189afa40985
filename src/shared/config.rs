//! Application configuration. Storage path, AI credentials, worker timings.

use serde::Deserialize;

/// Default upper bound on one provider call, in seconds.
pub const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 30;

/// Default sleep between maintenance cycles, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Default time an item stays `answered` before archiving (one day).
pub const DEFAULT_ARCHIVE_COOLDOWN_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory holding queue.db. Read from COUNSEL_QUEUE_DATA_DIR.
    pub data_dir: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // AI Analysis Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// AI API key (e.g., OpenAI). Read from COUNSEL_QUEUE_AI_API_KEY.
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// AI API URL. Defaults to OpenAI. Read from COUNSEL_QUEUE_AI_API_URL.
    #[serde(default)]
    pub ai_api_url: Option<String>,

    /// AI model name. Defaults to "gpt-4o-mini". Read from COUNSEL_QUEUE_AI_MODEL.
    #[serde(default)]
    pub ai_model: Option<String>,

    /// Read from COUNSEL_QUEUE_ANALYSIS_TIMEOUT_SECS.
    #[serde(default)]
    pub analysis_timeout_secs: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Maintenance Worker
    // ─────────────────────────────────────────────────────────────────────────
    /// Read from COUNSEL_QUEUE_SWEEP_INTERVAL_SECS.
    #[serde(default)]
    pub sweep_interval_secs: Option<u64>,

    /// Read from COUNSEL_QUEUE_ARCHIVE_COOLDOWN_SECS.
    #[serde(default)]
    pub archive_cooldown_secs: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("COUNSEL_QUEUE").try_parsing(true));
        if let Ok(path) = std::env::var("COUNSEL_QUEUE_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Returns the data directory. Defaults to "./data".
    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "data".to_string())
    }

    /// Returns the provider timeout in seconds. Zero is treated as unset.
    pub fn analysis_timeout_secs_or_default(&self) -> u64 {
        self.analysis_timeout_secs
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_ANALYSIS_TIMEOUT_SECS)
    }

    /// Returns maintenance sleep in seconds. Zero is treated as unset.
    pub fn sweep_interval_secs_or_default(&self) -> u64 {
        self.sweep_interval_secs
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS)
    }

    pub fn archive_cooldown_secs_or_default(&self) -> u64 {
        self.archive_cooldown_secs
            .unwrap_or(DEFAULT_ARCHIVE_COOLDOWN_SECS)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // AI Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the AI API key if configured and non-blank.
    pub fn ai_api_key(&self) -> Option<String> {
        self.ai_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
    }

    /// Returns the AI API URL. Defaults to OpenAI chat completions endpoint.
    pub fn ai_api_url_or_default(&self) -> String {
        self.ai_api_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string())
    }

    /// Returns the AI model name. Defaults to "gpt-4o-mini".
    pub fn ai_model_or_default(&self) -> String {
        self.ai_model
            .clone()
            .unwrap_or_else(|| "gpt-4o-mini".to_string())
    }

    /// Returns true if AI is configured (API key present).
    pub fn is_ai_configured(&self) -> bool {
        self.ai_api_key().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.data_dir_or_default(), "data");
        assert_eq!(cfg.analysis_timeout_secs_or_default(), 30);
        assert_eq!(cfg.sweep_interval_secs_or_default(), 60);
        assert_eq!(cfg.archive_cooldown_secs_or_default(), 86_400);
        assert_eq!(cfg.ai_model_or_default(), "gpt-4o-mini");
        assert!(!cfg.is_ai_configured());
    }

    #[test]
    fn test_overrides_and_blank_key() {
        let cfg = AppConfig {
            data_dir: Some("/var/lib/counsel".into()),
            ai_api_key: Some("   ".into()),
            analysis_timeout_secs: Some(0),
            sweep_interval_secs: Some(5),
            archive_cooldown_secs: Some(0),
            ..AppConfig::default()
        };
        assert_eq!(cfg.data_dir_or_default(), "/var/lib/counsel");
        assert!(!cfg.is_ai_configured());
        assert_eq!(cfg.analysis_timeout_secs_or_default(), 30);
        assert_eq!(cfg.sweep_interval_secs_or_default(), 5);
        assert_eq!(cfg.archive_cooldown_secs_or_default(), 0);
    }

    #[test]
    fn test_deserializes_from_map() {
        let cfg: AppConfig = config::Config::builder()
            .set_override("ai_api_key", "sk-test")
            .unwrap()
            .set_override("sweep_interval_secs", 15)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.ai_api_key().as_deref(), Some("sk-test"));
        assert_eq!(cfg.sweep_interval_secs_or_default(), 15);
    }
}
