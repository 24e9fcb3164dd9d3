use crate::error::{config_error, env_error, FlyerResult};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Default OpenAI-compatible API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default vision model used for extraction
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default response-length ceiling for the extractor call
pub const DEFAULT_MAX_TOKENS: u32 = 450;
/// Default timeout for a single extractor call
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default upload body limit (10MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Location of the optional configuration file
pub const CONFIG_FILE: &str = "config/flyercal.toml";

/// Settings for the external extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorSettings {
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Response-length ceiling in tokens
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Partial extractor settings as they appear in the config file
#[derive(Debug, Default, Deserialize)]
struct ExtractorFileSettings {
    base_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    extractor: ExtractorFileSettings,
}

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Process-level default credential, used when the user leaves the field empty
    pub openai_api_key: Option<String>,
    /// Extractor settings
    pub extractor: ExtractorSettings,
    /// Address the web server binds to
    pub host: String,
    /// Port the web server listens on
    pub port: u16,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            extractor: ExtractorSettings::default(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> FlyerResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Config {
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            ..Config::default()
        };

        if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
            config.extractor.base_url = base_url;
        }
        if let Ok(model) = env::var("OPENAI_MODEL") {
            config.extractor.model = model;
        }
        if let Ok(value) = env::var("OPENAI_MAX_TOKENS") {
            config.extractor.max_tokens = value
                .parse::<u32>()
                .ok()
                .filter(|tokens| *tokens > 0)
                .ok_or_else(|| env_error("OPENAI_MAX_TOKENS"))?;
        }
        if let Ok(value) = env::var("OPENAI_TIMEOUT_SECS") {
            config.extractor.timeout_secs = value
                .parse::<u64>()
                .map_err(|_| env_error("OPENAI_TIMEOUT_SECS"))?;
        }
        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }
        if let Ok(value) = env::var("PORT") {
            config.port = value.parse::<u16>().map_err(|_| env_error("PORT"))?;
        }
        if let Ok(value) = env::var("MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = value
                .parse::<usize>()
                .map_err(|_| env_error("MAX_UPLOAD_BYTES"))?;
        }

        // Config file values take precedence over environment defaults
        if Path::new(CONFIG_FILE).exists() {
            let content = fs::read_to_string(CONFIG_FILE)?;
            config.apply_file(&content)?;
        }

        Ok(config)
    }

    /// Merge the contents of a TOML config file into this configuration
    pub fn apply_file(&mut self, content: &str) -> FlyerResult<()> {
        let file: FileConfig = toml::from_str(content)?;
        let extractor = file.extractor;

        if let Some(base_url) = extractor.base_url {
            self.extractor.base_url = base_url;
        }
        if let Some(model) = extractor.model {
            self.extractor.model = model;
        }
        if let Some(max_tokens) = extractor.max_tokens {
            if max_tokens == 0 {
                return Err(config_error("extractor.max_tokens must be greater than zero"));
            }
            self.extractor.max_tokens = max_tokens;
        }
        if let Some(timeout_secs) = extractor.timeout_secs {
            self.extractor.timeout_secs = timeout_secs;
        }

        Ok(())
    }

    /// The configured default credential, if it is non-empty
    pub fn default_credential(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_file_overrides_extractor_settings() {
        let mut config = Config::default();
        config
            .apply_file(
                r#"
                [extractor]
                model = "gpt-4o"
                max_tokens = 1200
                "#,
            )
            .unwrap();

        assert_eq!(config.extractor.model, "gpt-4o");
        assert_eq!(config.extractor.max_tokens, 1200);
        assert_eq!(config.extractor.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.extractor.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_empty_file_keeps_defaults() {
        let mut config = Config::default();
        config.apply_file("").unwrap();
        assert_eq!(config.extractor, ExtractorSettings::default());
    }

    #[test]
    fn test_zero_max_tokens_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_file("[extractor]\nmax_tokens = 0\n")
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut config = Config::default();
        let err = config.apply_file("[extractor\nmodel = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_default_credential_ignores_blank_key() {
        let mut config = Config::default();
        assert_eq!(config.default_credential(), None);

        config.openai_api_key = Some("   ".to_string());
        assert_eq!(config.default_credential(), None);

        config.openai_api_key = Some("sk-test".to_string());
        assert_eq!(config.default_credential(), Some("sk-test"));
    }
}
