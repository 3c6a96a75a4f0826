//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::core::errors::{ProviderError, Result};

/// Endpoint for free-tier credentials
pub const FREE_API_ENDPOINT: &str = "https://api-free.deepl.com";

/// Endpoint for pro-tier credentials
pub const PRO_API_ENDPOINT: &str = "https://api.deepl.com";

/// Credential suffix marking a free-tier key
const FREE_KEY_SUFFIX: &str = ":fx";

/// Account class of a DeepL credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiTier {
    Free,
    Pro,
}

impl ApiTier {
    /// Determine the tier from the key format
    pub fn from_api_key(api_key: &str) -> Self {
        if api_key.trim().ends_with(FREE_KEY_SUFFIX) {
            ApiTier::Free
        } else {
            ApiTier::Pro
        }
    }

    /// Default endpoint for this tier
    pub fn endpoint(&self) -> &'static str {
        match self {
            ApiTier::Free => FREE_API_ENDPOINT,
            ApiTier::Pro => PRO_API_ENDPOINT,
        }
    }
}

/// Configuration for the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Requests in flight at once during async batch translation
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: None,
            timeout_secs: default_timeout_secs(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl ProviderConfig {
    /// Create a configuration with default timeout and concurrency
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("DEEPL_API_KEY")
            .map_err(|_| anyhow::anyhow!("DEEPL_API_KEY environment variable is required"))?;

        let endpoint = std::env::var("DEEPL_ENDPOINT").ok();

        let timeout_secs = std::env::var("DEEPL_TIMEOUT_SECS")
            .unwrap_or_else(|_| default_timeout_secs().to_string())
            .parse::<u64>()?;

        let max_concurrent = std::env::var("DEEPL_MAX_CONCURRENT")
            .unwrap_or_else(|_| default_max_concurrent().to_string())
            .parse::<usize>()?;

        Ok(Self {
            api_key,
            endpoint,
            timeout_secs,
            max_concurrent,
        }
        .normalized())
    }

    /// Load an optional config file (TOML, JSON or YAML) with `DEEPL_*`
    /// environment variables layered on top
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = ::config::Config::builder()
            .set_default("api_key", "")?
            .set_default("timeout_secs", default_timeout_secs() as i64)?
            .set_default("max_concurrent", default_max_concurrent() as i64)?;

        if let Some(path) = path {
            debug!("Loading provider config from {}", path.display());
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let config = builder
            .add_source(::config::Environment::with_prefix("DEEPL"))
            .build()?
            .try_deserialize::<Self>()?
            .normalized();

        info!("Loaded provider config ({:?} tier)", config.tier());
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config.normalized())
    }

    /// A blank endpoint means "use the tier default"
    fn normalized(mut self) -> Self {
        self.endpoint = self.endpoint.filter(|e| !e.trim().is_empty());
        self
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::config("API key is required"));
        }

        if let Some(endpoint) = &self.endpoint {
            let url = reqwest::Url::parse(endpoint).map_err(|e| {
                ProviderError::config(format!("Invalid endpoint '{}': {}", endpoint, e))
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ProviderError::config(format!(
                    "Endpoint must use http or https: {}",
                    endpoint
                )));
            }
        }

        if self.timeout_secs == 0 {
            return Err(ProviderError::config("timeout_secs must be greater than 0"));
        }

        if self.max_concurrent == 0 {
            return Err(ProviderError::config("max_concurrent must be greater than 0"));
        }

        Ok(())
    }

    /// Tier implied by the credential
    pub fn tier(&self) -> ApiTier {
        ApiTier::from_api_key(&self.api_key)
    }

    /// Custom endpoint if set, otherwise the tier's default
    pub fn base_url(&self) -> String {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.tier().endpoint())
            .trim_end_matches('/')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_validation() {
        let config = ProviderConfig::new("test-deepl-key:fx");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_missing_key() {
        let config = ProviderConfig::new("   ");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("API key is required"));
    }

    #[test]
    fn test_config_validation_bad_values() {
        let config = ProviderConfig::new("key").with_timeout_secs(0);
        assert!(config.validate().is_err());

        let config = ProviderConfig::new("key").with_max_concurrent(0);
        assert!(config.validate().is_err());

        let config = ProviderConfig::new("key").with_endpoint("not a url");
        assert!(config.validate().is_err());

        let config = ProviderConfig::new("key").with_endpoint("ftp://example.com");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_free_api_key_detection() {
        let config = ProviderConfig::new("test-deepl-key:fx");
        assert_eq!(config.tier(), ApiTier::Free);
        assert_eq!(config.base_url(), "https://api-free.deepl.com");
    }

    #[test]
    fn test_pro_api_key_detection() {
        let config = ProviderConfig::new("test-deepl-key");
        assert_eq!(config.tier(), ApiTier::Pro);
        assert_eq!(config.base_url(), "https://api.deepl.com");
    }

    #[test]
    fn test_custom_endpoint_overrides_tier() {
        let config = ProviderConfig::new("key:fx").with_endpoint("http://localhost:8080/");
        assert_eq!(config.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deepl.json");

        let config = ProviderConfig::new("abc:fx").with_timeout_secs(10);
        config.to_file(&path).unwrap();

        let loaded = ProviderConfig::from_file(&path).unwrap();
        assert_eq!(loaded.api_key, "abc:fx");
        assert_eq!(loaded.timeout_secs, 10);
        assert_eq!(loaded.endpoint, None);
    }

    #[test]
    fn test_from_file_applies_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"api_key": "abc"}}"#).unwrap();

        let loaded = ProviderConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded.timeout_secs, 30);
        assert_eq!(loaded.max_concurrent, 4);
    }

    #[test]
    fn test_layered_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deepl.toml");
        std::fs::write(
            &path,
            "api_key = \"layered:fx\"\nendpoint = \"http://127.0.0.1:9000\"\ntimeout_secs = 5\n",
        )
        .unwrap();

        let config = ProviderConfig::load(Some(&path)).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.max_concurrent, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_endpoint_falls_back_to_tier() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deepl.toml");
        std::fs::write(&path, "api_key = \"blank:fx\"\nendpoint = \"\"\n").unwrap();

        let config = ProviderConfig::load(Some(&path)).unwrap();
        assert_eq!(config.endpoint, None);
        assert!(config.validate().is_ok());
        assert_eq!(config.base_url(), FREE_API_ENDPOINT);

        let json_path = dir.path().join("deepl.json");
        std::fs::write(&json_path, r#"{"api_key": "blank", "endpoint": "  "}"#).unwrap();

        let config = ProviderConfig::from_file(&json_path).unwrap();
        assert_eq!(config.endpoint, None);
        assert_eq!(config.base_url(), PRO_API_ENDPOINT);
    }
}
