//! Optimizer configuration (TOML file + defaults)
//!
//! Every field has a default, so an empty file is a valid configuration.
//!
//! # Example
//! ```
//! use sysopt::config::OptimizerConfig;
//!
//! let config = OptimizerConfig::from_toml_str("performance_threshold = 0.1").unwrap();
//! assert_eq!(config.performance_threshold, 0.1);
//! assert_eq!(config.refresh_interval_secs, 5);
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Average execution time (seconds) above which a syscall is reported
    pub performance_threshold: f64,

    /// Resource impact (percent) above which a syscall is a bottleneck
    pub high_impact_threshold: f64,

    /// Suggested client polling interval, in seconds
    pub refresh_interval_secs: u64,

    /// Baseline refresh cadence, in milliseconds
    pub baseline_period_ms: u64,

    /// Maximum retained history entries (None = unbounded)
    pub history_limit: Option<usize>,

    pub backend: BackendConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            performance_threshold: 0.05,
            high_impact_threshold: 50.0,
            refresh_interval_secs: 5,
            baseline_period_ms: 1000,
            history_limit: None,
            backend: BackendConfig::default(),
        }
    }
}

/// Chat-completions suggestion backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Use the backend when an API key is available
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound for a single suggestion attempt
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama3-8b-8192".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            max_tokens: 75,
            temperature: 0.7,
            timeout_ms: 3000,
        }
    }
}

impl OptimizerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.performance_threshold.is_finite() || self.performance_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "performance_threshold must be a finite value >= 0, got {}",
                self.performance_threshold
            )));
        }

        if !self.high_impact_threshold.is_finite() || self.high_impact_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "high_impact_threshold must be a finite value >= 0, got {}",
                self.high_impact_threshold
            )));
        }

        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_secs must be > 0".to_string(),
            ));
        }

        if self.baseline_period_ms == 0 {
            return Err(ConfigError::Invalid(
                "baseline_period_ms must be > 0".to_string(),
            ));
        }

        if self.history_limit == Some(0) {
            return Err(ConfigError::Invalid(
                "history_limit must be > 0 when set".to_string(),
            ));
        }

        if self.backend.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "backend.timeout_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn baseline_period(&self) -> Duration {
        Duration::from_millis(self.baseline_period_ms)
    }

    pub fn suggestion_timeout(&self) -> Duration {
        Duration::from_millis(self.backend.timeout_ms)
    }
}
