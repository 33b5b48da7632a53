use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub chunking: ChunkingConfig,
    pub retry: RetryConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub translate_path: String,
    pub languages_path: String,
    pub login_path: String,
    pub logout_path: String,
    pub check_auth_path: String,
    pub model: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_chunk_size: usize,
    pub overlap_size: usize,
    pub context_size: usize,
    pub max_document_words: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub jitter_min: f64,
    pub jitter_max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub concurrency_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "longform-translator".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            translate_path: "/translate-chunk".to_string(),
            languages_path: "/languages".to_string(),
            login_path: "/login".to_string(),
            logout_path: "/logout".to_string(),
            check_auth_path: "/check-auth".to_string(),
            model: None,
            timeout_seconds: 300,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 500,
            overlap_size: 50,
            context_size: 100,
            max_document_words: 50_000,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            jitter_min: 0.85,
            jitter_max: 1.15,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl AppConfig {
    pub fn load_from_file(path: &str) -> crate::utils::errors::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::utils::errors::TranslatorError::ConfigError(e.to_string()))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::utils::errors::TranslatorError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&str>) -> Self {
        let mut config = if let Some(p) = path {
            Self::load_from_file(p).unwrap_or_default()
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config
    }

    /// `TRANSLATOR_API_URL` overrides the endpoint base URL.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TRANSLATOR_API_URL") {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
    }

    pub fn validate(&self) -> crate::utils::errors::Result<()> {
        use crate::utils::errors::TranslatorError::ConfigError;

        if self.chunking.max_chunk_size == 0 {
            return Err(ConfigError("chunking.max_chunk_size must be positive".into()));
        }
        if self.chunking.overlap_size >= self.chunking.max_chunk_size {
            return Err(ConfigError(format!(
                "chunking.overlap_size ({}) must be smaller than max_chunk_size ({})",
                self.chunking.overlap_size, self.chunking.max_chunk_size
            )));
        }
        if self.scheduler.concurrency_limit == 0 {
            return Err(ConfigError("scheduler.concurrency_limit must be at least 1".into()));
        }
        if !(self.retry.jitter_min > 0.0 && self.retry.jitter_min <= self.retry.jitter_max) {
            return Err(ConfigError(format!(
                "retry jitter range [{}, {}] is invalid",
                self.retry.jitter_min, self.retry.jitter_max
            )));
        }
        Ok(())
    }

    pub fn job_config(&self, target_language: &str) -> JobConfig {
        JobConfig {
            target_language: target_language.to_string(),
            chunking: self.chunking.clone(),
            retry: self.retry.clone(),
            concurrency_limit: self.scheduler.concurrency_limit,
        }
    }
}

/// Per-job settings projected out of [`AppConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub target_language: String,
    pub chunking: ChunkingConfig,
    pub retry: RetryConfig,
    pub concurrency_limit: usize,
}

impl JobConfig {
    pub fn new(target_language: &str) -> Self {
        AppConfig::default().job_config(target_language)
    }
}

/// Credentials for the translation endpoint's session login.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn from_env() -> Option<Self> {
        let username = std::env::var("TRANSLATOR_USERNAME").ok()?;
        let password = std::env::var("TRANSLATOR_PASSWORD").ok()?;
        Some(Self { username, password })
    }
}
