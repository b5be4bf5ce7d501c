//! Configuration loader for YAML files and environment resolution

use crate::config::types::*;
use crate::errors::AgentError;
use std::env;
use std::path::Path;
use tokio::fs;

/// Overrides the holiday calendar feed.
pub const HOLIDAY_CALENDAR_LINK_ENV: &str = "HOLIDAY_CALENDAR_LINK";
/// Overrides the OpenAI API base URL.
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Configuration loader with environment resolution
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<ParleyConfig, AgentError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).await.map_err(|e| {
            AgentError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_str(&content)
    }

    /// Load the file when it exists, otherwise start from defaults. The
    /// environment is applied in both cases.
    pub async fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<ParleyConfig, AgentError> {
        let path = path.as_ref();
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::from_file(path).await
        } else {
            log::info!("No config file at {}, using defaults", path.display());
            let mut config = ParleyConfig::default();
            Self::apply_env_overrides(&mut config);
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a YAML string
    pub fn from_str(content: &str) -> Result<ParleyConfig, AgentError> {
        let mut config: ParleyConfig = if content.trim().is_empty() {
            ParleyConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| {
                AgentError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?
        };

        Self::apply_env_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Resolves secrets and URL overrides from the process environment.
    pub fn apply_env_overrides(config: &mut ParleyConfig) {
        Self::resolve_llm_auth(&mut config.llm.auth);

        if config.llm.api_base.is_none() {
            if let Ok(base) = env::var(OPENAI_BASE_URL_ENV) {
                if !base.trim().is_empty() {
                    config.llm.api_base = Some(base);
                }
            }
        }

        let weather = &mut config.tools.weather;
        if let Some(env_var) = &weather.api_key_env {
            if let Ok(api_key) = env::var(env_var) {
                weather.api_key = Some(api_key);
            }
        }

        if let Ok(link) = env::var(HOLIDAY_CALENDAR_LINK_ENV) {
            if !link.trim().is_empty() {
                log::debug!("Holiday calendar overridden by {}", HOLIDAY_CALENDAR_LINK_ENV);
                config.tools.holidays.calendar_url = link;
            }
        }
    }

    fn resolve_llm_auth(auth: &mut LlmAuth) {
        if let Some(env_var) = &auth.api_key_env {
            if let Ok(api_key) = env::var(env_var) {
                auth.api_key = Some(api_key);
            }
        }

        if auth.api_key.is_none() && auth.api_key_env.is_none() {
            if let Ok(api_key) = env::var("OPENAI_API_KEY") {
                auth.api_key = Some(api_key);
            }
        }
    }
}
