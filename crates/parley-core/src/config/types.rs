//! Configuration type definitions
//!
//! Every section is optional in the YAML file and falls back to defaults
//! that reproduce a stock deployment: OpenAI `gpt-4.1` for replies, `o1`
//! for titles, all four built-in tools enabled, 15 model calls per turn.

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::errors::AgentError;
use crate::tools::holidays::DEFAULT_CALENDAR_URL;
use crate::weather::{WeatherClient, DEFAULT_API_BASE};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub assistant: AssistantSettings,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_title_model")]
    pub title_model: String,
    /// Overrides the provider's default API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default)]
    pub parameters: ModelParameters,
    #[serde(default)]
    pub auth: LlmAuth,
}

/// LLM provider types
///
/// Written in YAML either as a bare name (`provider: openai`) or as a map
/// keyed by `type` (`provider: {type: custom, base_url: ...}`).
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAI,
    Custom {
        base_url: String,
    },
}

impl<'de> Deserialize<'de> for LlmProvider {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Tagged {
                #[serde(rename = "type")]
                kind: String,
                #[serde(default)]
                base_url: Option<String>,
            },
        }

        let (kind, base_url) = match Repr::deserialize(deserializer)? {
            Repr::Name(name) => (name, None),
            Repr::Tagged { kind, base_url } => (kind, base_url),
        };

        match kind.to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "custom" => base_url
                .map(|base_url| LlmProvider::Custom { base_url })
                .ok_or_else(|| de::Error::custom("custom provider requires a base_url")),
            other => Err(de::Error::custom(format!(
                "unknown LLM provider '{}', expected openai or custom",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelParameters {
    /// 0.0 leaves the provider default in place.
    #[serde(default)]
    pub temperature: f32,
    /// 0 leaves the provider default in place.
    #[serde(default)]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAuth {
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
}

/// What the loop feeds back to the model when a tool returns an error.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolErrorPolicy {
    /// Empty tool result; the model cannot tell failure from "nothing to say".
    #[default]
    Swallow,
    /// `[tool_error] <message>` tool result.
    Tag,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantSettings {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub tool_error_policy: ToolErrorPolicy,
    #[serde(default)]
    pub turn_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub weather: WeatherToolConfig,
    #[serde(default)]
    pub forecast: ToggleConfig,
    #[serde(default)]
    pub today: ToggleConfig,
    #[serde(default)]
    pub holidays: HolidaysToolConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherToolConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_weather_api_base")]
    pub api_base: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_weather_api_key_env")]
    pub api_key_env: Option<String>,
}

impl WeatherToolConfig {
    /// Client shared by the current-weather and forecast tools.
    pub fn client(&self) -> WeatherClient {
        WeatherClient::new(self.api_base.clone(), self.api_key.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidaysToolConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_calendar_url")]
    pub calendar_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl ParleyConfig {
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.llm.model.trim().is_empty() {
            return Err(AgentError::ConfigError("LLM model cannot be empty".to_string()));
        }

        if self.llm.title_model.trim().is_empty() {
            return Err(AgentError::ConfigError("LLM title_model cannot be empty".to_string()));
        }

        if self.assistant.max_iterations == 0 {
            return Err(AgentError::ConfigError(
                "assistant max_iterations must be greater than 0".to_string(),
            ));
        }

        if self.assistant.turn_timeout_secs == Some(0) {
            return Err(AgentError::ConfigError(
                "assistant turn_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.tools.holidays.enabled && self.tools.holidays.calendar_url.trim().is_empty() {
            return Err(AgentError::ConfigError(
                "holidays calendar_url cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_model(),
            title_model: default_title_model(),
            api_base: None,
            parameters: ModelParameters::default(),
            auth: LlmAuth::default(),
        }
    }
}

impl Default for LlmAuth {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
        }
    }
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            system_prompt: None,
            tool_error_policy: ToolErrorPolicy::default(),
            turn_timeout_secs: None,
        }
    }
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for WeatherToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: default_weather_api_base(),
            api_key: None,
            api_key_env: default_weather_api_key_env(),
        }
    }
}

impl Default for HolidaysToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            calendar_url: default_calendar_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_model() -> String { "gpt-4.1".to_string() }
fn default_title_model() -> String { "o1".to_string() }
fn default_max_iterations() -> usize { 15 }
fn default_true() -> bool { true }
fn default_weather_api_base() -> String { DEFAULT_API_BASE.to_string() }
fn default_weather_api_key_env() -> Option<String> { Some("WEATHER_API_KEY".to_string()) }
fn default_calendar_url() -> String { DEFAULT_CALENDAR_URL.to_string() }
fn default_log_level() -> String { "info".to_string() }
