//! Tool system: the capability contract, typed argument decoding, and the
//! registry the assistant dispatches against.
//!
//! A registry is assembled once at startup and then shared read-only, so it
//! can be handed to any number of concurrent turns behind an `Arc` without
//! locking.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ToolsConfig;
use crate::errors::AgentError;
use crate::llm::ToolMetadata;

pub mod args;
pub mod holidays;
pub mod today;
pub mod weather;
pub mod weather_forecast;

pub use args::{decode_arguments, NoArgs, TypedTool};
pub use holidays::HolidaysTool;
pub use today::TodayTool;
pub use weather::WeatherTool;
pub use weather_forecast::WeatherForecastTool;

/// Core Tool trait that all tools implement.
///
/// `execute` receives the raw argument text exactly as the model produced it.
/// Bad input and upstream failures should come back as a descriptive `Ok`
/// string; an `Err` is reserved for failures the tool cannot describe.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;

    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters(),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<String, AgentError>;
}

/// Name-keyed tool registry. Iteration order is registration order.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Adds a tool under its name. A second tool with the same name is a
    /// configuration error.
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<(), AgentError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(AgentError::ConfigError(format!(
                "duplicate tool registration: {}",
                name
            )));
        }
        log::debug!("Registered tool '{}'", name);
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    pub fn list_tools(&self) -> Vec<ToolMetadata> {
        self.tools.iter().map(|tool| tool.metadata()).collect()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}

// Tool factory for the built-in tools
pub struct ToolFactory;

impl ToolFactory {
    pub fn create_weather(config: &ToolsConfig) -> Arc<dyn Tool> {
        Arc::new(WeatherTool::new(config.weather.client()))
    }

    pub fn create_weather_forecast(config: &ToolsConfig) -> Arc<dyn Tool> {
        Arc::new(WeatherForecastTool::new(config.weather.client()))
    }

    pub fn create_today() -> Arc<dyn Tool> {
        Arc::new(TodayTool::new())
    }

    pub fn create_holidays(config: &ToolsConfig) -> Arc<dyn Tool> {
        Arc::new(HolidaysTool::new(config.holidays.calendar_url.clone()))
    }

    /// Builds the registry of every tool enabled in `config`.
    pub fn create_default_registry(config: &ToolsConfig) -> Result<ToolRegistry, AgentError> {
        let mut registry = ToolRegistry::new();
        if config.weather.enabled {
            registry.register_tool(Self::create_weather(config))?;
        }
        if config.forecast.enabled {
            registry.register_tool(Self::create_weather_forecast(config))?;
        }
        if config.today.enabled {
            registry.register_tool(Self::create_today())?;
        }
        if config.holidays.enabled {
            registry.register_tool(Self::create_holidays(config))?;
        }
        log::info!("Tool registry ready: {:?}", registry.tool_names());
        Ok(registry)
    }
}
