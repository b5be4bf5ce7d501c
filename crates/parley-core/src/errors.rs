//! Error types for the assistant engine
//!
//! Every failure a turn can end with has its own variant so callers and
//! operators can tell an exhausted tool-call chain apart from an upstream
//! outage or a caller mistake. Tool execution failures are represented too,
//! but the orchestration loop absorbs them instead of ending the turn.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("conversation has no messages")]
    EmptyConversation,
    #[error("LLM interaction failed: {0}")]
    LLMError(String),
    #[error("Parsing error: {0}")]
    ParsingError(String),
    #[error("no choices returned by the model")]
    NoChoices,
    #[error("unknown tool call: {0}")]
    UnknownTool(String),
    #[error("Tool execution failed for '{tool_name}': {message}")]
    ToolError { tool_name: String, message: String },
    #[error("too many tool calls, unable to generate reply (limit {max_iterations})")]
    TooManyToolCalls { max_iterations: usize },
    #[error("empty response from the model for title generation")]
    EmptyTitle,
    #[error("turn cancelled")]
    Cancelled,
    #[error("turn timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("I/O error: {0}")]
    IoError(String),
}

impl AgentError {
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        AgentError::ToolError {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for AgentError {
    fn from(err: std::io::Error) -> Self {
        AgentError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::LLMError(err.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::ParsingError(err.to_string())
    }
}

impl From<serde_yaml::Error> for AgentError {
    fn from(err: serde_yaml::Error) -> Self {
        AgentError::ConfigError(err.to_string())
    }
}
