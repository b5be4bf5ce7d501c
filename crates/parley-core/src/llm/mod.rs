//! Language model abstraction.
//!
//! The orchestration loop only knows the `LLM` trait: an ordered message list
//! and an optional list of tool descriptors go in, a list of candidate
//! completions comes out. Provider specifics live under `providers`.

pub use crate::core_types::{Choice, LLMResponse, Message};
use crate::errors::AgentError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod providers;

pub use providers::create_llm_client;

/// Descriptor advertised to the model for one tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[async_trait]
pub trait LLM: Send + Sync {
    async fn generate(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolMetadata>>,
    ) -> Result<LLMResponse, AgentError>;
}
