//! Assistant engine for a chat backend.
//!
//! Given a stored conversation, the engine produces the assistant's next reply
//! by running a bounded loop of model calls in which the model may ask for
//! tools (current weather, forecasts, today's date, local holidays) to be run
//! on its behalf. It also derives short conversation titles.
//!
//! - **Orchestration**: `Assistant::reply` and `Assistant::title`
//! - **Language models**: the `LLM` trait and an OpenAI-compatible client
//! - **Tools**: the `Tool` contract, typed argument decoding and the registry
//! - **Configuration**: YAML file plus environment overrides

pub mod assistant;
pub mod calendar;
pub mod config;
pub mod conversation;
pub mod core_types;
pub mod errors;
pub mod llm;
pub mod title;
pub mod tools;
pub mod weather;

pub use assistant::{Assistant, AssistantConfig};
pub use config::*;
pub use conversation::{Conversation, ConversationMessage, ConversationRole};
pub use errors::AgentError;
pub use llm::LLM;
pub use tools::{Tool, ToolRegistry};

#[cfg(test)]
pub mod test_utils;
