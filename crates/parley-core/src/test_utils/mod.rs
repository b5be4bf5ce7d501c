//! Test doubles for the model API.

mod mock_openai_server;
mod scripted_llm;

pub use mock_openai_server::{MockOpenAIServer, RecordedRequest};
pub use scripted_llm::{RecordedCall, ScriptedLLM};
