use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::core_types::{Choice, LLMResponse, Message, ToolCall};
use crate::errors::AgentError;
use crate::llm::{ToolMetadata, LLM};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub tools: Option<Vec<ToolMetadata>>,
}

/// In-memory model that replays a fixed script of responses and records
/// every request it receives.
pub struct ScriptedLLM {
    responses: Mutex<VecDeque<Result<LLMResponse, AgentError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
}

impl ScriptedLLM {
    pub fn new(responses: Vec<Result<LLMResponse, AgentError>>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from(responses)),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Script of successful responses.
    pub fn replying(responses: Vec<LLMResponse>) -> Self {
        Self::new(responses.into_iter().map(Ok).collect())
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn text(content: &str) -> LLMResponse {
        LLMResponse::single(Choice::text(content))
    }

    pub fn calling(calls: &[(&str, &str, &str)]) -> LLMResponse {
        LLMResponse::single(Choice::tool_calls(
            calls
                .iter()
                .map(|(id, name, args)| ToolCall::new(*id, *name, *args))
                .collect(),
        ))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLM for ScriptedLLM {
    async fn generate(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolMetadata>>,
    ) -> Result<LLMResponse, AgentError> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall { messages, tools });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::LLMError("script exhausted".to_string())))
    }
}
