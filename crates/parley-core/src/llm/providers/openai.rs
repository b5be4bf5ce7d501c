use crate::config::LlmConfig;
use crate::core_types::{Choice, LLMResponse, Message, Role, ToolCall, Usage};
use crate::errors::AgentError;
use crate::llm::{ToolMetadata, LLM};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

use serde_json::{json, Value};


#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl OpenAIClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: "https://api.openai.com/v1".to_string(),
            model,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn build_request_body(
        &self,
        messages: &[Message],
        tools: Option<&[ToolMetadata]>,
    ) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.format_messages(messages),
        });

        if let Some(temp) = self.temperature {
            body["temperature"] = temp.into();
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = max_tokens.into();
        }

        if let Some(tools) = tools {
            if !tools.is_empty() {
                log::debug!("Advertising {} tools to OpenAI", tools.len());
                let formatted_tools: Vec<Value> = tools
                    .iter()
                    .map(|tool| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": tool.name,
                                "description": tool.description,
                                "parameters": tool.input_schema
                            }
                        })
                    })
                    .collect();
                body["tools"] = formatted_tools.into();
                body["tool_choice"] = "auto".into();
            }
        }

        body
    }

    fn format_messages(&self, messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| {
                let mut message = json!({
                    "role": self.format_role(&msg.role),
                    "content": msg.content
                });

                if let Role::Tool = msg.role {
                    if let Some(tool_call_id) = &msg.tool_call_id {
                        message["tool_call_id"] = json!(tool_call_id);
                    }
                }

                if let Role::Assistant = msg.role {
                    if !msg.tool_calls.is_empty() {
                        let formatted_tool_calls: Vec<Value> = msg
                            .tool_calls
                            .iter()
                            .map(|tc| {
                                json!({
                                    "id": tc.id,
                                    "type": "function",
                                    "function": {
                                        "name": tc.name,
                                        "arguments": tc.arguments
                                    }
                                })
                            })
                            .collect();
                        message["tool_calls"] = json!(formatted_tool_calls);
                        if msg.content.is_empty() {
                            message["content"] = Value::Null;
                        }
                    }
                }

                message
            })
            .collect()
    }

    fn format_role(&self, role: &Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

#[async_trait]
impl LLM for OpenAIClient {
    async fn generate(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolMetadata>>,
    ) -> Result<LLMResponse, AgentError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request_body(&messages, tools.as_deref());

        log::debug!("OpenAI API request to {} ({} messages)", url, messages.len());
        log::trace!("Request body: {}", body);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::LLMError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AgentError::LLMError(format!("Failed to read response: {}", e)))?;

        log::debug!("OpenAI API response ({}): {}", status, response_text);

        if !status.is_success() {
            return Err(AgentError::LLMError(format!(
                "API request failed with status {}: {}",
                status, response_text
            )));
        }

        let response_json: Value = serde_json::from_str(&response_text)
            .map_err(|e| AgentError::ParsingError(format!("Invalid JSON response: {}", e)))?;

        parse_response(response_json)
    }
}

fn parse_response(response: Value) -> Result<LLMResponse, AgentError> {
    let choices = response["choices"]
        .as_array()
        .ok_or_else(|| AgentError::ParsingError("No choices in response".to_string()))?;

    let choices = choices.iter().map(parse_choice).collect::<Result<Vec<_>, _>>()?;

    let usage = response
        .get("usage")
        .filter(|u| !u.is_null())
        .and_then(|u| serde_json::from_value::<Usage>(u.clone()).ok());

    Ok(LLMResponse { choices, usage })
}

fn parse_choice(choice: &Value) -> Result<Choice, AgentError> {
    let message = &choice["message"];
    let content = message["content"].as_str().map(|s| s.to_string());

    let mut tool_calls = Vec::new();
    if let Some(calls) = message["tool_calls"].as_array() {
        for call in calls {
            let id = call["id"]
                .as_str()
                .ok_or_else(|| AgentError::ParsingError("Tool call without id".to_string()))?;
            let function = call["function"]
                .as_object()
                .ok_or_else(|| AgentError::ParsingError(format!("Tool call {} has no function", id)))?;
            let name = function
                .get("name")
                .and_then(|n| n.as_str())
                .ok_or_else(|| AgentError::ParsingError(format!("Tool call {} has no name", id)))?;
            let arguments = function
                .get("arguments")
                .and_then(|a| a.as_str())
                .unwrap_or_default();

            tool_calls.push(ToolCall::new(id, name, arguments));
        }
    }

    Ok(Choice {
        content,
        tool_calls,
        finish_reason: choice["finish_reason"].as_str().map(|s| s.to_string()),
    })
}

fn resolve_api_key(config: &LlmConfig) -> Option<String> {
    config.auth.api_key.clone().or_else(|| {
        config
            .auth
            .api_key_env
            .as_ref()
            .and_then(|env_var| std::env::var(env_var).ok())
    })
}

fn apply_parameters(mut client: OpenAIClient, config: &LlmConfig) -> OpenAIClient {
    if config.parameters.temperature > 0.0 {
        client = client.with_temperature(config.parameters.temperature);
    }
    if config.parameters.max_tokens > 0 {
        client = client.with_max_tokens(config.parameters.max_tokens);
    }
    client
}

/// Create an OpenAI LLM client from configuration
pub fn create_client(config: &LlmConfig, model: &str) -> Result<Arc<dyn LLM>, AgentError> {
    let api_key = resolve_api_key(config).ok_or_else(|| {
        AgentError::ConfigError(
            "No API key found for OpenAI. Set api_key or api_key_env".to_string(),
        )
    })?;

    let mut client = OpenAIClient::new(api_key, model.to_string());
    if let Some(api_base) = &config.api_base {
        client = client.with_api_base(api_base.clone());
    }

    Ok(Arc::new(apply_parameters(client, config)))
}

/// Create an OpenAI-compatible client for custom endpoints
pub fn create_custom_client(
    config: &LlmConfig,
    model: &str,
    base_url: &str,
) -> Result<Arc<dyn LLM>, AgentError> {
    // Self-hosted endpoints frequently run without auth.
    let api_key = resolve_api_key(config).unwrap_or_default();
    let client = OpenAIClient::new(api_key, model.to_string()).with_api_base(base_url.to_string());

    Ok(Arc::new(apply_parameters(client, config)))
}
