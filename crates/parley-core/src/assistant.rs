//! Reply orchestration.
//!
//! `Assistant::reply` turns a conversation into a bounded sequence of model
//! calls. Each response either answers (the turn ends) or requests tool calls,
//! which are executed in order and fed back as tool messages before the next
//! model call. The turn state lives on the stack of a single `reply` call, so
//! concurrent turns share nothing but the read-only registry and the model
//! client.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::{AssistantSettings, ParleyConfig, ToolErrorPolicy};
use crate::conversation::{Conversation, ConversationRole};
use crate::core_types::{Message, ToolCall};
use crate::errors::AgentError;
use crate::llm::{create_llm_client, ToolMetadata, LLM};
use crate::title;
use crate::tools::{ToolFactory, ToolRegistry};

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful, concise AI assistant. Provide accurate, safe, and clear responses.";

pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Marker that opens a tool result under `ToolErrorPolicy::Tag`.
pub const TOOL_ERROR_MARKER: &str = "[tool_error]";

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Upper bound on model calls per reply.
    pub max_iterations: usize,
    pub system_prompt: String,
    pub tool_error_policy: ToolErrorPolicy,
    /// Deadline for a whole turn, model and tool calls included.
    pub turn_timeout: Option<Duration>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            tool_error_policy: ToolErrorPolicy::Swallow,
            turn_timeout: None,
        }
    }
}

impl From<&AssistantSettings> for AssistantConfig {
    fn from(settings: &AssistantSettings) -> Self {
        Self {
            max_iterations: settings.max_iterations,
            system_prompt: settings
                .system_prompt
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            tool_error_policy: settings.tool_error_policy,
            turn_timeout: settings.turn_timeout_secs.map(Duration::from_secs),
        }
    }
}

pub struct Assistant {
    llm: Arc<dyn LLM>,
    title_llm: Arc<dyn LLM>,
    tools: Arc<ToolRegistry>,
    config: AssistantConfig,
}

impl Assistant {
    pub fn new(llm: Arc<dyn LLM>, tools: Arc<ToolRegistry>, config: AssistantConfig) -> Self {
        Self {
            title_llm: llm.clone(),
            llm,
            tools,
            config,
        }
    }

    /// Uses a separate model client for title generation.
    pub fn with_title_llm(mut self, title_llm: Arc<dyn LLM>) -> Self {
        self.title_llm = title_llm;
        self
    }

    /// Builds model clients and the tool registry from configuration.
    pub fn from_config(config: &ParleyConfig) -> Result<Self, AgentError> {
        let llm = create_llm_client(&config.llm, &config.llm.model)?;
        let title_llm = create_llm_client(&config.llm, &config.llm.title_model)?;
        let registry = ToolFactory::create_default_registry(&config.tools)?;

        Ok(Self::new(llm, Arc::new(registry), AssistantConfig::from(&config.assistant))
            .with_title_llm(title_llm))
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Generates the assistant's next reply for `conversation`.
    pub async fn reply(
        &self,
        conversation: &Conversation,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        if conversation.is_empty() {
            return Err(AgentError::EmptyConversation);
        }

        log::info!("Generating reply for conversation {}", conversation.id);
        let result = self.within_deadline(self.run_turn(conversation, cancel)).await;
        if let Err(e) = &result {
            log::error!("Reply generation failed for conversation {}: {}", conversation.id, e);
        }
        result
    }

    /// Generates a short title for `conversation`.
    pub async fn title(
        &self,
        conversation: &Conversation,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        if conversation.is_empty() {
            return Ok(title::EMPTY_CONVERSATION_TITLE.to_string());
        }

        log::info!("Generating title for conversation {}", conversation.id);
        let title = self
            .within_deadline(async {
                cancellable(cancel, title::generate_title(self.title_llm.as_ref(), conversation)).await?
            })
            .await?;

        log::info!("Generated title for conversation {}: {}", conversation.id, title);
        Ok(title)
    }

    async fn run_turn(
        &self,
        conversation: &Conversation,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let mut working_messages = self.seed_messages(conversation);
        let tools: Option<Vec<ToolMetadata>> = if self.tools.is_empty() {
            None
        } else {
            Some(self.tools.list_tools())
        };

        for iteration in 0..self.config.max_iterations {
            log::debug!(
                "Model call {} of {} ({} messages)",
                iteration + 1,
                self.config.max_iterations,
                working_messages.len()
            );

            let response =
                cancellable(cancel, self.llm.generate(working_messages.clone(), tools.clone()))
                    .await??;

            let choice = response
                .choices
                .into_iter()
                .next()
                .ok_or(AgentError::NoChoices)?;

            if !choice.has_tool_calls() {
                return Ok(choice.content.unwrap_or_default());
            }

            working_messages.push(choice.to_message());
            for call in &choice.tool_calls {
                let result = self.dispatch(call, cancel).await?;
                working_messages.push(Message::tool(call.id.clone(), result));
            }
        }

        log::warn!(
            "Conversation {} exhausted {} model calls without a final answer",
            conversation.id,
            self.config.max_iterations
        );
        Err(AgentError::TooManyToolCalls {
            max_iterations: self.config.max_iterations,
        })
    }

    /// System preamble followed by the conversation; unrecognised roles are dropped.
    fn seed_messages(&self, conversation: &Conversation) -> Vec<Message> {
        let mut messages = Vec::with_capacity(conversation.messages.len() + 1);
        messages.push(Message::system(self.config.system_prompt.clone()));
        for m in &conversation.messages {
            match m.role {
                ConversationRole::User => messages.push(Message::user(m.content.clone())),
                ConversationRole::Assistant => messages.push(Message::assistant(m.content.clone())),
                ConversationRole::Unknown => {
                    log::debug!("Dropping message {} with unrecognised role", m.id);
                }
            }
        }
        messages
    }

    /// Runs one tool call and returns the content of its tool message.
    async fn dispatch(&self, call: &ToolCall, cancel: &CancellationToken) -> Result<String, AgentError> {
        log::info!("Tool call received: {} args={}", call.name, call.arguments);

        let tool = self
            .tools
            .get_tool(&call.name)
            .ok_or_else(|| AgentError::UnknownTool(call.name.clone()))?;

        log::info!("Executing tool {}", call.name);
        match cancellable(cancel, tool.execute(&call.arguments)).await? {
            Ok(output) => Ok(output),
            Err(e) => {
                log::warn!("Tool {} failed, continuing: {}", call.name, e);
                Ok(match self.config.tool_error_policy {
                    ToolErrorPolicy::Swallow => String::new(),
                    ToolErrorPolicy::Tag => format!("{} {}", TOOL_ERROR_MARKER, e),
                })
            }
        }
    }

    async fn within_deadline<T>(
        &self,
        fut: impl Future<Output = Result<T, AgentError>>,
    ) -> Result<T, AgentError> {
        match self.config.turn_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| AgentError::Timeout(limit))?,
            None => fut.await,
        }
    }
}

/// Races `fut` against `cancel`; cancellation wins ties.
async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output, AgentError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AgentError::Cancelled),
        output = fut => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationMessage;
    use crate::core_types::{Choice, LLMResponse, Role};
    use crate::test_utils::ScriptedLLM;
    use crate::tools::Tool;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct RecordingTool {
        name: &'static str,
        output: &'static str,
        executed: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "records its calls"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, arguments: &str) -> Result<String, AgentError> {
            self.executed
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, arguments));
            Ok(self.output.to_string())
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "flaky"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _arguments: &str) -> Result<String, AgentError> {
            Err(AgentError::tool("flaky", "upstream exploded"))
        }
    }

    fn registry(executed: &Arc<Mutex<Vec<String>>>) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        for (name, output) in [("lookup", "found it"), ("clock", "12:00")] {
            registry
                .register_tool(Arc::new(RecordingTool {
                    name,
                    output,
                    executed: executed.clone(),
                }))
                .unwrap();
        }
        registry.register_tool(Arc::new(FailingTool)).unwrap();
        Arc::new(registry)
    }

    fn conversation() -> Conversation {
        let mut conv = Conversation::with_id("conv-1");
        conv.push_user("What's on today?");
        conv
    }

    fn assistant(llm: Arc<ScriptedLLM>, executed: &Arc<Mutex<Vec<String>>>) -> Assistant {
        Assistant::new(llm, registry(executed), AssistantConfig::default())
    }

    fn lookup_call(i: usize) -> LLMResponse {
        let id = format!("call_{}", i);
        ScriptedLLM::calling(&[(id.as_str(), "lookup", "{}")])
    }

    #[tokio::test]
    async fn test_empty_conversation_fails_without_model_call() {
        let llm = Arc::new(ScriptedLLM::replying(vec![]));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(llm.clone(), &executed);

        let err = assistant
            .reply(&Conversation::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::EmptyConversation));
        assert_eq!(err.to_string(), "conversation has no messages");
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_plain_answer_returned_unchanged_after_one_call() {
        let llm = Arc::new(ScriptedLLM::replying(vec![ScriptedLLM::text("  Hello!\n")]));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(llm.clone(), &executed);

        let reply = assistant
            .reply(&conversation(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply, "  Hello!\n");
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_first_request_seeds_preamble_and_drops_unknown_roles() {
        let llm = Arc::new(ScriptedLLM::replying(vec![ScriptedLLM::text("ok")]));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(llm.clone(), &executed);

        let mut conv = Conversation::with_id("c");
        conv.push_user("hi");
        conv.push_assistant("hello");
        conv.push(ConversationMessage::new(ConversationRole::Unknown, "internal note"));
        conv.push_user("weather?");

        assistant.reply(&conv, &CancellationToken::new()).await.unwrap();

        let call = &llm.calls()[0];
        let roles: Vec<Role> = call.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(call.messages[0].content, DEFAULT_SYSTEM_PROMPT);
        assert!(call.messages.iter().all(|m| m.content != "internal note"));

        let names: Vec<String> = call.tools.clone().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["lookup", "clock", "flaky"]);
    }

    #[tokio::test]
    async fn test_n_tool_rounds_then_answer() {
        for n in [1usize, 5, 14] {
            let mut script: Vec<LLMResponse> = (0..n).map(lookup_call).collect();
            script.push(ScriptedLLM::text("final answer"));
            let llm = Arc::new(ScriptedLLM::replying(script));
            let executed = Arc::new(Mutex::new(Vec::new()));
            let assistant = assistant(llm.clone(), &executed);

            let reply = assistant
                .reply(&conversation(), &CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(reply, "final answer");
            assert_eq!(llm.call_count(), n + 1);
            assert_eq!(executed.lock().unwrap().len(), n);
        }
    }

    #[tokio::test]
    async fn test_fifteen_tool_rounds_exhaust_the_cap() {
        let mut script: Vec<LLMResponse> = (0..15).map(lookup_call).collect();
        script.push(ScriptedLLM::text("never reached"));
        let llm = Arc::new(ScriptedLLM::replying(script));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(llm.clone(), &executed);

        let err = assistant
            .reply(&conversation(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::TooManyToolCalls { max_iterations: 15 }));
        assert_eq!(llm.call_count(), 15);
    }

    #[tokio::test]
    async fn test_iteration_cap_is_configurable() {
        let script: Vec<LLMResponse> = (0..3).map(lookup_call).collect();
        let llm = Arc::new(ScriptedLLM::replying(script));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let config = AssistantConfig {
            max_iterations: 2,
            ..AssistantConfig::default()
        };
        let assistant = Assistant::new(llm.clone(), registry(&executed), config);

        let err = assistant
            .reply(&conversation(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::TooManyToolCalls { max_iterations: 2 }));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_tool_results_fed_back_in_request_order() {
        let llm = Arc::new(ScriptedLLM::replying(vec![
            ScriptedLLM::calling(&[
                ("call_a", "clock", "{}"),
                ("call_b", "lookup", r#"{"q":"x"}"#),
            ]),
            ScriptedLLM::text("done"),
        ]));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(llm.clone(), &executed);

        assistant
            .reply(&conversation(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            *executed.lock().unwrap(),
            vec!["clock:{}".to_string(), r#"lookup:{"q":"x"}"#.to_string()]
        );

        let second = &llm.calls()[1].messages;
        let tail = &second[second.len() - 3..];
        assert_eq!(tail[0].role, Role::Assistant);
        assert_eq!(tail[0].tool_calls.len(), 2);
        assert_eq!(tail[1], Message::tool("call_a", "12:00"));
        assert_eq!(tail[2], Message::tool("call_b", "found it"));
    }

    #[tokio::test]
    async fn test_unknown_tool_stops_the_batch() {
        let llm = Arc::new(ScriptedLLM::replying(vec![
            ScriptedLLM::calling(&[
                ("call_1", "lookup", "{}"),
                ("call_2", "teleport", "{}"),
                ("call_3", "clock", "{}"),
            ]),
            ScriptedLLM::text("unreachable"),
        ]));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(llm.clone(), &executed);

        let err = assistant
            .reply(&conversation(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool(name) if name == "teleport"));
        assert_eq!(*executed.lock().unwrap(), vec!["lookup:{}".to_string()]);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_tool_error_swallowed_as_empty_result() {
        let llm = Arc::new(ScriptedLLM::replying(vec![
            ScriptedLLM::calling(&[("call_f", "flaky", "{}")]),
            ScriptedLLM::text("recovered"),
        ]));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(llm.clone(), &executed);

        let reply = assistant
            .reply(&conversation(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply, "recovered");

        let second = &llm.calls()[1].messages;
        assert_eq!(second.last().unwrap(), &Message::tool("call_f", ""));
    }

    #[tokio::test]
    async fn test_tag_policy_marks_tool_errors() {
        let llm = Arc::new(ScriptedLLM::replying(vec![
            ScriptedLLM::calling(&[("call_f", "flaky", "{}")]),
            ScriptedLLM::text("recovered"),
        ]));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let config = AssistantConfig {
            tool_error_policy: ToolErrorPolicy::Tag,
            ..AssistantConfig::default()
        };
        let assistant = Assistant::new(llm.clone(), registry(&executed), config);

        assistant
            .reply(&conversation(), &CancellationToken::new())
            .await
            .unwrap();

        let last = llm.calls()[1].messages.last().cloned().unwrap();
        assert_eq!(last.tool_call_id.as_deref(), Some("call_f"));
        assert!(last.content.starts_with(TOOL_ERROR_MARKER));
        assert!(last.content.contains("upstream exploded"));
    }

    #[tokio::test]
    async fn test_no_choices_is_terminal() {
        let llm = Arc::new(ScriptedLLM::replying(vec![LLMResponse::default()]));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(llm.clone(), &executed);

        let err = assistant
            .reply(&conversation(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::NoChoices));
    }

    #[tokio::test]
    async fn test_model_failure_is_not_retried() {
        let llm = Arc::new(ScriptedLLM::new(vec![
            Err(AgentError::LLMError("rate limited".to_string())),
            Ok(ScriptedLLM::text("too late")),
        ]));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(llm.clone(), &executed);

        let err = assistant
            .reply(&conversation(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::LLMError(msg) if msg == "rate limited"));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_first_choice_wins() {
        let response = LLMResponse {
            choices: vec![Choice::text("first"), Choice::text("second")],
            usage: None,
        };
        let llm = Arc::new(ScriptedLLM::replying(vec![response]));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(llm, &executed);

        let reply = assistant
            .reply(&conversation(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply, "first");
    }

    #[tokio::test]
    async fn test_empty_registry_sends_no_tools() {
        let llm = Arc::new(ScriptedLLM::replying(vec![ScriptedLLM::text("hi")]));
        let assistant = Assistant::new(
            llm.clone(),
            Arc::new(ToolRegistry::new()),
            AssistantConfig::default(),
        );

        assistant
            .reply(&conversation(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(llm.calls()[0].tools.is_none());
    }

    #[tokio::test]
    async fn test_cancellation_aborts_in_flight_model_call() {
        let llm = Arc::new(
            ScriptedLLM::replying(vec![ScriptedLLM::text("slow")])
                .with_delay(Duration::from_secs(30)),
        );
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(llm, &executed);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = assistant.reply(&conversation(), &cancel).await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "takes its time"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _arguments: &str) -> Result<String, AgentError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("finally".to_string())
        }
    }

    #[tokio::test]
    async fn test_cancellation_aborts_in_flight_tool_call() {
        let llm = Arc::new(ScriptedLLM::replying(vec![
            ScriptedLLM::calling(&[("call_s", "slow", "{}")]),
            ScriptedLLM::text("unreachable"),
        ]));
        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(SlowTool)).unwrap();
        let assistant = Assistant::new(llm.clone(), Arc::new(registry), AssistantConfig::default());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = assistant.reply(&conversation(), &cancel).await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
        assert_eq!(llm.call_count(), 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_title_honours_cancellation() {
        let llm = Arc::new(
            ScriptedLLM::replying(vec![ScriptedLLM::text("Too late")])
                .with_delay(Duration::from_secs(30)),
        );
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(llm.clone(), &executed);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = assistant.title(&conversation(), &cancel).await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
    }

    #[tokio::test]
    async fn test_turn_timeout() {
        let llm = Arc::new(
            ScriptedLLM::replying(vec![ScriptedLLM::text("slow")])
                .with_delay(Duration::from_secs(30)),
        );
        let executed = Arc::new(Mutex::new(Vec::new()));
        let config = AssistantConfig {
            turn_timeout: Some(Duration::from_millis(20)),
            ..AssistantConfig::default()
        };
        let assistant = Assistant::new(llm, registry(&executed), config);

        let err = assistant
            .reply(&conversation(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_title_uses_title_model_and_cleans_output() {
        let reply_llm = Arc::new(ScriptedLLM::replying(vec![]));
        let title_llm = Arc::new(ScriptedLLM::replying(vec![ScriptedLLM::text(
            "  \"Trip to Rome\"\n",
        )]));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(reply_llm.clone(), &executed).with_title_llm(title_llm.clone());

        let mut conv = conversation();
        conv.push_assistant("Nothing much.");
        let title = assistant.title(&conv, &CancellationToken::new()).await.unwrap();

        assert_eq!(title, "Trip to Rome");
        assert_eq!(reply_llm.call_count(), 0);
        let call = &title_llm.calls()[0];
        assert!(call.tools.is_none());
        assert_eq!(call.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_title_of_empty_conversation() {
        let llm = Arc::new(ScriptedLLM::replying(vec![]));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(llm.clone(), &executed);

        let title = assistant
            .title(&Conversation::new(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(title, title::EMPTY_CONVERSATION_TITLE);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_title_response_is_error() {
        let llm = Arc::new(ScriptedLLM::replying(vec![ScriptedLLM::text("   ")]));
        let executed = Arc::new(Mutex::new(Vec::new()));
        let assistant = assistant(llm, &executed);

        let err = assistant
            .title(&conversation(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::EmptyTitle));
    }

    #[test]
    fn test_config_from_settings() {
        let settings = AssistantSettings {
            max_iterations: 3,
            system_prompt: Some("  ".to_string()),
            tool_error_policy: ToolErrorPolicy::Tag,
            turn_timeout_secs: Some(9),
        };
        let config = AssistantConfig::from(&settings);
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.turn_timeout, Some(Duration::from_secs(9)));
    }

    /// Calls `echo` once with the last user message, then answers with both.
    struct EchoModel;

    #[async_trait]
    impl LLM for EchoModel {
        async fn generate(
            &self,
            messages: Vec<Message>,
            _tools: Option<Vec<ToolMetadata>>,
        ) -> Result<LLMResponse, AgentError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let user = messages
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            let last = messages.last().unwrap();
            if last.role == Role::Tool {
                Ok(ScriptedLLM::text(&format!("{}|{}", user, last.content)))
            } else {
                Ok(LLMResponse::single(Choice::tool_calls(vec![ToolCall::new(
                    format!("call-{}", user),
                    "echo",
                    json!({ "text": user }).to_string(),
                )])))
            }
        }
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "echoes text"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn execute(&self, arguments: &str) -> Result<String, AgentError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let value: Value = serde_json::from_str(arguments)?;
            Ok(value["text"].as_str().unwrap_or_default().to_uppercase())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_turns_do_not_interfere() {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(EchoTool)).unwrap();
        let assistant = Arc::new(Assistant::new(
            Arc::new(EchoModel),
            Arc::new(registry),
            AssistantConfig::default(),
        ));

        let mut a = Conversation::with_id("a");
        a.push_user("alpha");
        let mut b = Conversation::with_id("b");
        b.push_user("bravo");

        let cancel = CancellationToken::new();
        let (ra, rb) = tokio::join!(assistant.reply(&a, &cancel), assistant.reply(&b, &cancel));
        assert_eq!(ra.unwrap(), "alpha|ALPHA");
        assert_eq!(rb.unwrap(), "bravo|BRAVO");
        assert_eq!(a.messages.len(), 1);
        assert_eq!(b.messages.len(), 1);
    }
}
