//! Conversation title generation.
//!
//! A single completion request without tools: a fixed instruction followed by
//! the user's messages. The model's answer is flattened to one line, stripped
//! of wrapping quotes and punctuation, and capped at `MAX_TITLE_CHARS`.

use crate::conversation::Conversation;
use crate::core_types::{LLMResponse, Message};
use crate::errors::AgentError;
use crate::llm::LLM;

pub const TITLE_SYSTEM_PROMPT: &str = "Generate a concise, descriptive title for the conversation. It should reflect users intention based on the user message. The title should be a single line, no more than 80 characters, and should not include any special characters or emojis.";

/// Returned for a conversation without messages; no model call is made.
pub const EMPTY_CONVERSATION_TITLE: &str = "An empty conversation";

pub const MAX_TITLE_CHARS: usize = 80;

const TRIMMED_CHARS: &[char] = &[
    '-', '"', '\'', '`', '*', '#', '.', '!', '?', ':', ';', ',', '“', '”', '‘', '’', '«', '»',
];

/// Instruction plus every user-authored message, in order.
pub fn build_title_messages(conversation: &Conversation) -> Vec<Message> {
    std::iter::once(Message::system(TITLE_SYSTEM_PROMPT))
        .chain(
            conversation
                .user_messages()
                .map(|m| Message::user(m.content.clone())),
        )
        .collect()
}

/// Normalises a raw model answer into a title.
pub fn clean_title(raw: &str) -> String {
    let flattened = raw.replace("\r\n", " ").replace(['\n', '\r'], " ");
    let trimmed = flattened.trim_matches(|c: char| c.is_whitespace() || TRIMMED_CHARS.contains(&c));
    trimmed.chars().take(MAX_TITLE_CHARS).collect()
}

/// Takes the first candidate's content and cleans it.
pub fn extract_title(response: &LLMResponse) -> Result<String, AgentError> {
    let content = response
        .first_choice()
        .and_then(|choice| choice.content.as_deref())
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(AgentError::EmptyTitle);
    }

    let title = clean_title(content);
    if title.is_empty() {
        return Err(AgentError::EmptyTitle);
    }
    Ok(title)
}

/// Generates a title with `llm`. Cancellation and deadlines are the caller's.
pub async fn generate_title(llm: &dyn LLM, conversation: &Conversation) -> Result<String, AgentError> {
    if conversation.is_empty() {
        return Ok(EMPTY_CONVERSATION_TITLE.to_string());
    }
    let response = llm.generate(build_title_messages(conversation), None).await?;
    extract_title(&response)
}
