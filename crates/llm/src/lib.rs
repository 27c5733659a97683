//! An OpenRouter chat-completion client for the validator's phase 1a reply
//! generation (spec.md §4.9: "implementations call an external chat-completion
//! endpoint with only persona + context").
//!
//! Trimmed to the single provider spec.md actually names. No tool-calling, no
//! streaming, no local-model fallback: one blocking request in, one reply out.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// Role in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

/// A single message sent to the chat-completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// The assistant's reply, plus enough of the response envelope to tell an
/// empty completion apart from a normal stop.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub finish_reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct LlmRouter {
    client: reqwest::Client,
}

const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const OPENROUTER_MODELS_URL: &str = "https://openrouter.ai/api/v1/models";

const OPENROUTER_FALLBACK_MODELS: &[&str] = &[
    "openai/gpt-4o-mini",
    "openai/gpt-4.1-mini",
    "anthropic/claude-3.5-sonnet",
    "anthropic/claude-3.7-sonnet",
    "google/gemini-2.0-flash-001",
    "meta-llama/llama-3.1-70b-instruct",
    "mistralai/mistral-small-3.1-24b-instruct",
    "qwen/qwen-2.5-72b-instruct",
    "deepseek/deepseek-chat",
];

/// Lists selectable models (spec.md §6: `--list-models` is an explicit CLI
/// step, no implicit default). Falls back to a small static list if the
/// OpenRouter catalogue endpoint is unreachable, so `models --list-models`
/// remains usable without a network connection.
pub async fn list_openrouter_models() -> Result<Vec<String>> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(6)).build()?;
    let response = client.get(OPENROUTER_MODELS_URL).send().await;

    let models = match response {
        Ok(response) if response.status().is_success() => {
            let body: serde_json::Value = response.json().await?;
            let mut items = body
                .get("data")
                .and_then(|data| data.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.get("id").and_then(|id| id.as_str()))
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            items.sort();
            items.dedup();
            if items.is_empty() {
                fallback_models()
            } else {
                items
            }
        }
        _ => fallback_models(),
    };

    Ok(models)
}

fn fallback_models() -> Vec<String> {
    OPENROUTER_FALLBACK_MODELS.iter().map(|model| (*model).to_string()).collect()
}

impl LlmRouter {
    /// Sends `messages` to `model` via OpenRouter and returns the assistant's
    /// reply. Requires `OPENROUTER_API_KEY`; callers are expected to check
    /// for the key before constructing a router (spec.md §6: missing keys
    /// degrade to heuristic fallback with a warning, handled by the caller).
    pub async fn chat_messages(&self, model: &str, messages: &[ChatMessage]) -> Result<ChatResponse> {
        let api_key = std::env::var("OPENROUTER_API_KEY").ok().filter(|k| !k.trim().is_empty());
        let Some(api_key) = api_key else {
            anyhow::bail!("OPENROUTER_API_KEY is not set");
        };

        let payload = json!({ "model": model, "messages": messages });
        let response = self
            .client
            .post(OPENROUTER_CHAT_URL)
            .bearer_auth(&api_key)
            .header("HTTP-Referer", "https://voicecast.local")
            .header("X-Title", "voicecast")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await?;
        if !status.is_success() {
            anyhow::bail!("OpenRouter error ({status}): {body}");
        }

        parse_chat_response(&body)
    }
}

fn parse_chat_response(body: &serde_json::Value) -> Result<ChatResponse> {
    let choice = body.get("choices").and_then(|c| c.get(0));
    let content = choice
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let finish_reason = choice
        .and_then(|c| c.get("finish_reason"))
        .and_then(|v| v.as_str())
        .unwrap_or("stop")
        .to_string();
    Ok(ChatResponse { content, finish_reason })
}
