//! Minimal client for OpenAI-compatible chat completions (OpenAI, Groq, ...).
//!
//! One request shape: a message list plus optional function tools. The agent
//! loop in `agent.rs` drives it. Calls are instrumented and log model,
//! latency and token usage (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::agent::ChatModel;
use crate::config::LlmSettings;
use crate::error::AgentError;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub temperature: f32,
}

impl OpenAI {
  /// Construct the client if an API key is configured; otherwise return None.
  pub fn from_settings(settings: &LlmSettings) -> Option<Self> {
    let api_key = settings.api_key.clone()?;
    let client = match reqwest::Client::builder().timeout(Duration::from_secs(settings.timeout_secs)).build() {
      Ok(c) => c,
      Err(e) => {
        error!(target: "rag_questions", error = %e, "Failed to build LLM HTTP client; LLM disabled");
        return None;
      }
    };

    Some(Self {
      client,
      api_key,
      base_url: settings.base_url.trim_end_matches('/').to_string(),
      model: settings.model.clone(),
      temperature: settings.temperature,
    })
  }

  /// One chat-completions round trip. Returns the assistant message, which
  /// carries either text or tool calls.
  #[instrument(level = "info", skip(self, messages, tools), fields(model = %self.model, messages = messages.len(), tools = tools.len()))]
  pub async fn chat(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ChatMessage, AgentError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: &self.model,
      messages,
      temperature: self.temperature,
      tools: if tools.is_empty() { None } else { Some(tools) },
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "rag-questions/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_api_error(&body).unwrap_or(body);
      return Err(AgentError::Api { status: status.as_u16(), message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    let elapsed = start.elapsed();
    if let Some(usage) = &body.usage {
      info!(?elapsed, prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "LLM usage");
    } else {
      info!(?elapsed, "LLM response received");
    }

    body.choices.into_iter().next().map(|c| c.message).ok_or(AgentError::EmptyResponse)
  }
}

#[async_trait]
impl ChatModel for OpenAI {
  async fn chat(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ChatMessage, AgentError> {
    OpenAI::chat(self, messages, tools).await
  }

  fn model_name(&self) -> &str {
    &self.model
  }
}

// --- Chat DTOs ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role: String,
  #[serde(default)]
  pub content: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tool_calls: Option<Vec<ToolCall>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tool_call_id: Option<String>,
}

impl ChatMessage {
  fn with_role(role: &str, content: impl Into<String>) -> Self {
    Self { role: role.into(), content: Some(content.into()), tool_calls: None, tool_call_id: None }
  }

  pub fn system(content: impl Into<String>) -> Self {
    Self::with_role("system", content)
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self::with_role("user", content)
  }

  pub fn assistant(content: impl Into<String>) -> Self {
    Self::with_role("assistant", content)
  }

  pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
    Self { tool_call_id: Some(call_id.into()), ..Self::with_role("tool", content) }
  }

  pub fn requested_tools(&self) -> &[ToolCall] {
    self.tool_calls.as_deref().unwrap_or(&[])
  }

  pub fn text(&self) -> &str {
    self.content.as_deref().unwrap_or("")
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
  pub id: String,
  #[serde(rename = "type", default = "function_type")]
  pub kind: String,
  pub function: FunctionCall,
}

fn function_type() -> String {
  "function".into()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
  pub name: String,
  /// JSON-encoded arguments, as sent by the model.
  pub arguments: String,
}

/// A function tool advertised to the model.
#[derive(Clone, Debug, Serialize)]
pub struct ToolSpec {
  #[serde(rename = "type")]
  kind: &'static str,
  function: FunctionSpec,
}

#[derive(Clone, Debug, Serialize)]
struct FunctionSpec {
  name: String,
  description: String,
  parameters: serde_json::Value,
}

impl ToolSpec {
  /// A tool taking a single free-text `input` argument.
  pub fn text_query(name: &str, description: &str) -> Self {
    Self {
      kind: "function",
      function: FunctionSpec {
        name: name.to_string(),
        description: description.to_string(),
        parameters: serde_json::json!({
          "type": "object",
          "properties": {
            "input": { "type": "string", "description": "Search query for the study material." }
          },
          "required": ["input"]
        }),
      },
    }
  }

  pub fn name(&self) -> &str {
    &self.function.name
  }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
  model: &'a str,
  messages: &'a [ChatMessage],
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  tools: Option<&'a [ToolSpec]>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessage }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI-style error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn assistant_tool_call_message_parses() {
    let raw = json!({
      "role": "assistant",
      "content": null,
      "tool_calls": [{
        "id": "call_1",
        "type": "function",
        "function": { "name": "study_material_query", "arguments": "{\"input\":\"coupling\"}" }
      }]
    });
    let msg: ChatMessage = serde_json::from_value(raw).unwrap();
    assert_eq!(msg.requested_tools().len(), 1);
    assert_eq!(msg.requested_tools()[0].function.name, "study_material_query");
    assert_eq!(msg.text(), "");
  }

  #[test]
  fn tool_result_serializes_call_id() {
    let v = serde_json::to_value(ChatMessage::tool_result("call_1", "passage")).unwrap();
    assert_eq!(v["role"], "tool");
    assert_eq!(v["tool_call_id"], "call_1");
    assert!(v.get("tool_calls").is_none());
  }

  #[test]
  fn api_error_message_is_extracted() {
    let body = r#"{"error":{"message":"Rate limit reached","type":"tokens"}}"#;
    assert_eq!(extract_api_error(body).as_deref(), Some("Rate limit reached"));
    assert!(extract_api_error("<html>").is_none());
  }

  #[test]
  fn missing_key_disables_client() {
    assert!(OpenAI::from_settings(&LlmSettings::default()).is_none());
  }
}
