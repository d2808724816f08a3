//! The generation agent seam and its tool-calling implementation.
//!
//! Callers see one opaque call: prompt in, final text out. `RagAgent` runs a
//! bounded loop underneath (model turn, optional retrieval tool calls, repeat)
//! with a conversation window capped by an estimated token budget.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::{IndexSettings, LlmSettings};
use crate::error::AgentError;
use crate::index::DocumentIndex;
use crate::openai::{ChatMessage, OpenAI, ToolSpec};
use crate::util::{estimate_tokens, trunc_for_log};

#[async_trait]
pub trait GenerationAgent: Send + Sync {
  /// Answer `prompt`, consulting the retrieval tool as needed.
  async fn chat(&self, prompt: &str) -> Result<String, AgentError>;

  /// Single tool-less completion.
  async fn complete(&self, prompt: &str) -> Result<String, AgentError>;

  /// Whether calls can succeed at all (a model backend is wired in).
  fn is_ready(&self) -> bool {
    true
  }
}

/// One chat-completions round trip: messages and tools in, assistant turn out.
#[async_trait]
pub trait ChatModel: Send + Sync {
  async fn chat(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ChatMessage, AgentError>;

  fn model_name(&self) -> &str;
}

/// Conversation window for one agent call.
///
/// The system prompt and the task are always kept. Tool exchanges (an
/// assistant turn requesting tools plus the tool results answering it) are
/// evicted oldest-first as whole units once the token estimate exceeds the
/// limit; the newest exchange always stays.
#[derive(Debug)]
pub struct ChatMemory {
  system: ChatMessage,
  task: ChatMessage,
  exchanges: VecDeque<Vec<ChatMessage>>,
  token_limit: usize,
}

impl ChatMemory {
  pub fn new(system: ChatMessage, task: ChatMessage, token_limit: usize) -> Self {
    Self { system, task, exchanges: VecDeque::new(), token_limit }
  }

  pub fn push_exchange(&mut self, exchange: Vec<ChatMessage>) {
    self.exchanges.push_back(exchange);
    while self.exchanges.len() > 1 && self.estimated_tokens() > self.token_limit {
      self.exchanges.pop_front();
      debug!(target: "rag_questions", remaining = self.exchanges.len(), "evicted oldest tool exchange");
    }
  }

  pub fn estimated_tokens(&self) -> usize {
    std::iter::once(&self.system)
      .chain(std::iter::once(&self.task))
      .chain(self.exchanges.iter().flatten())
      .map(|m| estimate_tokens(m.text()) + m.requested_tools().iter().map(|c| estimate_tokens(&c.function.arguments)).sum::<usize>())
      .sum()
  }

  pub fn messages(&self) -> Vec<ChatMessage> {
    let mut out = vec![self.system.clone(), self.task.clone()];
    out.extend(self.exchanges.iter().flatten().cloned());
    out
  }

  pub fn exchange_count(&self) -> usize {
    self.exchanges.len()
  }
}

#[derive(Deserialize)]
struct QueryArgs {
  input: String,
}

/// Tool-calling agent over a chat model and a document index.
pub struct RagAgent {
  llm: Option<Arc<dyn ChatModel>>,
  index: Arc<dyn DocumentIndex>,
  system_prompt: String,
  tool: ToolSpec,
  max_iterations: usize,
  memory_token_limit: usize,
}

impl RagAgent {
  /// Production wiring: an OpenAI-compatible client when an API key is set.
  pub fn new(
    llm_settings: &LlmSettings,
    index_settings: &IndexSettings,
    index: Arc<dyn DocumentIndex>,
    system_prompt: String,
  ) -> Self {
    let llm = OpenAI::from_settings(llm_settings).map(|c| Arc::new(c) as Arc<dyn ChatModel>);
    Self::with_model(llm, llm_settings, index_settings, index, system_prompt)
  }

  pub fn with_model(
    llm: Option<Arc<dyn ChatModel>>,
    llm_settings: &LlmSettings,
    index_settings: &IndexSettings,
    index: Arc<dyn DocumentIndex>,
    system_prompt: String,
  ) -> Self {
    Self {
      llm,
      index,
      system_prompt,
      tool: ToolSpec::text_query(&index_settings.tool_name, &index_settings.tool_description),
      max_iterations: llm_settings.max_iterations.max(1),
      memory_token_limit: llm_settings.memory_token_limit,
    }
  }

  pub fn model(&self) -> Option<&str> {
    self.llm.as_ref().map(|l| l.model_name())
  }

  async fn run_tool(&self, name: &str, arguments: &str) -> Result<String, AgentError> {
    if name != self.tool.name() {
      warn!(target: "rag_questions", tool = %name, "model requested an unknown tool");
      return Ok(format!("Unknown tool '{name}'. The only available tool is '{}'.", self.tool.name()));
    }
    match serde_json::from_str::<QueryArgs>(arguments) {
      Ok(args) => self.index.query(&args.input).await,
      Err(e) => Ok(format!("Invalid arguments for '{name}': {e}. Expected {{\"input\": \"<query>\"}}.")),
    }
  }
}

#[async_trait]
impl GenerationAgent for RagAgent {
  fn is_ready(&self) -> bool {
    self.llm.is_some()
  }

  #[instrument(level = "info", skip(self, prompt), fields(prompt_len = prompt.len(), run_id = %Uuid::new_v4()))]
  async fn chat(&self, prompt: &str) -> Result<String, AgentError> {
    let llm = self.llm.as_ref().ok_or(AgentError::NotConfigured)?;
    let start = Instant::now();
    let tools = [self.tool.clone()];
    let mut memory = ChatMemory::new(
      ChatMessage::system(self.system_prompt.clone()),
      ChatMessage::user(prompt),
      self.memory_token_limit,
    );
    let mut tool_calls = 0usize;

    for iteration in 1..=self.max_iterations {
      let turn = llm.chat(&memory.messages(), &tools).await?;

      if turn.requested_tools().is_empty() {
        let text = turn.text().trim().to_string();
        if text.is_empty() {
          return Err(AgentError::EmptyResponse);
        }
        info!(target: "rag_questions", iteration, tool_calls, elapsed = ?start.elapsed(), response_len = text.len(), "Agent finished");
        debug!(target: "rag_questions", preview = %trunc_for_log(&text, 240), "Agent response");
        return Ok(text);
      }

      let mut exchange = vec![turn.clone()];
      for call in turn.requested_tools() {
        tool_calls += 1;
        debug!(target: "rag_questions", iteration, tool = %call.function.name, "Tool call");
        let result = self.run_tool(&call.function.name, &call.function.arguments).await?;
        exchange.push(ChatMessage::tool_result(call.id.clone(), result));
      }
      memory.push_exchange(exchange);
    }

    warn!(target: "rag_questions", max_iterations = self.max_iterations, tool_calls, "Agent iteration budget exhausted");
    Err(AgentError::IterationBudgetExhausted(self.max_iterations))
  }

  #[instrument(level = "info", skip(self, prompt), fields(prompt_len = prompt.len()))]
  async fn complete(&self, prompt: &str) -> Result<String, AgentError> {
    let llm = self.llm.as_ref().ok_or(AgentError::NotConfigured)?;
    let turn = llm.chat(&[ChatMessage::user(prompt)], &[]).await?;
    let text = turn.text().trim().to_string();
    if text.is_empty() {
      return Err(AgentError::EmptyResponse);
    }
    Ok(text)
  }
}
