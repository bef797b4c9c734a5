//! Reasoning Loop
//!
//! Implements the ReAct (Reason + Act) pattern over native tool calling.
//! One user turn walks the state machine
//! `AwaitingModelDecision -> ExecutingTools -> AwaitingModelDecision -> ... -> Done`,
//! bounded by a round counter.

use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::provider::{GenerationOptions, LlmProvider, TokenUsage};
use crate::tool::{ToolCall, ToolRegistry, ToolResult};

/// Default cap on model consultations per turn
pub const DEFAULT_MAX_ROUNDS: usize = 10;

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt placed at the start of every turn
    pub system_prompt: String,

    /// Maximum model consultations per turn before giving up
    pub max_rounds: usize,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            generation: GenerationOptions::default(),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful research assistant.

Use the available tools whenever they can improve your answer: search the web for \
current information, look up the weather for a place, or find recent research papers. \
After receiving tool results, synthesize them into a concise, accurate response. \
If you can answer directly without tools, do so.";

/// Where a turn currently stands
#[derive(Debug)]
enum TurnState {
    AwaitingModelDecision,
    ExecutingTools(Vec<ToolCall>),
    Done(String),
}

/// Everything a finished turn produced
#[derive(Clone, Debug)]
pub struct ConversationOutcome {
    /// Full message history of the turn
    pub conversation: Conversation,

    /// Final answer text
    pub answer: String,

    /// Model consultations used
    pub rounds: usize,

    /// Token usage summed over all rounds, if the provider reported any
    pub usage: Option<TokenUsage>,
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Run one user turn on a fresh conversation
    pub async fn ask(&self, question: &str) -> Result<ConversationOutcome> {
        let mut conversation = Conversation::with_system_prompt(&self.config.system_prompt);
        conversation.push(Message::user(question));
        self.run(conversation).await
    }

    /// Drive the turn state machine until the model produces a final answer
    pub async fn run(&self, mut conversation: Conversation) -> Result<ConversationOutcome> {
        let schemas = self.tools.schemas();
        let mut state = TurnState::AwaitingModelDecision;
        let mut rounds = 0;
        let mut usage: Option<TokenUsage> = None;

        loop {
            state = match state {
                TurnState::AwaitingModelDecision => {
                    if rounds >= self.config.max_rounds {
                        tracing::warn!(rounds, "Round limit reached without a final answer");
                        return Err(AgentError::RoundLimitExceeded(self.config.max_rounds));
                    }
                    rounds += 1;
                    debug_assert!(conversation.pending_tool_calls().is_empty());

                    let completion = self
                        .provider
                        .complete(conversation.messages(), &schemas, &self.config.generation)
                        .await?;

                    if let Some(round_usage) = completion.usage {
                        *usage.get_or_insert_with(TokenUsage::default) += round_usage;
                    }

                    if completion.tool_calls.is_empty() {
                        conversation.push(Message::assistant(completion.content.clone()));
                        TurnState::Done(completion.content)
                    } else {
                        tracing::debug!(
                            round = rounds,
                            calls = completion.tool_calls.len(),
                            "Model requested tools"
                        );
                        conversation.push(Message::assistant_with_calls(
                            completion.content,
                            completion.tool_calls.clone(),
                        ));
                        TurnState::ExecutingTools(completion.tool_calls)
                    }
                }
                TurnState::ExecutingTools(calls) => {
                    for call in calls {
                        let result = self.execute_tool(&call).await;
                        conversation.push(Message::tool(call.id, call.name, result.output));
                    }
                    TurnState::AwaitingModelDecision
                }
                TurnState::Done(answer) => {
                    return Ok(ConversationOutcome {
                        conversation,
                        answer,
                        rounds,
                        usage,
                    });
                }
            };
        }
    }

    /// Execute a tool call; failures become error text for the model
    async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        tracing::debug!(tool = %call.name, id = %call.id, "Executing tool");

        match self.tools.execute(call).await {
            Ok(result) => {
                if !result.success {
                    tracing::debug!(tool = %call.name, "Tool reported an error");
                }
                result
            }
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call failed");
                ToolResult::failure(call.name.clone(), format!("Error: {e}")).with_id(&call.id)
            }
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get the provider
    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
#[derive(Default)]
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: Option<Arc<ToolRegistry>>,
    config: AgentConfig,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    #[must_use]
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub const fn max_rounds(mut self, max: usize) -> Self {
        self.config.max_rounds = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        if self.config.max_rounds == 0 {
            return Err(AgentError::Config("max_rounds must be at least 1".into()));
        }

        Ok(Agent::new(
            provider,
            self.tools.unwrap_or_default(),
            self.config,
        ))
    }
}
