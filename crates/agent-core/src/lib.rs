//! # agent-core
//!
//! Core agent logic with provider-agnostic LLM abstraction and the
//! tool-invocation contract.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      AgentSession                            │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Reasoning  │  │    Tool     │  │   LlmProvider       │  │
//! │  │    Loop     │──│   Registry  │──│   (Strategy)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tools in the registry may run in-process or be proxies for tools served
//! by another process; the loop cannot tell the difference.

pub mod error;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider, TokenUsage};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, ConversationOutcome};
pub use session::AgentSession;
pub use tool::{
    Arguments, ParamType, ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema,
};
