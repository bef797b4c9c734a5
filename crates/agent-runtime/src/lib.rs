//! # agent-runtime
//!
//! Runtime providers for the research agent.
//!
//! ## Providers
//!
//! - **Groq** (default): hosted inference over the OpenAI-compatible
//!   `chat/completions` API, with native tool calling
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::GroqProvider;
//!
//! let provider = GroqProvider::from_env()?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .tools(client.registry())
//!     .build()?;
//! ```

pub mod groq;

pub use groq::{GroqConfig, GroqProvider};

// Re-export core types for convenience
pub use agent_core::{Agent, AgentError, LlmProvider, Message, Result, ToolRegistry};
