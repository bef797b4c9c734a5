//! Session Management
//!
//! An [`AgentSession`] is built once at startup and handed by reference to
//! whatever processes user turns. It owns the agent (and through it the
//! provider and tool registry); nothing is kept in process-wide statics.
//! Conversations are not carried across turns.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::reasoning::{Agent, ConversationOutcome};

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A console session: one agent, many independent turns
pub struct AgentSession {
    id: SessionId,
    agent: Agent,
    turns: AtomicUsize,
}

impl AgentSession {
    pub fn new(agent: Agent) -> Self {
        Self {
            id: SessionId::new(),
            agent,
            turns: AtomicUsize::new(0),
        }
    }

    pub const fn id(&self) -> &SessionId {
        &self.id
    }

    pub const fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Number of turns started in this session
    pub fn turns(&self) -> usize {
        self.turns.load(Ordering::Relaxed)
    }

    /// Run one user turn against a fresh conversation
    pub async fn process_turn(&self, input: &str) -> Result<ConversationOutcome> {
        let turn = self.turns.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(session = %self.id, turn, "Starting turn");

        let outcome = self.agent.ask(input).await;
        match &outcome {
            Ok(done) => tracing::info!(session = %self.id, turn, rounds = done.rounds, "Turn finished"),
            Err(e) => tracing::warn!(session = %self.id, turn, error = %e, "Turn failed"),
        }
        outcome
    }
}
