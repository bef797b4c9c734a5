//! Error Types for the tool protocol

use thiserror::Error;

use agent_core::AgentError;

use crate::protocol::JsonRpcError;

pub type Result<T> = std::result::Result<T, McpError>;

#[derive(Error, Debug)]
pub enum McpError {
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server error: {0}")]
    Server(JsonRpcError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<McpError> for AgentError {
    fn from(err: McpError) -> Self {
        match err {
            McpError::Config(msg) => Self::Config(msg),
            other => Self::Transport(other.to_string()),
        }
    }
}
