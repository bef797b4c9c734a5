//! Error Types for Research Tools

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolsError>;

#[derive(Error, Debug)]
pub enum ToolsError {
    #[error("{0} not found in environment variables")]
    MissingCredential(String),

    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("Unknown error"))]
    UpstreamStatus {
        status: u16,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolsError {
    /// Message carried by an upstream error response, if any
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            Self::UpstreamStatus { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}
