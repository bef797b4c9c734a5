//! Client Transports
//!
//! A transport moves JSON-RPC requests to one tool server and brings the
//! matching response back. Everything above `request`/`notify` (handshake,
//! listing and calling tools) is shared, so callers treat a spawned
//! process and an HTTP endpoint the same way once connected.

mod http;
mod stdio;

pub use http::HttpTransport;
pub use stdio::StdioTransport;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use agent_core::Arguments;

use crate::error::{McpError, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, Implementation, InitializeParams, InitializeResult,
    JsonRpcPayload, JsonRpcResponse, ListToolsResult, McpToolDefinition, PROTOCOL_VERSION,
};

/// Upper bound on `tools/list` pages fetched from one server
pub const MAX_LIST_PAGES: usize = 32;

/// How to reach a tool server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum TransportConfig {
    /// Spawn a process and talk over its stdin/stdout
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
    },
    /// POST to a long-lived endpoint
    #[serde(rename = "streamable_http", alias = "http")]
    Http { url: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    Stdio,
    Http,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Send a request and wait for its response payload
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value>;

    /// Send a notification (no response expected)
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()>;

    fn kind(&self) -> TransportKind;

    /// Command line or URL the transport talks to
    fn endpoint(&self) -> &str;

    /// Protocol handshake; must precede any other request
    async fn initialize(&self) -> Result<InitializeResult> {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.into(),
            capabilities: json!({}),
            client_info: Implementation::new("research-agent", env!("CARGO_PKG_VERSION")),
        };
        let result = self
            .request("initialize", Some(serde_json::to_value(params)?))
            .await?;
        let init: InitializeResult = serde_json::from_value(result)?;
        self.notify("notifications/initialized", None).await?;
        Ok(init)
    }

    /// Fetch the server's tool manifest, following pagination cursors.
    ///
    /// Stops at the first cursor already seen, or after `MAX_LIST_PAGES`.
    async fn list_tools(&self) -> Result<Vec<McpToolDefinition>> {
        let mut tools = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor: Option<String> = None;
        for _ in 0..MAX_LIST_PAGES {
            let params = cursor.as_ref().map_or_else(|| json!({}), |c| json!({ "cursor": c }));
            let page: ListToolsResult =
                serde_json::from_value(self.request("tools/list", Some(params)).await?)?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if seen.insert(next.clone()) => cursor = Some(next),
                Some(next) => {
                    tracing::warn!(endpoint = self.endpoint(), cursor = %next, "Tool list cursor repeated, stopping");
                    return Ok(tools);
                }
                None => return Ok(tools),
            }
        }
        tracing::warn!(endpoint = self.endpoint(), pages = MAX_LIST_PAGES, "Tool list page limit reached");
        Ok(tools)
    }

    /// Invoke one tool
    async fn call_tool(&self, name: &str, arguments: Arguments) -> Result<CallToolResult> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        let result = self
            .request("tools/call", Some(serde_json::to_value(params)?))
            .await?;
        Ok(serde_json::from_value(result)?)
    }
}

/// Establish and handshake a transport from its configuration
pub async fn connect(config: &TransportConfig, timeout: Duration) -> Result<Arc<dyn McpTransport>> {
    let transport: Arc<dyn McpTransport> = match config {
        TransportConfig::Stdio { command, args, env } => {
            Arc::new(StdioTransport::spawn(command, args, env, timeout)?)
        }
        TransportConfig::Http { url } => Arc::new(HttpTransport::new(url, timeout)?),
    };

    let init = transport.initialize().await?;
    tracing::debug!(
        server = %init.server_info.name,
        version = %init.server_info.version,
        protocol = %init.protocol_version,
        "Handshake complete"
    );
    Ok(transport)
}

/// Unwrap a response into its result, turning JSON-RPC errors into `McpError`
pub(crate) fn into_result(response: JsonRpcResponse) -> Result<Value> {
    match response.payload {
        JsonRpcPayload::Success { result } => Ok(result),
        JsonRpcPayload::Error { error } => Err(McpError::Server(error)),
    }
}
