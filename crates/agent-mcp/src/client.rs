//! Multi-Server Client
//!
//! Connects to every configured tool server, flattens their tools into one
//! [`ToolRegistry`] and routes calls back to the server that owns them.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use agent_core::{AgentError, Arguments, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};

use crate::error::{McpError, Result};
use crate::transport::{self, McpTransport, TransportConfig};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// One tool server entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    #[serde(flatten)]
    pub transport: TransportConfig,
}

impl ServerConfig {
    pub fn stdio(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: TransportConfig::Stdio {
                command: command.into(),
                args: Vec::new(),
                env: std::collections::HashMap::new(),
            },
        }
    }

    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: TransportConfig::Http { url: url.into() },
        }
    }
}

/// Client configuration: which servers to reach and how long to wait
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    pub servers: Vec<ServerConfig>,
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            servers: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub const fn new(servers: Vec<ServerConfig>) -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            servers,
        }
    }

    /// Read a JSON server list from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| McpError::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| McpError::Config(format!("invalid server config {}: {e}", path.display())))
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// A tool that lives on a remote server
pub struct RemoteTool {
    schema: ToolSchema,
    server: String,
    transport: Arc<dyn McpTransport>,
}

impl RemoteTool {
    pub fn new(schema: ToolSchema, server: impl Into<String>, transport: Arc<dyn McpTransport>) -> Self {
        Self {
            schema,
            server: server.into(),
            transport,
        }
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn schema(&self) -> ToolSchema {
        self.schema.clone()
    }

    async fn execute(&self, call: &ToolCall) -> agent_core::Result<ToolResult> {
        tracing::debug!(server = %self.server, tool = %call.name, "Remote tool call");
        let result = self
            .transport
            .call_tool(&call.name, call.arguments.clone())
            .await
            .map_err(AgentError::from)?;

        let output = result.joined_text();
        Ok(if result.is_error {
            ToolResult::failure(&call.name, output)
        } else {
            ToolResult::success(&call.name, output)
        })
    }
}

/// Registry of every tool reachable through the configured servers
pub struct MultiServerClient {
    config: ClientConfig,
    registry: Arc<ToolRegistry>,
    connected: Vec<String>,
}

impl MultiServerClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            registry: Arc::new(ToolRegistry::new()),
            connected: Vec::new(),
        }
    }

    /// Connect to every server and collect its tools.
    ///
    /// A server that cannot be reached is logged and skipped. When two
    /// servers offer the same tool name, the one listed first keeps it.
    pub async fn discover(&mut self) -> Vec<ToolSchema> {
        let timeout = self.config.request_timeout();
        let mut registry = ToolRegistry::new();
        let mut connected = Vec::new();

        for server in &self.config.servers {
            match Self::connect_server(server, timeout).await {
                Ok((transport, schemas)) => {
                    tracing::info!(
                        server = %server.name,
                        transport = %transport.kind(),
                        endpoint = transport.endpoint(),
                        tools = schemas.len(),
                        "Connected to tool server"
                    );
                    for schema in schemas {
                        let name = schema.name.clone();
                        let tool = RemoteTool::new(schema, &server.name, Arc::clone(&transport));
                        if !registry.register(tool) {
                            tracing::warn!(server = %server.name, tool = %name, "Tool already provided by another server, skipped");
                        }
                    }
                    connected.push(server.name.clone());
                }
                Err(e) => {
                    tracing::warn!(server = %server.name, error = %e, "Tool server unavailable, skipping");
                }
            }
        }

        self.registry = Arc::new(registry);
        self.connected = connected;
        self.registry.schemas()
    }

    async fn connect_server(
        server: &ServerConfig,
        timeout: Duration,
    ) -> Result<(Arc<dyn McpTransport>, Vec<ToolSchema>)> {
        let transport = transport::connect(&server.transport, timeout).await?;
        let schemas = transport
            .list_tools()
            .await?
            .iter()
            .map(ToolSchema::from)
            .collect();
        Ok((transport, schemas))
    }

    /// Call a tool by name and return its text, error text included
    pub async fn call(&self, name: &str, arguments: Arguments) -> agent_core::Result<String> {
        let result = self.registry.execute(&ToolCall::new(name, arguments)).await?;
        Ok(result.output)
    }

    /// Shared registry for the reasoning loop
    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    /// Servers that answered the handshake, in configuration order
    pub fn connected_servers(&self) -> &[String] {
        &self.connected
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_file_shape() {
        let config: ClientConfig = serde_json::from_value(json!({
            "servers": [
                {"name": "websearch", "transport": "stdio", "command": "websearch-server"},
                {"name": "weather", "transport": "streamable_http", "url": "http://127.0.0.1:8000/mcp"}
            ]
        }))
        .unwrap();

        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.servers[0], ServerConfig::stdio("websearch", "websearch-server"));
        assert_eq!(config.servers[1], ServerConfig::http("weather", "http://127.0.0.1:8000/mcp"));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = ClientConfig::load("/nonexistent/servers.json").unwrap_err();
        assert!(matches!(err, McpError::Config(_)));
    }

    #[tokio::test]
    async fn test_discover_skips_unreachable_servers() {
        let mut client = MultiServerClient::new(ClientConfig::new(vec![ServerConfig::stdio(
            "ghost",
            "no-such-tool-server-binary",
        )]));

        let tools = client.discover().await;
        assert!(tools.is_empty());
        assert!(client.connected_servers().is_empty());

        let err = client.call("search_web", Arguments::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolNotFound(_)));
    }
}
