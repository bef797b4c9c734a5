//! Tool Server
//!
//! Serves a [`ToolRegistry`] to remote clients. Tool failures never cross
//! the wire as protocol errors: they come back as `isError` text so the
//! model always has something to read.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use agent_core::{ToolCall, ToolRegistry};

use crate::error::Result;
use crate::protocol::{
    CallToolParams, CallToolResult, INVALID_PARAMS, INVALID_REQUEST, Implementation,
    InitializeParams, InitializeResult, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    McpToolDefinition, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};

/// A named set of tools reachable over one transport
pub struct ToolServer {
    info: Implementation,
    tools: Arc<ToolRegistry>,
}

impl ToolServer {
    pub fn new(name: impl Into<String>, tools: ToolRegistry) -> Self {
        Self {
            info: Implementation::new(name, env!("CARGO_PKG_VERSION")),
            tools: Arc::new(tools),
        }
    }

    pub const fn info(&self) -> &Implementation {
        &self.info
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handle one raw JSON-RPC payload (single message or batch).
    ///
    /// Returns `None` when nothing needs to be sent back (notifications).
    pub async fn handle_raw(&self, raw: &str) -> Option<Value> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Unparsable message");
                return to_value(JsonRpcResponse::error(None, PARSE_ERROR, e.to_string()));
            }
        };

        match value {
            Value::Array(items) => {
                let mut responses = Vec::new();
                for item in items {
                    if let Some(response) = self.handle_value(item).await {
                        responses.push(response);
                    }
                }
                if responses.is_empty() {
                    None
                } else {
                    to_value(responses)
                }
            }
            single => to_value(self.handle_value(single).await?),
        }
    }

    async fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle(request).await,
            Err(e) => Some(JsonRpcResponse::error(None, INVALID_REQUEST, e.to_string())),
        }
    }

    /// Dispatch one request; notifications yield `None`
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            tracing::debug!(method = %request.method, "Notification");
            return None;
        };

        tracing::debug!(method = %request.method, %id, "Request");
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize(request.params)),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, self.list_tools()),
            "tools/call" => {
                match request
                    .params
                    .map(serde_json::from_value::<CallToolParams>)
                    .transpose()
                {
                    Ok(Some(params)) => {
                        let result = self.call_tool(params).await;
                        match serde_json::to_value(result) {
                            Ok(v) => JsonRpcResponse::success(id, v),
                            Err(e) => JsonRpcResponse::error(
                                Some(id),
                                crate::protocol::INTERNAL_ERROR,
                                e.to_string(),
                            ),
                        }
                    }
                    Ok(None) => JsonRpcResponse::error(
                        Some(id),
                        INVALID_PARAMS,
                        "tools/call requires params",
                    ),
                    Err(e) => JsonRpcResponse::error(Some(id), INVALID_PARAMS, e.to_string()),
                }
            }
            other => JsonRpcResponse::error(
                Some(id),
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        };
        Some(response)
    }

    fn initialize(&self, params: Option<Value>) -> Value {
        let requested = params
            .and_then(|p| serde_json::from_value::<InitializeParams>(p).ok())
            .map(|p| {
                tracing::info!(client = %p.client_info.name, "Client connected");
                p.protocol_version
            });

        let result = InitializeResult {
            protocol_version: requested.unwrap_or_else(|| PROTOCOL_VERSION.into()),
            capabilities: json!({ "tools": { "listChanged": false } }),
            server_info: self.info.clone(),
        };
        serde_json::to_value(result).unwrap_or_else(|_| json!({}))
    }

    fn list_tools(&self) -> Value {
        let tools = self
            .tools
            .schemas()
            .iter()
            .map(McpToolDefinition::from)
            .collect();
        serde_json::to_value(ListToolsResult {
            tools,
            next_cursor: None,
        })
        .unwrap_or_else(|_| json!({ "tools": [] }))
    }

    /// Run a tool on its own task so that even a panic turns into text
    async fn call_tool(&self, params: CallToolParams) -> CallToolResult {
        let tools = Arc::clone(&self.tools);
        let call = ToolCall::new(params.name, params.arguments);
        let name = call.name.clone();

        match tokio::spawn(async move { tools.execute(&call).await }).await {
            Ok(Ok(result)) => {
                tracing::info!(tool = %name, success = result.success, "Tool call");
                CallToolResult::text(result.output, !result.success)
            }
            Ok(Err(e)) => {
                tracing::warn!(tool = %name, error = %e, "Tool call rejected");
                CallToolResult::text(format!("Error: {e}"), true)
            }
            Err(join) => {
                tracing::error!(tool = %name, error = %join, "Tool task failed");
                CallToolResult::text(format!("Error: tool '{name}' failed unexpectedly"), true)
            }
        }
    }

    /// Serve newline-delimited JSON-RPC over this process's stdin/stdout.
    ///
    /// Interrupts are ignored: the server lives until its client closes stdin.
    pub async fn serve_stdio(self) -> Result<()> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut interrupts = signal(SignalKind::interrupt())?;
            tokio::spawn(async move {
                while interrupts.recv().await.is_some() {
                    tracing::debug!("Interrupt ignored, waiting for stdin to close");
                }
            });
        }

        self.serve_lines(tokio::io::stdin(), tokio::io::stdout())
            .await
    }

    /// Serve newline-delimited JSON-RPC over any reader/writer pair
    pub async fn serve_lines<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        tracing::info!(server = %self.info.name, "Serving over stdio");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_raw(&line).await {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        tracing::info!(server = %self.info.name, "Input closed, shutting down");
        Ok(())
    }
}

fn to_value<T: serde::Serialize>(response: T) -> Option<Value> {
    serde_json::to_value(response).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{ParamType, ParameterSchema, Result as CoreResult, Tool, ToolResult, ToolSchema};
    use async_trait::async_trait;

    struct ShoutTool;

    #[async_trait]
    impl Tool for ShoutTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema::new("shout", "Upper-case some text").param(ParameterSchema::required(
                "text",
                ParamType::String,
                "Text to shout",
            ))
        }

        async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
            let text = call.str_arg("text").unwrap_or_default();
            if text == "panic" {
                panic!("asked to");
            }
            Ok(ToolResult::success("shout", text.to_uppercase()))
        }
    }

    fn server() -> ToolServer {
        let mut tools = ToolRegistry::new();
        tools.register(ShoutTool);
        ToolServer::new("test", tools)
    }

    async fn roundtrip(server: &ToolServer, request: Value) -> Value {
        server.handle_raw(&request.to_string()).await.unwrap()
    }

    #[tokio::test]
    async fn test_initialize_and_list() {
        let server = server();
        let init = roundtrip(
            &server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": "2024-11-05", "capabilities": {},
                "clientInfo": {"name": "t", "version": "0"}
            }}),
        )
        .await;
        assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(init["result"]["serverInfo"]["name"], "test");

        let list = roundtrip(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
        assert_eq!(list["result"]["tools"][0]["name"], "shout");
        assert_eq!(list["result"]["tools"][0]["inputSchema"]["required"][0], "text");
    }

    #[tokio::test]
    async fn test_call_success_and_failures_are_text() {
        let server = server();

        let ok = roundtrip(&server, json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": {"name": "shout", "arguments": {"text": "hi"}}}))
        .await;
        assert_eq!(ok["result"]["content"][0]["text"], "HI");
        assert_eq!(ok["result"]["isError"], false);

        let missing = roundtrip(&server, json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
            "params": {"name": "shout", "arguments": {}}}))
        .await;
        assert_eq!(missing["result"]["isError"], true);
        assert!(missing["result"]["content"][0]["text"].as_str().unwrap().starts_with("Error:"));

        let panicked = roundtrip(&server, json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call",
            "params": {"name": "shout", "arguments": {"text": "panic"}}}))
        .await;
        assert_eq!(panicked["result"]["isError"], true);
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let server = server();
        assert!(server
            .handle_raw(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .is_none());

        let unknown = roundtrip(&server, json!({"jsonrpc": "2.0", "id": 9, "method": "resources/list"})).await;
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let garbage = server.handle_raw("{not json").await.unwrap();
        assert_eq!(garbage["error"]["code"], PARSE_ERROR);
        assert!(garbage["id"].is_null());
    }

    #[tokio::test]
    async fn test_serve_lines() {
        let server = server();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"shout","arguments":{"text":"a"}}}"#,
            "\n"
        );
        let mut output = Vec::new();
        server.serve_lines(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["result"]["content"][0]["text"], "A");
    }
}
