//! Serve a tool registry over HTTP and drive it through the client side

use std::net::SocketAddr;

use agent_core::{
    AgentError, Arguments, ParamType, ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult,
    ToolSchema,
};
use agent_mcp::transport::{McpTransport, TransportKind};
use agent_mcp::{ClientConfig, HttpTransport, MultiServerClient, ServerConfig, ToolServer, http};
use async_trait::async_trait;
use serde_json::json;

struct ReverseTool;

#[async_trait]
impl Tool for ReverseTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("reverse", "Reverse a word")
            .param(ParameterSchema::required("word", ParamType::String, "Word to reverse"))
            .param(ParameterSchema::optional(
                "times",
                ParamType::Integer,
                "How many copies",
                Some(json!(1)),
            ))
    }

    async fn execute(&self, call: &ToolCall) -> agent_core::Result<ToolResult> {
        let word = call.str_arg("word").unwrap_or_default();
        if word.is_empty() {
            return Ok(ToolResult::failure("reverse", "Error: nothing to reverse"));
        }
        let times = usize::try_from(call.int_arg("times").unwrap_or(1)).unwrap_or(1);
        let reversed: String = word.chars().rev().collect();
        Ok(ToolResult::success("reverse", reversed.repeat(times)))
    }
}

async fn spawn_server() -> SocketAddr {
    let mut tools = ToolRegistry::new();
    tools.register(ReverseTool);
    let app = http::router(ToolServer::new("reverser", tools));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn args(value: serde_json::Value) -> Arguments {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_http_transport_handshake_and_call() {
    let addr = spawn_server().await;
    let transport = HttpTransport::new(
        format!("http://{addr}{}", http::MCP_PATH),
        std::time::Duration::from_secs(5),
    )
    .unwrap();

    let init = transport.initialize().await.unwrap();
    assert_eq!(init.server_info.name, "reverser");
    assert_eq!(transport.kind(), TransportKind::Http);

    let tools = transport.list_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "reverse");

    let result = transport
        .call_tool("reverse", args(json!({"word": "abc", "times": "2"})))
        .await
        .unwrap();
    assert!(!result.is_error);
    assert_eq!(result.joined_text(), "cbacba");
}

#[tokio::test]
async fn test_multi_server_discovery_survives_dead_servers() {
    let addr = spawn_server().await;
    let mut client = MultiServerClient::new(ClientConfig {
        request_timeout_secs: 5,
        servers: vec![
            ServerConfig::stdio("missing", "no-such-tool-server-binary"),
            ServerConfig::http("reverser", format!("http://{addr}/mcp")),
            ServerConfig::http("refused", "http://127.0.0.1:1/mcp"),
        ],
    });

    let tools = client.discover().await;
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "reverse");
    assert_eq!(client.connected_servers(), ["reverser".to_string()]);

    let text = client.call("reverse", args(json!({"word": "tool"}))).await.unwrap();
    assert_eq!(text, "loot");

    // Error text from the server passes through untouched
    let text = client.call("reverse", args(json!({"word": ""}))).await.unwrap();
    assert_eq!(text, "Error: nothing to reverse");

    let registry = client.registry();
    let result = registry
        .execute(&ToolCall::new("reverse", args(json!({"word": ""}))))
        .await
        .unwrap();
    assert!(!result.success);

    let err = client.call("forecast", Arguments::new()).await.unwrap_err();
    assert!(matches!(err, AgentError::ToolNotFound(name) if name == "forecast"));
}

#[tokio::test]
async fn test_duplicate_tool_names_keep_first_server() {
    let first = spawn_server().await;
    let second = spawn_server().await;
    let mut client = MultiServerClient::new(ClientConfig::new(vec![
        ServerConfig::http("first", format!("http://{first}/mcp")),
        ServerConfig::http("second", format!("http://{second}/mcp")),
    ]));

    let tools = client.discover().await;
    assert_eq!(tools.len(), 1);
    assert_eq!(client.connected_servers().len(), 2);
}
