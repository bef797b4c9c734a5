//! The stdio server binaries driven through the real client transport.
//!
//! Nothing here reaches the network: calls are shaped so the servers answer
//! from argument validation or dispatch alone.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use agent_core::{AgentError, Arguments, Tool, ToolCall, ToolSchema};
use agent_mcp::transport::connect;
use agent_mcp::{
    ClientConfig, McpTransport, MultiServerClient, RemoteTool, ServerConfig, StdioTransport,
    TransportConfig,
};

const PAPERS: &str = env!("CARGO_BIN_EXE_papers-server");
const WEBSEARCH: &str = env!("CARGO_BIN_EXE_websearch-server");
const TIMEOUT: Duration = Duration::from_secs(10);

fn stdio(command: &str) -> TransportConfig {
    TransportConfig::Stdio {
        command: command.into(),
        args: Vec::new(),
        env: HashMap::new(),
    }
}

#[tokio::test]
async fn test_discover_papers_server() {
    let mut client = MultiServerClient::new(ClientConfig::new(vec![
        ServerConfig::stdio("papers", PAPERS),
        ServerConfig::stdio("missing", "/nonexistent/websearch-server"),
    ]));

    let tools = client.discover().await;
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["search_papers"]);
    assert_eq!(client.connected_servers(), ["papers"]);

    // Checked against the advertised schema before anything is sent
    let err = client.call("search_papers", Arguments::new()).await.unwrap_err();
    assert!(matches!(err, AgentError::ToolValidation(msg) if msg.contains("query")));
}

#[tokio::test]
async fn test_remote_tool_reports_server_error_text() {
    let transport = connect(&stdio(PAPERS), TIMEOUT).await.unwrap();
    let definitions = transport.list_tools().await.unwrap();
    assert_eq!(definitions.len(), 1);

    let tool = RemoteTool::new(ToolSchema::from(&definitions[0]), "papers", Arc::clone(&transport));
    let result = tool
        .execute(&ToolCall::new("search_papers", Arguments::new()))
        .await
        .unwrap();

    assert!(!result.success);
    assert!(result.output.contains("Missing required parameter: query"));
}

#[tokio::test]
async fn test_concurrent_calls_get_their_own_responses() {
    let transport = connect(&stdio(PAPERS), TIMEOUT).await.unwrap();

    let (missing_query, unknown_tool, ping) = tokio::join!(
        transport.call_tool("search_papers", Arguments::new()),
        transport.call_tool("search_patents", Arguments::new()),
        transport.request("ping", None),
    );

    let missing_query = missing_query.unwrap();
    assert!(missing_query.is_error);
    assert!(missing_query.joined_text().contains("query"));

    let unknown_tool = unknown_tool.unwrap();
    assert!(unknown_tool.is_error);
    assert!(unknown_tool.joined_text().contains("search_patents"));

    assert!(ping.is_ok());
}

#[cfg(unix)]
#[tokio::test]
async fn test_server_survives_interrupt() {
    let transport = StdioTransport::spawn(WEBSEARCH, &[], &HashMap::new(), TIMEOUT).unwrap();
    transport.initialize().await.unwrap();
    transport.request("ping", None).await.unwrap();

    let pid = transport.pid().unwrap();
    let status = std::process::Command::new("kill")
        .args(["-INT", &pid.to_string()])
        .status()
        .unwrap();
    assert!(status.success());
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(transport.request("ping", None).await.is_ok());
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_server_runs_in_its_own_process_group() {
    fn process_group(pid: &str) -> String {
        let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).unwrap();
        // pid (comm) state ppid pgrp ...
        let after_comm = &stat[stat.rfind(')').unwrap() + 1..];
        after_comm.split_whitespace().nth(2).unwrap().to_string()
    }

    let transport = StdioTransport::spawn(PAPERS, &[], &HashMap::new(), TIMEOUT).unwrap();
    let pid = transport.pid().unwrap().to_string();

    let child_group = process_group(&pid);
    assert_eq!(child_group, pid);
    assert_ne!(child_group, process_group("self"));
}
