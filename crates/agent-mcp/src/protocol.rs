//! Wire Protocol
//!
//! JSON-RPC 2.0 envelopes and the MCP tool payloads carried inside them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use agent_core::{Arguments, ToolSchema};

pub const JSONRPC_VERSION: &str = "2.0";

/// MCP revision spoken by both sides
pub const PROTOCOL_VERSION: &str = "2025-03-26";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Request identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcId {
    Number(i64),
    String(String),
}

impl std::fmt::Display for JsonRpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// Request, or notification when `id` is absent
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonRpcId>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: JsonRpcId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: None,
            method: method.into(),
            params,
        }
    }

    pub const fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Error object of a failed request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcPayload {
    Success { result: Value },
    Error { error: JsonRpcError },
}

/// Response to a request; `id` is null only for unparsable requests
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<JsonRpcId>,
    #[serde(flatten)]
    pub payload: JsonRpcPayload,
}

impl JsonRpcResponse {
    pub fn success(id: JsonRpcId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: Some(id),
            payload: JsonRpcPayload::Success { result },
        }
    }

    pub fn error(id: Option<JsonRpcId>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            payload: JsonRpcPayload::Error {
                error: JsonRpcError {
                    code,
                    message: message.into(),
                    data: None,
                },
            },
        }
    }
}

/// Anything one peer may send the other
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Response(JsonRpcResponse),
    Request(JsonRpcRequest),
}

/// Name and version of a peer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

impl Implementation {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    pub client_info: Implementation,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    pub server_info: Implementation,
}

/// A tool as advertised by `tools/list`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpToolDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: Value,
}

impl From<&ToolSchema> for McpToolDefinition {
    fn from(schema: &ToolSchema) -> Self {
        Self {
            name: schema.name.clone(),
            description: Some(schema.description.clone()),
            input_schema: schema.input_schema(),
        }
    }
}

impl From<&McpToolDefinition> for ToolSchema {
    fn from(def: &McpToolDefinition) -> Self {
        Self::from_input_schema(
            def.name.clone(),
            def.description.clone().unwrap_or_default(),
            &def.input_schema,
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    pub tools: Vec<McpToolDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Arguments,
}

/// One block of tool output
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text {
        text: String,
    },
    /// Non-text blocks are tolerated but carry nothing for the model here
    #[serde(other)]
    Unsupported,
}

impl Content {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Unsupported => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<Content>,
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    pub fn text(text: impl Into<String>, is_error: bool) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
            is_error,
        }
    }

    /// All text blocks joined by newlines
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(Content::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_shapes() {
        let ok: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 4, "result": {"tools": []}}))
                .unwrap();
        assert!(matches!(
            ok,
            JsonRpcMessage::Response(JsonRpcResponse {
                id: Some(JsonRpcId::Number(4)),
                payload: JsonRpcPayload::Success { .. },
                ..
            })
        ));

        let err: JsonRpcMessage = serde_json::from_value(json!({
            "jsonrpc": "2.0", "id": "x", "error": {"code": -32601, "message": "nope"}
        }))
        .unwrap();
        assert!(matches!(
            err,
            JsonRpcMessage::Response(JsonRpcResponse {
                payload: JsonRpcPayload::Error { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_notification_is_request_without_id() {
        let msg: JsonRpcMessage = serde_json::from_value(
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .unwrap();
        match msg {
            JsonRpcMessage::Request(req) => assert!(req.is_notification()),
            JsonRpcMessage::Response(_) => panic!("notification parsed as response"),
        }
    }

    #[test]
    fn test_notification_serializes_without_id() {
        let value =
            serde_json::to_value(JsonRpcRequest::notification("notifications/initialized", None))
                .unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("params").is_none());
    }

    #[test]
    fn test_call_result_wire_names() {
        let value = serde_json::to_value(CallToolResult::text("boom", true)).unwrap();
        assert_eq!(value, json!({"content": [{"type": "text", "text": "boom"}], "isError": true}));

        let mixed: CallToolResult = serde_json::from_value(json!({
            "content": [{"type": "image", "data": "..", "mimeType": "image/png"}, {"type": "text", "text": "hi"}]
        }))
        .unwrap();
        assert_eq!(mixed.joined_text(), "hi");
        assert!(!mixed.is_error);
    }
}
