use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap};
use serde_json::Value;

use super::{McpTransport, TransportKind, into_result};
use crate::error::{McpError, Result};
use crate::protocol::{JsonRpcId, JsonRpcMessage, JsonRpcRequest};

const SESSION_HEADER: &str = "mcp-session-id";

/// Tool server behind an HTTP endpoint.
///
/// Each request is one POST. The server may answer with plain JSON or with
/// a short `text/event-stream` whose `data:` lines carry the messages.
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
    next_id: AtomicI64,
    session: Mutex<Option<String>>,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
            next_id: AtomicI64::new(1),
            session: Mutex::new(None),
        })
    }

    async fn post(&self, message: &JsonRpcRequest) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(message);

        let session = self.session.lock().ok().and_then(|s| s.clone());
        if let Some(session) = session {
            request = request.header(SESSION_HEADER, session);
        }

        let response = request.send().await?;
        self.remember_session(response.headers());

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    fn remember_session(&self, headers: &HeaderMap) {
        let Some(id) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) else {
            return;
        };
        if let Ok(mut session) = self.session.lock() {
            if session.as_deref() != Some(id) {
                tracing::debug!(endpoint = %self.endpoint, session = id, "Session established");
                *session = Some(id.to_string());
            }
        }
    }
}

/// Pull every JSON-RPC message out of a response body
fn decode_body(content_type: &str, body: &str) -> Result<Vec<JsonRpcMessage>> {
    let mut messages = Vec::new();
    if content_type.starts_with("text/event-stream") {
        for event in body.split("\n\n") {
            let data: Vec<&str> = event
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(str::trim_start)
                .collect();
            if !data.is_empty() {
                push_messages(&mut messages, serde_json::from_str(&data.join("\n"))?)?;
            }
        }
    } else {
        push_messages(&mut messages, serde_json::from_str(body)?)?;
    }
    Ok(messages)
}

fn push_messages(out: &mut Vec<JsonRpcMessage>, value: Value) -> Result<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                out.push(serde_json::from_value(item)?);
            }
        }
        single => out.push(serde_json::from_value(single)?),
    }
    Ok(())
}

#[async_trait]
impl McpTransport for HttpTransport {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let response = self
            .post(&JsonRpcRequest::new(JsonRpcId::Number(id), method, params))
            .await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        let body = response.text().await?;

        decode_body(&content_type, &body)?
            .into_iter()
            .find_map(|message| match message {
                JsonRpcMessage::Response(r) if r.id == Some(JsonRpcId::Number(id)) => Some(r),
                _ => None,
            })
            .ok_or_else(|| McpError::Protocol(format!("No response for request id {id}")))
            .and_then(into_result)
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        self.post(&JsonRpcRequest::notification(method, params))
            .await
            .map(|_| ())
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_json() {
        let messages =
            decode_body("application/json", r#"{"jsonrpc":"2.0","id":1,"result":{}}"#).unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_decode_event_stream() {
        let body = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\"}\n\n\
                    event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"tools\":[]}}\n\n";
        let messages = decode_body("text/event-stream; charset=utf-8", body).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(
            &messages[1],
            JsonRpcMessage::Response(r) if r.id == Some(JsonRpcId::Number(2))
        ));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_body("application/json", "<html>").is_err());
    }
}
