//! Groq LLM Provider
//!
//! Implementation of `LlmProvider` over the OpenAI-compatible
//! `chat/completions` endpoint that Groq exposes. Any other service speaking
//! the same dialect works by pointing `GROQ_BASE_URL` at it.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::Message,
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, TokenUsage},
    tool::{Arguments, ToolCall, ToolSchema},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq provider configuration
#[derive(Clone, Debug)]
pub struct GroqConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GroqConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 60,
        }
    }

    /// Read `GROQ_API_KEY`, `GROQ_BASE_URL` and `AGENT_REQUEST_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Config("GROQ_API_KEY is not set".into()))?;
        let base_url = std::env::var("GROQ_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let timeout_secs = std::env::var("AGENT_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(60);

        Ok(Self {
            api_key,
            base_url,
            timeout_secs,
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Groq LLM provider
pub struct GroqProvider {
    client: reqwest::Client,
    config: GroqConfig,
}

impl GroqProvider {
    /// Create from configuration
    pub fn from_config(config: GroqConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(GroqConfig::from_env()?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the request body for one model round
    fn build_request(
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> ChatRequest {
        ChatRequest {
            model: options.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            tools: tools.iter().map(ChatTool::from).collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }

    /// Convert an API response to an agent completion
    fn convert_completion(response: ChatResponse) -> Result<Completion> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Parse("response did not include choices".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let arguments = parse_arguments(&call.function.name, &call.function.arguments)?;
                Ok(ToolCall::new(call.function.name, arguments).with_id(call.id))
            })
            .collect::<Result<Vec<_>>>()?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("tool_calls") => FinishReason::ToolUse,
            Some("content_filter") => FinishReason::ContentFilter,
            _ if !tool_calls.is_empty() => FinishReason::ToolUse,
            _ => FinishReason::Stop,
        };

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            model: response.model,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: Some(finish_reason),
        })
    }
}

/// Tool arguments arrive as a JSON-encoded string
fn parse_arguments(tool: &str, raw: &str) -> Result<Arguments> {
    if raw.trim().is_empty() {
        return Ok(Arguments::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Arguments::new()),
        Ok(other) => Err(AgentError::Parse(format!(
            "arguments for '{tool}' must be an object, got {other}"
        ))),
        Err(e) => Err(AgentError::Parse(format!("arguments for '{tool}': {e}"))),
    }
}

fn map_status(status: StatusCode, body: &str) -> AgentError {
    let message = extract_error_message(body).unwrap_or_else(|| format!("HTTP {status}"));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(message),
        s if s.is_server_error() => AgentError::ProviderUnavailable(message),
        _ => AgentError::Provider(message),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok()?;
    Some(parsed.error.message)
}

fn map_transport(err: &reqwest::Error) -> AgentError {
    if err.is_timeout() || err.is_connect() {
        AgentError::ProviderUnavailable(err.to_string())
    } else {
        AgentError::Provider(err.to_string())
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &str {
        "Groq"
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => Ok(true),
            Ok(r) => {
                tracing::warn!(status = %r.status(), "Groq health check failed");
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("Groq health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = Self::build_request(messages, tools, options);
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Requesting completion"
        );

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_transport(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| map_transport(&e))?;
        if !status.is_success() {
            return Err(map_status(status, &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| AgentError::Parse(format!("completion body: {e}")))?;
        Self::convert_completion(parsed)
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ChatToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        let mut out = Self {
            role: "user",
            content: message.content().to_string(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        };
        match message {
            Message::System { .. } => out.role = "system",
            Message::User { .. } => {}
            Message::Assistant { tool_calls, .. } => {
                out.role = "assistant";
                out.tool_calls = tool_calls.iter().map(ChatToolCall::from).collect();
            }
            Message::Tool { call_id, name, .. } => {
                out.role = "tool";
                out.tool_call_id = Some(call_id.clone());
                out.name = Some(name.clone());
            }
        }
        out
    }
}

#[derive(Debug, Serialize)]
struct ChatToolCall {
    id: String,
    r#type: &'static str,
    function: ChatFunctionCall,
}

impl From<&ToolCall> for ChatToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            r#type: "function",
            function: ChatFunctionCall {
                name: call.name.clone(),
                arguments: Value::Object(call.arguments.clone()).to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    r#type: &'static str,
    function: ChatFunction,
}

impl From<&ToolSchema> for ChatTool {
    fn from(schema: &ToolSchema) -> Self {
        Self {
            r#type: "function",
            function: ChatFunction {
                name: schema.name.clone(),
                description: schema.description.clone(),
                parameters: schema.input_schema(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ChatResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseToolCall {
    id: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::tool::{ParamType, ParameterSchema};
    use serde_json::json;

    #[test]
    fn test_config_defaults() {
        let config = GroqConfig::new("key");
        assert_eq!(config.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_request_shape() {
        let mut args = Arguments::new();
        args.insert("location".into(), json!("Paris"));
        let call = ToolCall::new("get_weather", args).with_id("call_1");

        let messages = vec![
            Message::system("You are helpful."),
            Message::user("Weather in Paris?"),
            Message::assistant_with_calls("", vec![call]),
            Message::tool("call_1", "get_weather", "Weather in Paris: sunny"),
        ];
        let tools = vec![ToolSchema::new("get_weather", "Current weather").param(
            ParameterSchema::required("location", ParamType::String, "City"),
        )];

        let request = GroqProvider::build_request(&messages, &tools, &GenerationOptions::default());
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "qwen-qwq-32b");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][2]["role"], "assistant");
        assert_eq!(body["messages"][2]["tool_calls"][0]["type"], "function");
        assert_eq!(
            body["messages"][2]["tool_calls"][0]["function"]["arguments"],
            r#"{"location":"Paris"}"#
        );
        assert_eq!(body["messages"][3]["role"], "tool");
        assert_eq!(body["messages"][3]["tool_call_id"], "call_1");
        assert!(body["messages"][1].get("tool_calls").is_none());
        assert_eq!(body["tools"][0]["function"]["parameters"]["required"][0], "location");
    }

    #[test]
    fn test_tool_call_response() {
        let response: ChatResponse = serde_json::from_value(json!({
            "model": "qwen-qwq-32b",
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "search_papers", "arguments": "{\"query\":\"transformers\",\"max_results\":2}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150}
        }))
        .unwrap();

        let completion = GroqProvider::convert_completion(response).unwrap();
        assert_eq!(completion.content, "");
        assert_eq!(completion.finish_reason, Some(FinishReason::ToolUse));
        assert_eq!(completion.tool_calls[0].id, "call_abc");
        assert_eq!(completion.tool_calls[0].str_arg("query"), Some("transformers"));
        assert_eq!(completion.tool_calls[0].int_arg("max_results"), Some(2));
        assert_eq!(completion.usage.unwrap().total_tokens, 150);
    }

    #[test]
    fn test_bad_arguments_are_parse_errors() {
        assert!(matches!(
            parse_arguments("search_web", "{not json"),
            Err(AgentError::Parse(_))
        ));
        assert!(matches!(
            parse_arguments("search_web", "[1, 2]"),
            Err(AgentError::Parse(_))
        ));
        assert!(parse_arguments("search_web", "").unwrap().is_empty());
    }

    #[test]
    fn test_empty_choices_is_parse_error() {
        let response: ChatResponse =
            serde_json::from_value(json!({"model": "m", "choices": []})).unwrap();
        assert!(matches!(
            GroqProvider::convert_completion(response),
            Err(AgentError::Parse(_))
        ));
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error":{"message":"Invalid API Key"}}"#;
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, body),
            AgentError::Auth(m) if m == "Invalid API Key"
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "{}"),
            AgentError::RateLimited(_)
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, ""),
            AgentError::ProviderUnavailable(_)
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_REQUEST, ""),
            AgentError::Provider(_)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let mut config = GroqConfig::new("key").with_base_url("http://127.0.0.1:1/v1");
        config.timeout_secs = 2;
        let provider = GroqProvider::from_config(config).unwrap();

        assert!(!provider.health_check().await.unwrap());
        let err = provider
            .complete(&[Message::user("hi")], &[], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ProviderUnavailable(_)));
    }
}
