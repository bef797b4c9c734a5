//! Tool System
//!
//! The tool-invocation contract shared by tool servers and the agent.
//! Tools are registered at runtime and invoked by the reasoning loop,
//! either in-process or through a remote transport wrapped as a [`Tool`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Concrete argument values for a tool call
pub type Arguments = Map<String, Value>;

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call ID used to correlate the result
    #[serde(default = "new_call_id")]
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: Arguments,
}

fn new_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}

impl ToolCall {
    /// Create a call with a freshly generated id
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            id: new_call_id(),
            name: name.into(),
            arguments,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// String argument accessor
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }

    /// Integer argument accessor
    pub fn int_arg(&self, key: &str) -> Option<i64> {
        self.arguments.get(key).and_then(Value::as_i64)
    }
}

/// Result from tool execution
///
/// `output` is always the text handed back to the model, whether the
/// tool succeeded or not. `success` only records which one it was.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID (if provided in request)
    #[serde(default)]
    pub id: Option<String>,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (success message or error)
    pub output: String,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: false,
            output: error.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Primitive JSON Schema type of a parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    /// Anything the schema did not pin down
    Any,
}

impl ParamType {
    /// Map a JSON Schema `type` keyword; unknown keywords become `Any`
    pub fn from_schema_type(keyword: &str) -> Self {
        match keyword {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            _ => Self::Any,
        }
    }

    const fn as_str(self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Array => Some("array"),
            Self::Object => Some("object"),
            Self::Any => None,
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }

    /// Models regularly quote scalars ("3" for 3); accept those.
    fn coerce(self, value: &Value) -> Option<Value> {
        let text = value.as_str()?.trim();
        match self {
            Self::Integer => text.parse::<i64>().ok().map(Value::from),
            Self::Number => text.parse::<f64>().ok().map(Value::from),
            Self::Boolean => text.parse::<bool>().ok().map(Value::from),
            _ => None,
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type
    #[serde(rename = "type")]
    pub param_type: ParamType,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterSchema {
    pub fn required(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
        default: Option<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: false,
            default,
        }
    }
}

/// Tool descriptor: name, argument schema and description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions, in declaration order
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, param: ParameterSchema) -> Self {
        self.parameters.push(param);
        self
    }

    /// Render as a JSON Schema object
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut prop = Map::new();
            if let Some(ty) = param.param_type.as_str() {
                prop.insert("type".into(), json!(ty));
            }
            if !param.description.is_empty() {
                prop.insert("description".into(), json!(param.description));
            }
            if let Some(default) = &param.default {
                prop.insert("default".into(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(prop));
            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Rebuild a descriptor from a JSON Schema object
    ///
    /// Properties without a recognised `type` become [`ParamType::Any`].
    pub fn from_input_schema(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: &Value,
    ) -> Self {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let parameters = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(prop_name, prop)| ParameterSchema {
                        name: prop_name.clone(),
                        param_type: prop
                            .get("type")
                            .and_then(Value::as_str)
                            .map_or(ParamType::Any, ParamType::from_schema_type),
                        description: prop
                            .get("description")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        required: required.contains(&prop_name.as_str()),
                        default: prop.get("default").cloned(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Check arguments against the schema and fill in declared defaults
    pub fn prepare(&self, arguments: &mut Arguments) -> Result<()> {
        for param in &self.parameters {
            match arguments.get(&param.name) {
                None | Some(Value::Null) => {
                    if let Some(default) = &param.default {
                        arguments.insert(param.name.clone(), default.clone());
                    } else if param.required {
                        return Err(AgentError::ToolValidation(format!(
                            "Missing required parameter: {}",
                            param.name
                        )));
                    } else {
                        arguments.remove(&param.name);
                    }
                }
                Some(value) if param.param_type.matches(value) => {}
                Some(value) => {
                    let coerced = param.param_type.coerce(value).ok_or_else(|| {
                        AgentError::ToolValidation(format!(
                            "Parameter '{}' expects {}, got {}",
                            param.name,
                            param.param_type.as_str().unwrap_or("any"),
                            value
                        ))
                    })?;
                    arguments.insert(param.name.clone(), coerced);
                }
            }
        }

        Ok(())
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for LLM function calling
    fn schema(&self) -> ToolSchema;

    /// Check arguments and fill declared defaults before execution
    fn validate(&self, arguments: &mut Arguments) -> Result<()> {
        self.schema().prepare(arguments)
    }

    /// Execute the tool with given arguments
    ///
    /// Arguments have already been through [`ToolSchema::prepare`] when the
    /// call comes from a [`ToolRegistry`].
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;
}

/// Registry for available tools
///
/// Names are unique; the first registration of a name wins.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool. Returns `false` if the name is already taken.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> bool {
        self.register_boxed(Arc::new(tool))
    }

    /// Register a shared tool. Returns `false` if the name is already taken.
    pub fn register_boxed(&mut self, tool: Arc<dyn Tool>) -> bool {
        let name = tool.schema().name;
        if self.tools.contains_key(&name) {
            tracing::warn!(tool = %name, "Duplicate tool name, keeping the first registration");
            return false;
        }
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        true
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Validate, apply defaults, then execute a tool call
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        let mut prepared = call.clone();
        tool.validate(&mut prepared.arguments)?;

        let result = tool.execute(&prepared).await?;
        Ok(result.with_id(call.id.clone()))
    }

    /// All tool schemas, in registration order
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.schema())
            .collect()
    }

    /// Tool names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
