//! Tool trait: the abstraction over cluster-inspection capabilities.
//!
//! Every tool declares its argument schema and its access class. The registry
//! validates arguments against the schema before a tool runs, and refuses to
//! register anything that is not read-only.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;
use crate::error::{RegistryError, ToolError};
use crate::provider::ToolDefinition;

/// A request to execute a tool, with arguments already parsed from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Id the model gave the call; echoed back on the result
    pub id: String,

    pub name: String,

    pub arguments: Value,
}

/// The result of one invocation. Produced for every invocation, success or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,

    pub success: bool,

    /// The output text, or the error text on failure
    pub output: String,
}

impl ToolResult {
    pub fn ok(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failed(call_id: impl Into<String>, error: &ToolError) -> Self {
        Self {
            call_id: call_id.into(),
            success: false,
            output: error.to_string(),
        }
    }
}

/// Whether a tool can change cluster state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    ReadOnly,
    Mutating,
}

/// The JSON type of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
        }
    }

    /// Coerce a raw JSON value into this kind, if it can be read as one.
    fn coerce(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ParamKind::String, Value::String(_)) => Some(value.clone()),
            (ParamKind::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (ParamKind::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (ParamKind::Integer, Value::Number(n)) if n.is_i64() => Some(value.clone()),
            (ParamKind::Integer, Value::String(s)) => {
                s.trim().parse::<i64>().ok().map(Value::from)
            }
            (ParamKind::Boolean, Value::Bool(_)) => Some(value.clone()),
            (ParamKind::Boolean, Value::String(s)) => match s.trim() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        }
    }
}

/// One declared tool argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
    /// Filled in when an optional argument is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, kind: ParamKind, description: &str, default: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
            default: Some(default),
        }
    }
}

/// Build a JSON Schema object from a list of argument specs.
pub fn json_schema(params: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for p in params {
        let mut prop = Map::new();
        prop.insert("type".into(), Value::from(p.kind.json_type()));
        prop.insert("description".into(), Value::from(p.description.clone()));
        if let Some(default) = &p.default {
            prop.insert("default".into(), default.clone());
        }
        properties.insert(p.name.clone(), Value::Object(prop));
        if p.required {
            required.push(Value::from(p.name.clone()));
        }
    }

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Arguments that passed schema validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    /// Validate and coerce raw arguments against `params`.
    ///
    /// Missing optional arguments get their defaults; unknown arguments are dropped.
    pub fn validate(params: &[ParamSpec], raw: &Value) -> std::result::Result<Self, ToolError> {
        let empty = Map::new();
        let object = match raw {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "arguments must be a JSON object, got {}",
                    json_kind(other)
                )));
            }
        };

        let mut out = Map::new();
        for p in params {
            match object.get(&p.name) {
                None | Some(Value::Null) => {
                    if p.required {
                        return Err(ToolError::InvalidArguments(format!(
                            "missing required argument '{}'",
                            p.name
                        )));
                    }
                    if let Some(default) = &p.default {
                        out.insert(p.name.clone(), default.clone());
                    }
                }
                Some(value) => {
                    let coerced = p.kind.coerce(value).ok_or_else(|| {
                        ToolError::InvalidArguments(format!(
                            "argument '{}' must be {}, got {}",
                            p.name,
                            p.kind.json_type(),
                            json_kind(value)
                        ))
                    })?;
                    out.insert(p.name.clone(), coerced);
                }
            }
        }

        for key in object.keys() {
            if !params.iter().any(|p| &p.name == key) {
                debug!(argument = %key, "Ignoring undeclared tool argument");
            }
        }

        Ok(Self(out))
    }

    /// A string argument. Present whenever the schema made it required or gave a default.
    pub fn str(&self, name: &str) -> std::result::Result<&str, ToolError> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments(format!("missing required argument '{name}'")))
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn opt_i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    pub fn opt_bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A read-only cluster query the model may invoke.
///
/// Each cluster-inspection capability implements this trait and is registered
/// once at startup.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "list_pods").
    fn name(&self) -> &str;

    /// Shown to the model in the tool catalog.
    fn description(&self) -> &str;

    /// Declared arguments.
    fn params(&self) -> Vec<ParamSpec>;

    /// Whether this tool reads or changes cluster state.
    fn access(&self) -> Access;

    /// Execute the tool with validated arguments. Returns the output text.
    async fn execute(&self, args: ToolArgs) -> std::result::Result<String, ToolError>;

    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: json_schema(&self.params()),
        }
    }
}

/// Tools by name, in registration order.
///
/// Built once at startup, then shared read-only (`Arc<ToolRegistry>`) by every turn.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Duplicate names and mutating tools are rejected.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> std::result::Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        if tool.access() != Access::ReadOnly {
            return Err(RegistryError::Mutating(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// All tool definitions, in registration order (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Look up, validate and execute a tool call.
    pub async fn invoke(&self, call: &ToolCall) -> std::result::Result<String, ToolError> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        let args = ToolArgs::validate(&tool.params(), &call.arguments)?;
        tool.execute(args).await
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
