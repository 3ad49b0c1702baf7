use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{Map, Value, json};

use crate::knowledge::CareerInfo;
use crate::llm::provider::FunctionDeclaration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    StringList,
}

impl ParamType {
    fn describe(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::StringList => "a list of strings",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }

    fn json_schema(self, description: &str) -> Value {
        match self {
            Self::String => json!({"type": "string", "description": description}),
            Self::StringList => json!({
                "type": "array",
                "items": {"type": "string"},
                "description": description,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn required(self, name: &str, kind: ParamType, description: &str) -> Self {
        self.param(name, kind, description, true)
    }

    pub fn optional(self, name: &str, kind: ParamType, description: &str) -> Self {
        self.param(name, kind, description, false)
    }

    fn param(mut self, name: &str, kind: ParamType, description: &str, required: bool) -> Self {
        self.parameters.push(ToolParameter {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required,
        });
        self
    }

    pub fn json_schema(&self) -> Value {
        let properties = self
            .parameters
            .iter()
            .map(|param| (param.name.clone(), param.kind.json_schema(&param.description)))
            .collect::<Map<_, _>>();
        let required = self
            .parameters
            .iter()
            .filter(|param| param.required)
            .map(|param| Value::String(param.name.clone()))
            .collect::<Vec<_>>();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn declaration(&self) -> FunctionDeclaration {
        FunctionDeclaration {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters_json_schema: self.json_schema(),
        }
    }
}

/// A function call chosen by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Arguments that already passed schema validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

impl ToolArgs {
    pub fn string(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn string_list(&self, name: &str) -> Option<Vec<String>> {
        self.values.get(name).and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolPayload {
    CareerInfo(CareerInfo),
}

/// What a handler hands back on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReply {
    pub text: String,
    pub payload: Option<ToolPayload>,
}

impl ToolReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: ToolPayload) -> Self {
        self.payload = Some(payload);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError(pub String);

impl ToolError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for ToolError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub text: String,
    pub payload: Option<ToolPayload>,
    pub succeeded: bool,
}

impl ToolOutcome {
    fn failure(text: String) -> Self {
        Self {
            text,
            payload: None,
            succeeded: false,
        }
    }
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: ToolArgs) -> Result<ToolReply, ToolError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateName(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "tool '{name}' is already registered"),
        }
    }
}

impl Error for RegistryError {}

#[derive(Default)]
pub struct ToolRegistry {
    schemas: Vec<ToolSchema>,
    handlers: Vec<Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        schema: ToolSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), RegistryError> {
        if self.position(&schema.name).is_some() {
            return Err(RegistryError::DuplicateName(schema.name));
        }
        self.schemas.push(schema);
        self.handlers.push(handler);
        Ok(())
    }

    /// Schemas in registration order.
    pub fn describe_all(&self) -> &[ToolSchema] {
        &self.schemas
    }

    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.schemas.iter().map(ToolSchema::declaration).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Runs the call and always comes back with user-facing text.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolOutcome {
        let Some(index) = self.position(&call.name) else {
            return ToolOutcome::failure(format!("Function {} not recognized.", call.name));
        };
        let schema = &self.schemas[index];

        let args = match validate_arguments(schema, &call.arguments) {
            Ok(args) => args,
            Err(message) => return ToolOutcome::failure(message),
        };

        let handler = Arc::clone(&self.handlers[index]);
        match AssertUnwindSafe(handler.call(args)).catch_unwind().await {
            Ok(Ok(reply)) => ToolOutcome {
                text: reply.text,
                payload: reply.payload,
                succeeded: true,
            },
            Ok(Err(err)) => {
                ToolOutcome::failure(format!("The {} tool failed: {err}", schema.name))
            }
            Err(panic) => ToolOutcome::failure(format!(
                "The {} tool failed unexpectedly: {}",
                schema.name,
                panic_message(panic.as_ref())
            )),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.schemas.iter().position(|schema| schema.name == name)
    }
}

fn validate_arguments(schema: &ToolSchema, arguments: &Value) -> Result<ToolArgs, String> {
    let values = match arguments {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        _ => {
            return Err(format!(
                "The {} tool expects its arguments as a JSON object.",
                schema.name
            ));
        }
    };

    for param in &schema.parameters {
        match values.get(&param.name) {
            None | Some(Value::Null) if param.required => {
                return Err(format!(
                    "The {} tool is missing the required parameter \"{}\".",
                    schema.name, param.name
                ));
            }
            Some(value) if !value.is_null() && !param.kind.matches(value) => {
                return Err(format!(
                    "The {} tool parameter \"{}\" must be {}.",
                    schema.name,
                    param.name,
                    param.kind.describe()
                ));
            }
            _ => {}
        }
    }

    Ok(ToolArgs { values })
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(text) = panic.downcast_ref::<&str>() {
        *text
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.as_str()
    } else {
        "unknown panic"
    }
}
