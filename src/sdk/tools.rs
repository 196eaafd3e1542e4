use crate::error::{Error, Result};
use crate::protocol::models::{JsonSchema, Tool};
use futures::FutureExt;
use schemars::JsonSchema as DeriveSchema;
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

pub type BoxFuture<T> = futures::future::BoxFuture<'static, T>;

/// Type-erased tool implementation. Handlers always resolve to a `ToolResult`.
pub type ToolHandler = Arc<dyn Fn(Value) -> BoxFuture<ToolResult> + Send + Sync>;

/// Name, description and parameter schema of a tool, as advertised to the model.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: JsonSchema,
}

impl ToolDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: JsonSchema) -> Self {
        Self { name: name.into(), description: description.into(), parameters }
    }

    /// Derive the parameter schema from an argument type.
    ///
    /// # Errors
    /// Returns an error if the generated schema cannot be converted to JSON.
    #[allow(clippy::result_large_err)]
    pub fn for_args<T: DeriveSchema>(name: impl Into<String>, description: impl Into<String>) -> Result<Self> {
        let schema = schemars::schema_for!(T);
        let mut parameters = serde_json::to_value(&schema)
            .map_err(|e| Error::InvalidToolSchema(e.to_string()))?;
        if let Some(object) = parameters.as_object_mut() {
            object.remove("$schema");
            object.remove("title");
            object.entry("properties").or_insert_with(|| Value::Object(Map::new()));
        }
        Ok(Self::new(name, description, parameters))
    }

    #[must_use]
    pub fn as_tool(&self) -> Tool {
        Tool::Function {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            parameters: self.parameters.clone(),
        }
    }
}

/// One invocation requested by the model.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub call_id: String,
    pub arguments: Value,
}

/// Outcome of a tool, serialized as `{"success": true, ...payload}` or
/// `{"success": false, "error": "..."}`.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolResult {
    Success(Map<String, Value>),
    Failure { error: String },
}

impl ToolResult {
    #[must_use]
    pub fn success() -> Self {
        Self::Success(Map::new())
    }

    /// Success carrying a single named payload, e.g. `statisticsData`.
    #[must_use]
    pub fn with_data(key: impl Into<String>, data: Value) -> Self {
        Self::success().and(key, data)
    }

    /// Add a payload entry. No-op on a failure.
    #[must_use]
    pub fn and(mut self, key: impl Into<String>, data: Value) -> Self {
        if let Self::Success(payload) = &mut self {
            payload.insert(key.into(), data);
        }
        self
    }

    /// Objects become the payload; any other value is stored under `result`.
    ///
    /// An object with `"success": false` is a failure carrying its `error` field.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut payload) => match payload.remove("success") {
                Some(Value::Bool(false)) => Self::Failure { error: failure_text(payload.remove("error")) },
                _ => Self::Success(payload),
            },
            Value::Null => Self::success(),
            other => Self::with_data("result", other),
        }
    }

    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure { error: error.into() }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Success(payload) => payload.get(key),
            Self::Failure { .. } => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { error } => Some(error),
        }
    }

    /// JSON text placed in `function_call_output.output`.
    ///
    /// # Errors
    /// Returns an error if a payload value fails to serialize.
    #[allow(clippy::result_large_err)]
    pub fn to_output(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for ToolResult {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Success(payload) => {
                let mut map = serializer.serialize_map(Some(payload.len() + 1))?;
                map.serialize_entry("success", &true)?;
                for (key, value) in payload {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Self::Failure { error } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ToolResult {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut payload = Map::<String, Value>::deserialize(deserializer)?;
        let success = payload
            .remove("success")
            .and_then(|v| v.as_bool())
            .ok_or_else(|| serde::de::Error::missing_field("success"))?;
        if success {
            return Ok(Self::Success(payload));
        }
        Ok(Self::Failure { error: failure_text(payload.remove("error")) })
    }
}

fn failure_text(error: Option<Value>) -> String {
    match error {
        Some(Value::String(text)) => text,
        None | Some(Value::Null) => "tool reported failure".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Conversion from a handler's return value into a `ToolResult`.
pub trait IntoToolResult {
    fn into_tool_result(self) -> ToolResult;
}

impl IntoToolResult for ToolResult {
    fn into_tool_result(self) -> ToolResult {
        self
    }
}

impl<T, E> IntoToolResult for std::result::Result<T, E>
where
    T: Serialize,
    E: Display,
{
    fn into_tool_result(self) -> ToolResult {
        match self {
            Ok(value) => match serde_json::to_value(value) {
                Ok(value) => ToolResult::from_value(value),
                Err(err) => ToolResult::failure(err.to_string()),
            },
            Err(err) => ToolResult::failure(err.to_string()),
        }
    }
}

/// Static binding of tool name to schema and handler.
///
/// Descriptors keep registration order; that order is the order of the manifest.
#[derive(Default)]
pub struct ToolRegistry {
    defs: Vec<ToolDescriptor>,
    handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a raw handler taking the decoded argument object.
    ///
    /// # Errors
    /// Returns `Error::DuplicateTool` if the name is already bound.
    #[allow(clippy::result_large_err)]
    pub fn register<F, Fut>(&mut self, descriptor: ToolDescriptor, handler: F) -> Result<()>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        let handler: ToolHandler = Arc::new(move |args| handler(args).boxed());
        self.insert(descriptor, handler)
    }

    /// Bind a typed handler; the parameter schema is derived from `TArgs`.
    ///
    /// Arguments that don't match `TArgs` produce a failure result instead of
    /// reaching the handler.
    ///
    /// # Errors
    /// Returns an error if the name is already bound or the schema cannot be built.
    #[allow(clippy::result_large_err)]
    pub fn tool<TArgs, R, F, Fut>(&mut self, name: &str, description: &str, handler: F) -> Result<()>
    where
        TArgs: DeserializeOwned + DeriveSchema + Send + 'static,
        R: IntoToolResult + Send + 'static,
        F: Fn(TArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let descriptor = ToolDescriptor::for_args::<TArgs>(name, description)?;
        let user_handler = Arc::new(handler);
        let tool_name = name.to_string();
        let handler: ToolHandler = Arc::new(move |value: Value| -> BoxFuture<ToolResult> {
            let user_handler = Arc::clone(&user_handler);
            let tool_name = tool_name.clone();
            Box::pin(async move {
                let args: TArgs = match serde_json::from_value(value) {
                    Ok(args) => args,
                    Err(err) => {
                        tracing::debug!(tool = %tool_name, "Arguments rejected: {err}");
                        return ToolResult::failure(format!("invalid arguments: {err}"));
                    }
                };
                user_handler(args).await.into_tool_result()
            })
        });
        self.insert(descriptor, handler)
    }

    #[allow(clippy::result_large_err)]
    fn insert(&mut self, descriptor: ToolDescriptor, handler: ToolHandler) -> Result<()> {
        if self.handlers.contains_key(&descriptor.name) {
            return Err(Error::DuplicateTool(descriptor.name));
        }
        self.handlers.insert(descriptor.name.clone(), handler);
        self.defs.push(descriptor);
        Ok(())
    }

    /// Move every binding of `other` into this registry, after the existing ones.
    ///
    /// # Errors
    /// Returns `Error::DuplicateTool` on the first name bound in both.
    #[allow(clippy::result_large_err)]
    pub fn extend(&mut self, mut other: Self) -> Result<()> {
        for descriptor in std::mem::take(&mut other.defs) {
            if let Some(handler) = other.handlers.remove(&descriptor.name) {
                self.insert(descriptor, handler)?;
            }
        }
        Ok(())
    }

    /// All descriptors in registration order.
    #[must_use]
    pub fn describe_all(&self) -> &[ToolDescriptor] {
        &self.defs
    }

    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ToolHandler> {
        self.handlers.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Protocol-level tool definitions for `session.update`.
    #[must_use]
    pub fn as_tools(&self) -> Vec<Tool> {
        self.defs.iter().map(ToolDescriptor::as_tool).collect()
    }

    /// Invoke the handler bound to `call.name`, or `None` if nothing is bound.
    pub async fn invoke(&self, call: ToolCall) -> Option<ToolResult> {
        let handler = self.resolve(&call.name)?;
        Some(handler(call.arguments).await)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.defs.iter().map(|d| d.name.as_str()).collect::<Vec<_>>())
            .finish()
    }
}
