//! Tool trait: the abstraction over agent capabilities.
//!
//! A tool takes a single free-form parameter string and returns a result
//! string. The model requests tools through a textual protocol, so there is
//! no argument schema: whatever follows the tool name is the parameter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ToolError;

/// Name and description of a registered tool, as shown to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}

/// The record of one dispatched tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Name of the invoked tool
    pub tool: String,

    /// The raw parameter string
    pub parameter: String,

    /// The tool output, or the error text when `failed` is set
    pub result: String,

    #[serde(default)]
    pub failed: bool,
}

impl ToolCallRecord {
    pub fn success(tool: impl Into<String>, parameter: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            parameter: parameter.into(),
            result: result.into(),
            failed: false,
        }
    }

    pub fn failure(tool: impl Into<String>, parameter: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            parameter: parameter.into(),
            result: error.into(),
            failed: true,
        }
    }
}

/// The core Tool trait.
///
/// Each capability (text search, lookups, ...) implements this trait and is
/// registered in the [`ToolRegistry`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "search_web").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// Run the tool with the raw parameter text.
    async fn invoke(&self, parameter: &str) -> std::result::Result<String, ToolError>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}

/// A tool backed by a plain synchronous function.
pub struct FnTool<F> {
    name: String,
    description: String,
    func: F,
}

impl<F> FnTool<F>
where
    F: Fn(&str) -> std::result::Result<String, String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, description: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(&str) -> std::result::Result<String, String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, parameter: &str) -> std::result::Result<String, ToolError> {
        (self.func)(parameter).map_err(|reason| ToolError::ExecutionFailed {
            tool_name: self.name.clone(),
            reason,
        })
    }
}

/// A registry of available tools, kept in registration order.
///
/// The step executor uses this to:
/// 1. Describe the tools in the instruction block
/// 2. Look up and invoke tools the model requests
///
/// Built once at startup and shared read-only across runs.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name, in place.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => self.tools[index] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Register a plain function as a tool.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, description: impl Into<String>, func: F)
    where
        F: Fn(&str) -> std::result::Result<String, String> + Send + Sync + 'static,
    {
        self.register(Box::new(FnTool::new(name, description, func)));
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Name and description of every tool, in registration order.
    pub fn describe_all(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    /// Invoke a tool by name.
    ///
    /// Any failure raised by the tool itself comes back as
    /// [`ToolError::ExecutionFailed`] carrying the cause.
    pub async fn invoke(&self, name: &str, parameter: &str) -> std::result::Result<String, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.invoke(parameter).await.map_err(|e| match e {
            ToolError::ExecutionFailed { .. } => e,
            other => ToolError::ExecutionFailed {
                tool_name: name.to_string(),
                reason: other.to_string(),
            },
        })
    }

    /// List all registered tool names.
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
