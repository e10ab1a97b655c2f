//! Tool Type Definitions

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a [`ToolHost`] when it refuses a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolHostError {
    #[error("Tool already declared: {0}")]
    Duplicate(String),

    #[error("Invalid tool name: {0:?}")]
    InvalidName(String),

    #[error("Invalid input schema for '{tool}': {message}")]
    InvalidSchema { tool: String, message: String },

    #[error("Tool declaration rejected: {0}")]
    Rejected(String),
}

/// Tool output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Output data
    pub data: Value,
    /// Whether execution was successful
    pub success: bool,
    /// Error message if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl ToolOutput {
    /// Successful output
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            success: true,
            error: None,
            duration_ms: 0,
        }
    }

    /// Failed output
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: Value::Null,
            success: false,
            error: Some(message.into()),
            duration_ms: 0,
        }
    }
}

/// Async tool implementation.
pub type ToolHandler =
    Arc<dyn Fn(Value) -> Pin<Box<dyn Future<Output = ToolOutput> + Send>> + Send + Sync>;

/// Wrap an async closure as a [`ToolHandler`].
pub fn handler<F, Fut>(f: F) -> ToolHandler
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolOutput> + Send + 'static,
{
    Arc::new(move |args| -> Pin<Box<dyn Future<Output = ToolOutput> + Send>> { Box::pin(f(args)) })
}

/// Deserialize tool arguments, producing a failed output on mismatch.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolOutput> {
    serde_json::from_value(args).map_err(|e| ToolOutput::failure(format!("invalid arguments: {e}")))
}

/// A callable tool as declared on an agent.
#[derive(Clone)]
pub struct ToolDeclaration {
    /// Tool name as seen by the model
    pub name: String,
    /// Description shown to the model
    pub description: String,
    /// JSON Schema for the arguments
    pub input_schema: Value,
    /// Implementation
    pub handler: ToolHandler,
}

impl fmt::Debug for ToolDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDeclaration")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish_non_exhaustive()
    }
}

/// The agent-side seam: something that can accept tool declarations.
pub trait ToolHost {
    /// Name of the agent being assembled.
    fn agent_name(&self) -> &str;

    /// Declare a callable tool.
    fn declare_tool(&mut self, tool: ToolDeclaration) -> Result<(), ToolHostError>;
}

/// Registration function: attaches one capability to a host.
pub type RegisterFn = Arc<dyn Fn(&mut dyn ToolHost) -> Result<(), ToolHostError> + Send + Sync>;

/// Wrap a closure as a [`RegisterFn`].
pub fn register_fn<F>(f: F) -> RegisterFn
where
    F: Fn(&mut dyn ToolHost) -> Result<(), ToolHostError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A named registration stored in the tool registry.
#[derive(Clone)]
pub struct ToolRegistration {
    pub name: String,
    pub register: RegisterFn,
}

impl fmt::Debug for ToolRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistration")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Plugin-supplied registration descriptor.
///
/// `register_func` is optional because descriptors come from untrusted
/// plugin code and manifests; a descriptor without one is rejected during
/// discovery.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub register_func: Option<RegisterFn>,
}

impl ToolDescriptor {
    /// Descriptor with a registration function.
    pub fn new(name: impl Into<String>, register_func: RegisterFn) -> Self {
        Self {
            name: name.into(),
            register_func: Some(register_func),
        }
    }

    /// Descriptor that is missing its registration function.
    pub fn without_function(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            register_func: None,
        }
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("register_func", &self.register_func.is_some())
            .finish()
    }
}
