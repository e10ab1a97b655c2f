//! In-memory tool host.
//!
//! [`AgentTools`] is the host the CLI assembles agents into. It enforces the
//! declaration contract (unique names, object schemas) and can dispatch
//! calls to the declared handlers.

use serde_json::Value;
use std::time::Instant;

use super::types::{ToolDeclaration, ToolHost, ToolHostError, ToolOutput};
use crate::{CoreError, CoreResult};

/// Tools declared for one agent, in declaration order.
#[derive(Debug, Default)]
pub struct AgentTools {
    agent: String,
    tools: Vec<ToolDeclaration>,
}

impl AgentTools {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            tools: Vec::new(),
        }
    }

    /// Declared tool names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDeclaration> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDeclaration> {
        self.tools.iter()
    }

    /// Call a declared tool by name.
    pub async fn call(&self, name: &str, args: Value) -> CoreResult<ToolOutput> {
        let tool = self
            .get(name)
            .ok_or_else(|| CoreError::not_found("Tool", name))?;

        // Clone the handler so the borrow of `self` ends before awaiting.
        let handler = tool.handler.clone();
        let start = Instant::now();
        let mut output = handler(args).await;
        if output.duration_ms == 0 {
            output.duration_ms = start.elapsed().as_millis() as u64;
        }

        Ok(output)
    }
}

impl ToolHost for AgentTools {
    fn agent_name(&self) -> &str {
        &self.agent
    }

    fn declare_tool(&mut self, tool: ToolDeclaration) -> Result<(), ToolHostError> {
        if tool.name.trim().is_empty() || tool.name.contains(char::is_whitespace) {
            return Err(ToolHostError::InvalidName(tool.name));
        }
        if !tool.input_schema.is_object() {
            return Err(ToolHostError::InvalidSchema {
                tool: tool.name,
                message: "input schema must be a JSON object".into(),
            });
        }
        if self.contains(&tool.name) {
            return Err(ToolHostError::Duplicate(tool.name));
        }

        tracing::debug!(agent = %self.agent, tool = %tool.name, "tool declared");
        self.tools.push(tool);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::handler;
    use serde_json::json;

    fn echo(name: &str) -> ToolDeclaration {
        ToolDeclaration {
            name: name.into(),
            description: "Echo the arguments".into(),
            input_schema: json!({"type": "object"}),
            handler: handler(|args| async move { ToolOutput::ok(args) }),
        }
    }

    #[test]
    fn test_declare_rejects_duplicates_and_bad_schemas() {
        let mut host = AgentTools::new("code-agent");
        host.declare_tool(echo("echo")).unwrap();

        assert_eq!(
            host.declare_tool(echo("echo")),
            Err(ToolHostError::Duplicate("echo".into()))
        );

        let mut bad = echo("bad");
        bad.input_schema = json!("string");
        assert!(matches!(
            host.declare_tool(bad),
            Err(ToolHostError::InvalidSchema { .. })
        ));

        assert!(matches!(
            host.declare_tool(echo("two words")),
            Err(ToolHostError::InvalidName(_))
        ));

        assert_eq!(host.names(), vec!["echo"]);
    }

    #[tokio::test]
    async fn test_call_dispatches_to_handler() {
        let mut host = AgentTools::new("code-agent");
        host.declare_tool(echo("echo")).unwrap();

        let output = host.call("echo", json!({"x": 1})).await.unwrap();
        assert!(output.success);
        assert_eq!(output.data, json!({"x": 1}));

        let missing = host.call("nope", json!({})).await;
        assert!(missing.unwrap_err().is_not_found());
    }
}
