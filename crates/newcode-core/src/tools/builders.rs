//! Fluent builder for tool declarations.
//!
//! # Example
//!
//! ```rust
//! use newcode_core::tools::{ToolBuilder, ToolOutput, handler};
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct WeatherArgs {
//!     city: String,
//! }
//!
//! let tool = ToolBuilder::new("weather")
//!     .description("Current weather for a city")
//!     .input_schema_from::<WeatherArgs>()
//!     .handler(handler(|_args| async { ToolOutput::ok(serde_json::json!("sunny")) }))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(tool.name, "weather");
//! ```

use serde_json::{Value, json};

use super::types::{ToolDeclaration, ToolHandler, ToolHostError};

/// Builder for creating [`ToolDeclaration`] instances
#[derive(Clone, Default)]
pub struct ToolBuilder {
    name: String,
    description: Option<String>,
    docstring: Option<String>,
    input_schema: Option<Value>,
    handler: Option<ToolHandler>,
}

impl ToolBuilder {
    /// Create a new tool builder with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the tool description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Longer documentation, appended to the description
    pub fn docstring(mut self, doc: impl Into<String>) -> Self {
        let doc = doc.into();
        if !doc.trim().is_empty() {
            self.docstring = Some(doc);
        }
        self
    }

    /// Set the input schema (JSON Schema)
    pub fn input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Derive the input schema from the argument type
    pub fn input_schema_from<T: schemars::JsonSchema>(mut self) -> Self {
        let schema = schemars::schema_for!(T);
        self.input_schema = Some(serde_json::to_value(schema).unwrap_or_else(|_| empty_schema()));
        self
    }

    /// Set the implementation
    pub fn handler(mut self, handler: ToolHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Build the declaration
    pub fn build(self) -> Result<ToolDeclaration, ToolHostError> {
        let description = match (self.description, self.docstring) {
            (Some(desc), Some(doc)) if doc != desc => format!("{desc}\n\n{doc}"),
            (Some(desc), _) => desc,
            (None, Some(doc)) => doc,
            (None, None) => {
                return Err(ToolHostError::Rejected(format!(
                    "tool '{}' has no description",
                    self.name
                )));
            }
        };
        let handler = self.handler.ok_or_else(|| {
            ToolHostError::Rejected(format!("tool '{}' has no implementation", self.name))
        })?;

        Ok(ToolDeclaration {
            name: self.name,
            description,
            input_schema: self.input_schema.unwrap_or_else(empty_schema),
            handler,
        })
    }
}

fn empty_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::{ToolOutput, handler};
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct SearchArgs {
        /// Text to look for
        query: String,
        limit: Option<u32>,
    }

    fn noop() -> ToolHandler {
        handler(|_| async { ToolOutput::ok(Value::Null) })
    }

    #[test]
    fn test_schema_from_type() {
        let tool = ToolBuilder::new("search")
            .description("Search")
            .input_schema_from::<SearchArgs>()
            .handler(noop())
            .build()
            .unwrap();

        assert_eq!(tool.input_schema["type"], "object");
        assert!(tool.input_schema["properties"]["query"].is_object());
        let required = tool.input_schema["required"].as_array().unwrap();
        assert!(required.iter().any(|r| r == "query"));
    }

    #[test]
    fn test_default_schema_and_docstring() {
        let tool = ToolBuilder::new("ping")
            .description("Ping")
            .docstring("Returns pong.")
            .handler(noop())
            .build()
            .unwrap();

        assert_eq!(tool.description, "Ping\n\nReturns pong.");
        assert_eq!(tool.input_schema, json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        assert!(ToolBuilder::new("x").handler(noop()).build().is_err());
        assert!(ToolBuilder::new("x").description("d").build().is_err());
        let doc_only = ToolBuilder::new("x").docstring("doc").handler(noop()).build().unwrap();
        assert_eq!(doc_only.description, "doc");
    }
}
