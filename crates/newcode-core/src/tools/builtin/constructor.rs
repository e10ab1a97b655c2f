//! `universal_constructor`: inspect and call constructor tools.
//!
//! The flat entry point next to the `uc:` namespace. Agents use it to
//! discover constructor tools before requesting them by `uc:<name>`.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::tools::{
    ConstructorRegistry, NamespacedToolSource, RegisterFn, ToolBuilder, ToolOutput, handler,
    parse_args, register_fn,
};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConstructorAction {
    /// List every constructor tool
    List,
    /// Show one tool's metadata
    Info,
    /// Call a tool with `args`
    Call,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConstructorArgs {
    pub action: ConstructorAction,
    /// Tool name, required for `info` and `call`
    #[serde(default)]
    pub tool_name: Option<String>,
    /// Arguments forwarded on `call`
    #[serde(default)]
    pub args: Option<Value>,
}

pub fn universal_constructor(registry: Arc<ConstructorRegistry>) -> RegisterFn {
    register_fn(move |host| {
        let registry = registry.clone();
        host.declare_tool(
            ToolBuilder::new("universal_constructor")
                .description("List, inspect and call tools from the universal constructor")
                .input_schema_from::<ConstructorArgs>()
                .handler(handler(move |args| {
                    let registry = registry.clone();
                    async move {
                        match parse_args::<ConstructorArgs>(args) {
                            Ok(args) => dispatch(&registry, args).await,
                            Err(output) => output,
                        }
                    }
                }))
                .build()?,
        )
    })
}

async fn dispatch(registry: &ConstructorRegistry, args: ConstructorArgs) -> ToolOutput {
    if let ConstructorAction::List = args.action {
        let tools: Vec<Value> = registry
            .list()
            .into_iter()
            .map(|tool| {
                json!({
                    "name": tool.identifier,
                    "description": tool.description,
                    "callable": registry.has_function(&tool.identifier),
                })
            })
            .collect();
        return ToolOutput::ok(json!({ "tools": tools }));
    }

    let Some(name) = args.tool_name else {
        return ToolOutput::failure("tool_name is required");
    };
    let Some(tool) = registry.get_tool(&name) else {
        return ToolOutput::failure(format!("no constructor tool named '{name}'"));
    };

    match args.action {
        ConstructorAction::Info => ToolOutput::ok(json!({
            "tool": tool,
            "callable": registry.has_function(&name),
            "source": registry.source_of(&name).map(|p| p.display().to_string()),
        })),
        _ => match registry.get_tool_function(&name) {
            Some(function) => function(args.args.unwrap_or_else(|| json!({}))).await,
            None => ToolOutput::failure(format!("constructor tool '{name}' has no implementation")),
        },
    }
}
