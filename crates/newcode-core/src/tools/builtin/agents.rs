//! `list_agents`

use serde_json::json;
use std::sync::Arc;

use crate::agents::AgentSummary;
use crate::tools::{RegisterFn, ToolBuilder, ToolOutput, handler, register_fn};

/// Declare `list_agents` over a fixed set of agent summaries.
pub fn list_agents(agents: Vec<AgentSummary>) -> RegisterFn {
    let agents = Arc::new(agents);
    register_fn(move |host| {
        let agents = agents.clone();
        host.declare_tool(
            ToolBuilder::new("list_agents")
                .description("List the agents available for delegation")
                .handler(handler(move |_args| {
                    let agents = agents.clone();
                    async move { ToolOutput::ok(json!({ "agents": agents.as_slice() })) }
                }))
                .build()?,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{AgentTools, ToolHost};

    #[tokio::test]
    async fn test_lists_summaries() {
        let register = list_agents(vec![AgentSummary {
            name: "husky".into(),
            display_name: "Executor".into(),
            description: "Implements changes".into(),
        }]);
        let mut host = AgentTools::new("pack-leader");
        let host_ref: &mut dyn ToolHost = &mut host;
        register(host_ref).unwrap();

        let output = host.call("list_agents", json!({})).await.unwrap();
        assert_eq!(output.data["agents"][0]["name"], "husky");
    }
}
