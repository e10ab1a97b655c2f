//! Agent catalogue.

use std::sync::Arc;

use super::descriptor::{AgentDescriptor, AgentSummary, StaticAgent};
use super::prompts;
use crate::error::{CoreError, CoreResult};
use crate::tools::{BindReport, ToolHost, ToolRegistry};

/// Ordered agent lookup by name.
#[derive(Clone, Default)]
pub struct AgentCatalog {
    agents: Vec<Arc<dyn AgentDescriptor>>,
}

impl AgentCatalog {
    /// Empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue holding the built-in personas.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for agent in builtin_agents() {
            catalog.register(Arc::new(agent));
        }
        catalog
    }

    /// Add an agent. An agent with the same name is replaced in place.
    pub fn register(&mut self, agent: Arc<dyn AgentDescriptor>) {
        match self.agents.iter_mut().find(|a| a.name() == agent.name()) {
            Some(existing) => {
                tracing::warn!(agent = agent.name(), "agent definition replaced");
                *existing = agent;
            }
            None => self.agents.push(agent),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AgentDescriptor>> {
        self.agents.iter().find(|a| a.name() == name).cloned()
    }

    /// Look an agent up, failing with `NotFound`.
    pub fn require(&self, name: &str) -> CoreResult<Arc<dyn AgentDescriptor>> {
        self.get(name).ok_or_else(|| CoreError::not_found("Agent", name))
    }

    pub fn list(&self) -> &[Arc<dyn AgentDescriptor>] {
        &self.agents
    }

    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    pub fn summaries(&self) -> Vec<AgentSummary> {
        self.agents.iter().map(|a| a.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Bind an agent's declared tools onto `host`.
    pub fn build(&self, name: &str, tools: &ToolRegistry, host: &mut dyn ToolHost) -> CoreResult<BindReport> {
        let agent = self.require(name)?;
        let report = tools.resolve_and_bind(host, agent.available_tools());
        tracing::info!(
            agent = %name,
            bound = report.bound().len(),
            skipped = report.skipped().len(),
            failed = report.failed().len(),
            "agent tools bound"
        );
        Ok(report)
    }
}

/// The eight built-in personas.
pub fn builtin_agents() -> Vec<StaticAgent> {
    vec![
        StaticAgent::new("code-agent", "Code Agent")
            .description(
                "General-purpose code agent that can read, write, and modify files, search codebases, and execute shell commands",
            )
            .tools([
                "list_agents",
                "invoke_agent",
                "list_files",
                "read_file",
                "grep",
                "edit_file",
                "delete_file",
                "agent_run_shell_command",
                "ask_user_question",
                "activate_skill",
                "list_or_search_skills",
                "load_image_for_analysis",
            ])
            .template(prompts::CODE_AGENT),
        StaticAgent::new("pack-leader", "Orchestrator")
            .description(
                "Orchestrates complex parallel workflows using bd issues and local merging, coordinating the agent team with critic reviews",
            )
            .tools([
                "list_files",
                "read_file",
                "grep",
                "agent_run_shell_command",
                "list_agents",
                "invoke_agent",
                "list_or_search_skills",
            ])
            .template(prompts::PACK_LEADER),
        StaticAgent::new("husky", "Executor")
            .description("Task executor - implements coding changes in isolated worktrees")
            .tools([
                "list_files",
                "read_file",
                "grep",
                "edit_file",
                "delete_file",
                "agent_run_shell_command",
                "activate_skill",
                "list_or_search_skills",
            ])
            .template(prompts::HUSKY),
        StaticAgent::new("shepherd", "Reviewer")
            .description("Code review agent - ensures code quality and best practices")
            .tools(["list_files", "read_file", "grep", "agent_run_shell_command"])
            .template(prompts::SHEPHERD),
        StaticAgent::new("bloodhound", "Tracker")
            .description("Issue tracking specialist using bd for dependency management")
            .tools(["agent_run_shell_command", "read_file"])
            .template(prompts::BLOODHOUND),
        StaticAgent::new("retriever", "Merger")
            .description("Merge specialist - integrates completed feature branches into the base branch")
            .tools(["agent_run_shell_command", "read_file", "grep", "list_files"])
            .template(prompts::RETRIEVER),
        StaticAgent::new("terrier", "Workspace Manager")
            .description(
                "Worktree specialist - creates and manages isolated workspaces for parallel development",
            )
            .tools(["agent_run_shell_command", "list_files"])
            .template(prompts::TERRIER),
        StaticAgent::new("planning-agent", "Planning Agent")
            .description(
                "Breaks down complex coding tasks into clear, actionable steps with a structured roadmap",
            )
            .tools([
                "list_files",
                "read_file",
                "grep",
                "ask_user_question",
                "list_agents",
                "invoke_agent",
                "list_or_search_skills",
            ])
            .template(prompts::PLANNING_AGENT),
    ]
}
