//! Agent descriptor contract.

use serde::Serialize;

use crate::callbacks::{CallbackRegistry, Event};
use crate::settings::Settings;

/// Configuration values interpolated into prompt templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub agent_name: String,
    pub user_name: String,
}

impl PromptContext {
    pub fn new(agent_name: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            user_name: user_name.into(),
        }
    }

    /// Read the current values from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.agent_name.clone(), settings.user_name.clone())
    }

    /// Replace `{agent_name}` and `{user_name}` in a template.
    pub fn render(&self, template: &str) -> String {
        template
            .replace("{agent_name}", &self.agent_name)
            .replace("{user_name}", &self.user_name)
    }
}

/// Identity of an agent, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSummary {
    pub name: String,
    pub display_name: String,
    pub description: String,
}

/// A named bundle of capabilities and a prompt template.
pub trait AgentDescriptor: Send + Sync {
    /// Unique name, used as lookup key and CLI identifier.
    fn name(&self) -> &str;

    /// Human label.
    fn display_name(&self) -> &str;

    /// One-line description.
    fn description(&self) -> &str;

    /// Requested tool names, in order. May include `prefix:identifier` entries.
    fn available_tools(&self) -> Vec<String>;

    /// Base prompt for the given configuration.
    fn system_prompt(&self, ctx: &PromptContext) -> String;

    /// Base prompt followed by every `load_prompt` contribution.
    ///
    /// Recomputed on each call; nothing is cached.
    fn render_system_prompt(&self, ctx: &PromptContext, callbacks: &CallbackRegistry) -> String {
        let mut prompt = self.system_prompt(ctx);
        let additions = callbacks.invoke_text(&Event::LoadPrompt);
        if !additions.is_empty() {
            if !prompt.is_empty() && !prompt.ends_with('\n') {
                prompt.push('\n');
            }
            prompt.push_str(&additions.join("\n"));
        }
        prompt
    }

    fn summary(&self) -> AgentSummary {
        AgentSummary {
            name: self.name().to_string(),
            display_name: self.display_name().to_string(),
            description: self.description().to_string(),
        }
    }
}

/// Data-only agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAgent {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub tools: Vec<String>,
    pub template: String,
}

impl StaticAgent {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: String::new(),
            tools: Vec::new(),
            template: String::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }
}

impl AgentDescriptor for StaticAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn available_tools(&self) -> Vec<String> {
        self.tools.clone()
    }

    fn system_prompt(&self, ctx: &PromptContext) -> String {
        ctx.render(&self.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::Contribution;
    use std::sync::{Arc, RwLock};

    fn agent() -> StaticAgent {
        StaticAgent::new("helper", "Helper")
            .description("Helps")
            .tools(["read_file"])
            .template("You are {agent_name}, helping {user_name}.\n")
    }

    #[test]
    fn test_prompt_appends_extensions_in_order() {
        let callbacks = CallbackRegistry::new();
        callbacks.register_fn(Event::LoadPrompt, "a", || Ok("Rule one.".into()));
        callbacks.register_fn(Event::LoadPrompt, "broken", || anyhow::bail!("nope"));
        callbacks.register_fn(Event::LoadPrompt, "b", || Ok(Contribution::Lines(vec!["Rule two.".into()])));

        let ctx = PromptContext::new("newcode", "ada");
        assert_eq!(
            agent().render_system_prompt(&ctx, &callbacks),
            "You are newcode, helping ada.\nRule one.\nRule two."
        );
    }

    #[test]
    fn test_prompt_is_not_cached() {
        let callbacks = CallbackRegistry::new();
        let settings = Arc::new(RwLock::new(Settings::default()));
        settings.write().unwrap().user_name = "ada".into();

        let first = agent().render_system_prompt(
            &PromptContext::from_settings(&settings.read().unwrap()),
            &callbacks,
        );
        settings.write().unwrap().user_name = "grace".into();
        let second = agent().render_system_prompt(
            &PromptContext::from_settings(&settings.read().unwrap()),
            &callbacks,
        );

        assert!(first.contains("ada"));
        assert!(second.contains("grace"));
    }

    #[test]
    fn test_summary() {
        let summary = agent().summary();
        assert_eq!(summary.name, "helper");
        assert_eq!(summary.display_name, "Helper");
    }
}
