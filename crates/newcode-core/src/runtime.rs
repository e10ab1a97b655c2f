//! Runtime
//!
//! Owns every registry for one process and wires them together:
//!
//! ```text
//! Settings ──► plugins (in-process, manifest, project rules) ──install──► CallbackRegistry
//!                                                                             │
//! ToolRegistry ◄── built-ins, list_agents, universal_constructor              │
//!    │  └─ lazy discovery via register_tools ◄────────────────────────────────┘
//!    ├─ source "uc" ──► ConstructorRegistry ◄── constructor manifests
//!    └─ gate "universal_constructor" ──► Settings (read at bind time)
//! ```

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::agents::{AgentCatalog, AgentDescriptor, PromptContext};
use crate::callbacks::{CallbackRegistry, CommandHelp, CommandInvocation, Event};
use crate::error::CoreResult;
use crate::plugins::{ManifestLoader, Plugin, PluginReport, PluginSet, ProjectRulesPlugin};
use crate::settings::Settings;
use crate::tools::builtin::{list_agents, register_builtins, universal_constructor};
use crate::tools::{
    BindReport, CONSTRUCTOR_PREFIX, ConstructorRegistry, FeatureGate, ToolHost, ToolRegistry,
};

/// Name of the gate covering the universal constructor tool family.
pub const UNIVERSAL_CONSTRUCTOR_GATE: &str = "universal_constructor";

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
    settings: Settings,
    plugins: Vec<Arc<dyn Plugin>>,
    agents: AgentCatalog,
    project_root: Option<PathBuf>,
    builtins: bool,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            settings: Settings::default(),
            plugins: Vec::new(),
            agents: AgentCatalog::builtin(),
            project_root: None,
            builtins: true,
        }
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Add an in-process plugin, installed after manifest plugins.
    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Add or replace an agent.
    pub fn agent(mut self, agent: Arc<dyn AgentDescriptor>) -> Self {
        self.agents.register(agent);
        self
    }

    /// Load project rules from this directory.
    pub fn project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    /// Skip the file, search and shell tools.
    pub fn without_builtins(mut self) -> Self {
        self.builtins = false;
        self
    }

    /// Install plugins, load constructor tools and assemble the registries.
    pub async fn build(self) -> CoreResult<Runtime> {
        self.settings.validate()?;

        let callbacks = Arc::new(CallbackRegistry::new());
        let mut plugin_set = PluginSet::new();
        let mut plugin_errors = Vec::new();

        if let Some(root) = &self.project_root {
            plugin_set.add(Arc::new(ProjectRulesPlugin::new(root.clone())));
        }

        if self.settings.plugins.enabled {
            let loader = ManifestLoader::new(self.settings.plugins.directories.clone())
                .with_disabled(self.settings.plugins.disabled.clone());
            for result in loader.scan().await {
                match result {
                    Ok(plugin) => plugin_set.add(Arc::new(plugin)),
                    Err(e) => {
                        tracing::warn!("skipping manifest plugin: {}", e);
                        plugin_errors.push(e.to_string());
                    }
                }
            }
        } else {
            tracing::debug!("manifest plugins disabled");
        }

        for plugin in self.plugins {
            if self.settings.is_plugin_disabled(plugin.name()) {
                tracing::debug!(plugin = plugin.name(), "plugin disabled in settings");
                continue;
            }
            plugin_set.add(plugin);
        }

        let plugin_reports = plugin_set.install(&callbacks);

        let tools = ToolRegistry::new(callbacks.clone());
        if self.builtins {
            register_builtins(&tools);
        }
        tools.register("list_agents", list_agents(self.agents.summaries()));

        let constructor = Arc::new(ConstructorRegistry::new());
        constructor.load_dir(&self.settings.constructor.directory).await;
        tools.register(UNIVERSAL_CONSTRUCTOR_GATE, universal_constructor(constructor.clone()));
        tools.add_source(constructor.clone());

        let settings = Arc::new(RwLock::new(self.settings));
        let gate_settings = settings.clone();
        tools.add_gate(
            FeatureGate::new(UNIVERSAL_CONSTRUCTOR_GATE, move || {
                gate_settings
                    .read()
                    .unwrap_or_else(|p| p.into_inner())
                    .universal_constructor
            })
            .tool(UNIVERSAL_CONSTRUCTOR_GATE)
            .prefix(CONSTRUCTOR_PREFIX),
        );

        tracing::info!(
            plugins = plugin_reports.len(),
            agents = self.agents.len(),
            constructor_tools = constructor.len(),
            "runtime ready"
        );

        Ok(Runtime {
            settings,
            callbacks,
            tools,
            constructor,
            agents: self.agents,
            plugin_reports,
            plugin_errors,
        })
    }
}

/// Every registry for one process.
pub struct Runtime {
    settings: Arc<RwLock<Settings>>,
    callbacks: Arc<CallbackRegistry>,
    tools: ToolRegistry,
    constructor: Arc<ConstructorRegistry>,
    agents: AgentCatalog,
    plugin_reports: Vec<PluginReport>,
    plugin_errors: Vec<String>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Build from the config file, the environment and the working directory.
    pub async fn load() -> CoreResult<Self> {
        let settings = Settings::load()?;
        let mut builder = Self::builder().settings(settings);
        if let Ok(cwd) = std::env::current_dir() {
            builder = builder.project_root(cwd);
        }
        builder.build().await
    }

    /// Current settings.
    pub fn settings(&self) -> Settings {
        self.settings.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Change settings in place. Gates and prompts see the change immediately.
    pub fn update_settings(&self, update: impl FnOnce(&mut Settings)) {
        let mut settings = self.settings.write().unwrap_or_else(|p| p.into_inner());
        update(&mut *settings);
    }

    pub fn callbacks(&self) -> &Arc<CallbackRegistry> {
        &self.callbacks
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn constructor(&self) -> &Arc<ConstructorRegistry> {
        &self.constructor
    }

    pub fn agents(&self) -> &AgentCatalog {
        &self.agents
    }

    /// Installation outcome of every plugin.
    pub fn plugin_reports(&self) -> &[PluginReport] {
        &self.plugin_reports
    }

    /// Manifest plugins that could not be loaded.
    pub fn plugin_errors(&self) -> &[String] {
        &self.plugin_errors
    }

    pub fn prompt_context(&self) -> PromptContext {
        PromptContext::from_settings(&self.settings())
    }

    /// Render an agent's full system prompt from the current settings.
    pub fn render_prompt(&self, agent: &str) -> CoreResult<String> {
        let agent = self.agents.require(agent)?;
        Ok(agent.render_system_prompt(&self.prompt_context(), &self.callbacks))
    }

    /// Bind an agent's tools onto `host`.
    pub fn build_agent(&self, agent: &str, host: &mut dyn ToolHost) -> CoreResult<BindReport> {
        self.agents.build(agent, &self.tools, host)
    }

    /// Aggregated help for plugin slash commands.
    pub fn command_help(&self) -> Vec<CommandHelp> {
        self.callbacks.invoke_commands(&Event::CustomCommandHelp)
    }

    /// Dispatch a slash command line to the plugin command handlers.
    /// `None` when the line is blank or no plugin handled it.
    pub fn run_command(&self, line: &str) -> Option<String> {
        let command = CommandInvocation::parse(line)?;
        self.callbacks.run_command(&command)
    }

    /// Empty every registry and re-arm plugin discovery.
    pub fn reset(&self) {
        self.callbacks.clear();
        self.tools.clear();
        self.constructor.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::{CommandResult, Contribution};
    use crate::tools::{AgentTools, BindOutcome, SkipReason};
    use tempfile::tempdir;

    fn isolated_settings(root: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.user_name = "ada".into();
        settings.plugins.directories = vec![root.join("plugins")];
        settings.constructor.directory = root.join("uc");
        settings
    }

    struct RulesPlugin;

    impl Plugin for RulesPlugin {
        fn name(&self) -> &str {
            "rules"
        }

        fn register(&self, callbacks: &CallbackRegistry) -> anyhow::Result<()> {
            callbacks.register_fn(Event::LoadPrompt, "rules", || Ok(Contribution::Text("Be brief.".into())));
            callbacks.register_command("rules", |command| {
                Ok(match command.name.as_str() {
                    "rules" => CommandResult::Output("Be brief.".into()),
                    _ => CommandResult::NotHandled,
                })
            });
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_build_and_render() {
        let temp = tempdir().unwrap();
        let runtime = Runtime::builder()
            .settings(isolated_settings(temp.path()))
            .plugin(Arc::new(RulesPlugin))
            .build()
            .await
            .unwrap();

        assert_eq!(runtime.plugin_reports().len(), 1);
        let prompt = runtime.render_prompt("code-agent").unwrap();
        assert!(prompt.contains("assisting ada"));
        assert!(prompt.ends_with("Be brief."));

        runtime.update_settings(|s| s.user_name = "grace".into());
        assert!(runtime.render_prompt("code-agent").unwrap().contains("assisting grace"));

        assert!(runtime.render_prompt("poodle").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_constructor_gate_follows_settings() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("uc")).unwrap();
        std::fs::write(
            temp.path().join("uc/echo.json"),
            r#"{"name": "text.echo", "description": "Echo", "command": ["cat"]}"#,
        )
        .unwrap();

        let runtime = Runtime::builder()
            .settings(isolated_settings(temp.path()))
            .build()
            .await
            .unwrap();
        assert_eq!(runtime.constructor().len(), 1);

        let mut host = AgentTools::new("code-agent");
        let report = runtime
            .tools()
            .resolve_and_bind(&mut host, ["universal_constructor", "uc:text.echo"]);
        assert_eq!(report.bound(), vec!["universal_constructor", "uc:text.echo"]);

        runtime.update_settings(|s| s.universal_constructor = false);
        let mut host = AgentTools::new("code-agent");
        let report = runtime
            .tools()
            .resolve_and_bind(&mut host, ["universal_constructor", "uc:text.echo", "read_file"]);
        assert_eq!(report.bound(), vec!["read_file"]);
        assert_eq!(
            report.outcome("uc:text.echo"),
            Some(&BindOutcome::Skipped(SkipReason::Disabled {
                gate: UNIVERSAL_CONSTRUCTOR_GATE.into()
            }))
        );
        assert!(runtime.tools().list_available_names().contains("universal_constructor"));
    }

    #[tokio::test]
    async fn test_disabled_plugins_are_not_installed() {
        let temp = tempdir().unwrap();
        let mut settings = isolated_settings(temp.path());
        settings.plugins.disabled = vec!["rules".into()];

        let runtime = Runtime::builder()
            .settings(settings)
            .plugin(Arc::new(RulesPlugin))
            .build()
            .await
            .unwrap();
        assert!(runtime.plugin_reports().is_empty());
    }

    #[tokio::test]
    async fn test_run_command_dispatches_to_plugins() {
        let temp = tempdir().unwrap();
        let runtime = Runtime::builder()
            .settings(isolated_settings(temp.path()))
            .plugin(Arc::new(RulesPlugin))
            .build()
            .await
            .unwrap();

        assert_eq!(runtime.run_command("/rules").as_deref(), Some("Be brief."));
        assert_eq!(runtime.run_command("/unknown"), None);
        assert_eq!(runtime.run_command("   "), None);
    }

    #[tokio::test]
    async fn test_reset_empties_registries() {
        let temp = tempdir().unwrap();
        let runtime = Runtime::builder()
            .settings(isolated_settings(temp.path()))
            .plugin(Arc::new(RulesPlugin))
            .build()
            .await
            .unwrap();

        runtime.reset();
        assert!(runtime.tools().list_available_names().is_empty());
        assert!(runtime.callbacks().events().is_empty());
        assert!(runtime.constructor().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_settings_are_rejected() {
        let temp = tempdir().unwrap();
        let mut settings = isolated_settings(temp.path());
        settings.agent_name = " ".into();
        assert!(Runtime::builder().settings(settings).build().await.is_err());
    }
}
