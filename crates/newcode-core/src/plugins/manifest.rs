//! Manifest Plugins
//!
//! File-based plugins. Each plugin is a directory holding `plugin.json`:
//!
//! ```json
//! {
//!   "id": "house-rules",
//!   "name": "House Rules",
//!   "version": "1.0.0",
//!   "description": "Team conventions",
//!   "prompt": "Always run cargo fmt before committing.",
//!   "commands": [{
//!     "name": "fmt",
//!     "description": "Format the workspace",
//!     "response": "Run `cargo fmt {args}` before committing."
//!   }],
//!   "tools": [{
//!     "name": "fmt_check",
//!     "description": "Check formatting",
//!     "command": ["cargo", "fmt", "--check"]
//!   }]
//! }
//! ```
//!
//! A command with a `response` handles `/name args` by echoing the response
//! with `{name}` and `{args}` filled in.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::PluginError;
use super::plugin::Plugin;
use crate::callbacks::{CallbackRegistry, CommandHelp, CommandResult, Contribution, Event};
use crate::tools::{ToolBuilder, ToolDescriptor, command_handler, register_fn};

/// Manifest file name inside a plugin directory.
pub const MANIFEST_FILE: &str = "plugin.json";

/// Tool entry in a plugin manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestTool {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    /// argv run with the JSON arguments on stdin
    #[serde(default)]
    pub command: Vec<String>,
}

/// Slash command entry in a plugin manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestCommand {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Text shown when the command runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl ManifestCommand {
    pub fn help(&self) -> CommandHelp {
        CommandHelp::new(self.name.clone(), self.description.clone())
    }

    fn render(&self, args: &str) -> Option<String> {
        let response = self.response.as_ref()?;
        Some(response.replace("{name}", &self.name).replace("{args}", args))
    }
}

/// Plugin manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Unique identifier (lowercase, hyphens)
    pub id: String,
    /// Display name
    pub name: String,
    /// Semantic version
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Text appended to agent system prompts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub commands: Vec<ManifestCommand>,
    #[serde(default)]
    pub tools: Vec<ManifestTool>,
}

impl PluginManifest {
    /// Check required fields and formats.
    pub fn validate(&self) -> Result<(), PluginError> {
        if self.id.is_empty() {
            return Err(PluginError::InvalidManifest("Missing plugin ID".into()));
        }
        if self.name.is_empty() {
            return Err(PluginError::InvalidManifest("Missing plugin name".into()));
        }
        if self.version.is_empty() {
            return Err(PluginError::InvalidManifest("Missing version".into()));
        }

        if !self
            .id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(PluginError::InvalidManifest(
                "Plugin ID must be lowercase alphanumeric with hyphens".into(),
            ));
        }

        let parts: Vec<&str> = self.version.split('.').collect();
        if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(PluginError::InvalidManifest(
                "Version must be semver format (e.g., 1.0.0)".into(),
            ));
        }

        for command in &self.commands {
            if command.name.trim().is_empty() {
                return Err(PluginError::InvalidManifest("Command missing name".into()));
            }
            if command.name.starts_with('/') || command.name.contains(char::is_whitespace) {
                return Err(PluginError::InvalidManifest(format!(
                    "Command '{}' must be a single word without a leading slash",
                    command.name
                )));
            }
        }

        for tool in &self.tools {
            validate_tool(tool)?;
        }

        Ok(())
    }
}

fn validate_tool(tool: &ManifestTool) -> Result<(), PluginError> {
    if tool.name.trim().is_empty() {
        return Err(PluginError::InvalidManifest("Tool missing name".into()));
    }
    if tool.description.is_empty() {
        return Err(PluginError::InvalidManifest(format!(
            "Tool '{}' missing description",
            tool.name
        )));
    }
    if let Some(schema) = &tool.input_schema {
        if !schema.is_object() {
            return Err(PluginError::InvalidManifest(format!(
                "Tool '{}' input_schema must be a JSON object",
                tool.name
            )));
        }
    }
    Ok(())
}

/// A plugin backed by a `plugin.json` manifest.
#[derive(Debug, Clone)]
pub struct ManifestPlugin {
    manifest: PluginManifest,
    root: PathBuf,
}

impl ManifestPlugin {
    pub fn new(manifest: PluginManifest, root: impl Into<PathBuf>) -> Self {
        Self {
            manifest,
            root: root.into(),
        }
    }

    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    /// Plugin directory; command tools run from here.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.manifest
            .tools
            .iter()
            .map(|tool| {
                if tool.command.is_empty() {
                    return ToolDescriptor::without_function(tool.name.clone());
                }

                let builder = {
                    let mut builder = ToolBuilder::new(tool.name.clone())
                        .description(tool.description.clone())
                        .handler(command_handler(tool.command.clone(), Some(self.root.clone())));
                    if let Some(doc) = &tool.docstring {
                        builder = builder.docstring(doc.clone());
                    }
                    if let Some(schema) = &tool.input_schema {
                        builder = builder.input_schema(schema.clone());
                    }
                    builder
                };

                ToolDescriptor::new(
                    tool.name.clone(),
                    register_fn(move |host| host.declare_tool(builder.clone().build()?)),
                )
            })
            .collect()
    }
}

impl Plugin for ManifestPlugin {
    fn name(&self) -> &str {
        &self.manifest.id
    }

    fn version(&self) -> &str {
        &self.manifest.version
    }

    fn description(&self) -> &str {
        &self.manifest.description
    }

    fn register(&self, callbacks: &CallbackRegistry) -> anyhow::Result<()> {
        let id = self.manifest.id.clone();

        if let Some(prompt) = self.manifest.prompt.clone().filter(|p| !p.trim().is_empty()) {
            callbacks.register_fn(Event::LoadPrompt, id.clone(), move || Ok(Contribution::Text(prompt.clone())));
        }

        if !self.manifest.commands.is_empty() {
            let help: Vec<CommandHelp> = self.manifest.commands.iter().map(ManifestCommand::help).collect();
            callbacks.register_fn(Event::CustomCommandHelp, id.clone(), move || {
                Ok(Contribution::Commands(help.clone()))
            });
        }

        if self.manifest.commands.iter().any(|c| c.response.is_some()) {
            let commands = self.manifest.commands.clone();
            callbacks.register_command(id.clone(), move |invocation| {
                let output = commands
                    .iter()
                    .filter(|c| c.name == invocation.name)
                    .find_map(|c| c.render(&invocation.args));
                Ok(output.map_or(CommandResult::NotHandled, CommandResult::Output))
            });
        }

        if !self.manifest.tools.is_empty() {
            let descriptors = self.descriptors();
            callbacks.register_fn(Event::RegisterTools, id, move || Ok(Contribution::Tools(descriptors.clone())));
        }

        Ok(())
    }
}

/// Scans plugin directories for manifests.
#[derive(Debug, Clone, Default)]
pub struct ManifestLoader {
    /// Directories to scan
    pub directories: Vec<PathBuf>,
    /// Plugin IDs to skip
    pub disabled: Vec<String>,
}

impl ManifestLoader {
    pub fn new(directories: Vec<PathBuf>) -> Self {
        Self {
            directories,
            disabled: Vec::new(),
        }
    }

    /// Skip plugins with these IDs.
    pub fn with_disabled(mut self, disabled: Vec<String>) -> Self {
        self.disabled = disabled;
        self
    }

    /// Load a plugin from its directory.
    pub async fn load_from_dir(&self, path: &Path) -> Result<ManifestPlugin, PluginError> {
        let manifest_path = path.join(MANIFEST_FILE);

        if !manifest_path.exists() {
            return Err(PluginError::LoadFailed(format!(
                "No {} found in {:?}",
                MANIFEST_FILE, path
            )));
        }

        let content = fs::read_to_string(&manifest_path).await?;

        let manifest: PluginManifest = serde_json::from_str(&content)
            .map_err(|e| PluginError::InvalidManifest(format!("Invalid JSON: {}", e)))?;

        manifest.validate()?;

        Ok(ManifestPlugin::new(manifest, path))
    }

    /// Scan every directory. Returns one result per plugin directory, sorted
    /// by path; disabled plugins are left out.
    pub async fn scan(&self) -> Vec<Result<ManifestPlugin, PluginError>> {
        let mut results = Vec::new();

        for dir in &self.directories {
            if !dir.exists() {
                continue;
            }

            let Ok(mut entries) = fs::read_dir(dir).await else {
                tracing::warn!(dir = %dir.display(), "cannot read plugin directory");
                continue;
            };

            let mut plugin_dirs = Vec::new();
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.is_dir() && path.join(MANIFEST_FILE).exists() {
                    plugin_dirs.push(path);
                }
            }
            plugin_dirs.sort();

            for path in plugin_dirs {
                let result = self.load_from_dir(&path).await;
                if let Ok(plugin) = &result {
                    if self.disabled.iter().any(|id| id == &plugin.manifest.id) {
                        tracing::debug!(plugin = %plugin.manifest.id, "plugin disabled in settings");
                        continue;
                    }
                }
                results.push(result);
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::CommandInvocation;
    use crate::tools::{AgentTools, ToolRegistry};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn manifest() -> PluginManifest {
        PluginManifest {
            id: "house-rules".into(),
            name: "House Rules".into(),
            version: "1.0.0".into(),
            description: "Team conventions".into(),
            prompt: Some("Run the formatter.".into()),
            commands: vec![
                ManifestCommand {
                    name: "fmt".into(),
                    description: "Format the workspace".into(),
                    response: Some("Run `cargo fmt {args}` via /{name}.".into()),
                },
                ManifestCommand {
                    name: "lint".into(),
                    description: "Help only".into(),
                    response: None,
                },
            ],
            tools: vec![ManifestTool {
                name: "echo_args".into(),
                description: "Echo arguments".into(),
                docstring: None,
                input_schema: None,
                command: vec!["cat".into()],
            }],
        }
    }

    #[test]
    fn test_manifest_validation() {
        assert!(manifest().validate().is_ok());

        let bad_id = PluginManifest {
            id: "House Rules".into(),
            ..manifest()
        };
        assert!(bad_id.validate().is_err());

        let bad_version = PluginManifest {
            version: "1".into(),
            ..manifest()
        };
        assert!(bad_version.validate().is_err());

        let mut bad_command = manifest();
        bad_command.commands[0].name = "/fmt".into();
        assert!(bad_command.validate().is_err());

        let mut bad_tool = manifest();
        bad_tool.tools[0].input_schema = Some(serde_json::json!([1, 2]));
        assert!(matches!(bad_tool.validate(), Err(PluginError::InvalidManifest(_))));
    }

    #[test]
    fn test_manifest_plugin_contributes_to_every_event() {
        let plugin = ManifestPlugin::new(manifest(), "/tmp");
        let callbacks = Arc::new(CallbackRegistry::new());
        plugin.register(&callbacks).unwrap();

        assert_eq!(callbacks.invoke_text(&Event::LoadPrompt), vec!["Run the formatter."]);
        assert_eq!(
            callbacks.invoke_commands(&Event::CustomCommandHelp),
            vec![
                CommandHelp::new("fmt", "Format the workspace"),
                CommandHelp::new("lint", "Help only"),
            ]
        );
        assert_eq!(
            callbacks.run_command(&CommandInvocation::parse("/fmt --all").unwrap()).as_deref(),
            Some("Run `cargo fmt --all` via /fmt.")
        );
        assert_eq!(callbacks.run_command(&CommandInvocation::parse("/lint").unwrap()), None);

        let tools = ToolRegistry::new(callbacks);
        let mut host = AgentTools::new("code-agent");
        let report = tools.resolve_and_bind(&mut host, ["echo_args"]);
        assert_eq!(report.bound(), vec!["echo_args"]);
        assert_eq!(host.get("echo_args").unwrap().description, "Echo arguments");
    }

    #[tokio::test]
    async fn test_scan_reports_each_plugin_dir() {
        let temp = tempdir().unwrap();

        let good = temp.path().join("good");
        std::fs::create_dir(&good).unwrap();
        std::fs::write(good.join(MANIFEST_FILE), serde_json::to_string(&manifest()).unwrap()).unwrap();

        let bad = temp.path().join("bad");
        std::fs::create_dir(&bad).unwrap();
        std::fs::write(bad.join(MANIFEST_FILE), r#"{"id": "Bad", "name": "x", "version": "1.0"}"#).unwrap();

        std::fs::create_dir(temp.path().join("no-manifest")).unwrap();

        let loader = ManifestLoader::new(vec![temp.path().to_path_buf(), temp.path().join("missing")]);
        let results = loader.scan().await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err(), "bad sorts before good");
        assert_eq!(results[1].as_ref().unwrap().name(), "house-rules");

        let results = loader.with_disabled(vec!["house-rules".into()]).scan().await;
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_load_errors_are_classified() {
        let temp = tempdir().unwrap();
        let loader = ManifestLoader::default();

        let empty = temp.path().join("empty");
        std::fs::create_dir(&empty).unwrap();
        assert!(matches!(loader.load_from_dir(&empty).await, Err(PluginError::LoadFailed(_))));

        let unreadable = temp.path().join("unreadable");
        std::fs::create_dir_all(unreadable.join(MANIFEST_FILE)).unwrap();
        assert!(matches!(loader.load_from_dir(&unreadable).await, Err(PluginError::Io(_))));

        let garbled = temp.path().join("garbled");
        std::fs::create_dir(&garbled).unwrap();
        std::fs::write(garbled.join(MANIFEST_FILE), "{not json").unwrap();
        assert!(matches!(
            loader.load_from_dir(&garbled).await,
            Err(PluginError::InvalidManifest(_))
        ));
    }
}
