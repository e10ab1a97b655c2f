//! Namespaced tool sources.
//!
//! A requested capability of the form `prefix:identifier` is not stored in
//! the flat tool registry. At bind time the prefix selects a
//! [`NamespacedToolSource`], which resolves the identifier to metadata and an
//! implementation on demand.
//!
//! ```text
//! "uc:api.weather"
//!   └─ prefix "uc"  → ConstructorRegistry
//!        ├─ get_tool("api.weather")          → description, docstring, schema
//!        └─ get_tool_function("api.weather") → ToolHandler
//! ```
//!
//! [`ConstructorRegistry`] is the built-in source (the "universal
//! constructor"). Its tools are registered at runtime or loaded from JSON
//! manifests on disk.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::fs;

use super::command::command_handler;
use super::types::ToolHandler;

/// Prefix routed to the constructor registry.
pub const CONSTRUCTOR_PREFIX: &str = "uc";

/// Metadata for a namespaced tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespacedTool {
    /// Identifier within the namespace
    pub identifier: String,
    /// Short description
    pub description: String,
    /// Longer documentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    /// JSON Schema for the arguments
    #[serde(default = "default_schema")]
    pub input_schema: Value,
}

fn default_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

/// A secondary registry addressed as `prefix:identifier`.
pub trait NamespacedToolSource: Send + Sync {
    /// Namespace prefix, without the colon.
    fn prefix(&self) -> &str;

    /// Metadata for an identifier.
    fn get_tool(&self, identifier: &str) -> Option<NamespacedTool>;

    /// Implementation for an identifier.
    fn get_tool_function(&self, identifier: &str) -> Option<ToolHandler>;
}

/// Split `prefix:identifier`. Returns `None` for flat names.
pub fn split_namespaced(name: &str) -> Option<(&str, &str)> {
    name.split_once(':')
}

// ─────────────────────────────────────────────────────────────────────────────
// Constructor registry
// ─────────────────────────────────────────────────────────────────────────────

/// On-disk constructor tool manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorManifest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub input_schema: Option<Value>,
    /// argv run with the JSON arguments on stdin
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

struct ConstructorEntry {
    tool: NamespacedTool,
    handler: Option<ToolHandler>,
    source: Option<PathBuf>,
}

/// The universal constructor: runtime-defined tools under the `uc` prefix.
#[derive(Default)]
pub struct ConstructorRegistry {
    tools: RwLock<BTreeMap<String, ConstructorEntry>>,
}

impl ConstructorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata only; the tool has no implementation until
    /// [`set_handler`](Self::set_handler) is called.
    pub fn register(&self, tool: NamespacedTool) -> bool {
        self.insert(tool, None, None)
    }

    /// Register a tool together with its implementation.
    pub fn register_with_handler(&self, tool: NamespacedTool, handler: ToolHandler) -> bool {
        self.insert(tool, Some(handler), None)
    }

    /// Attach an implementation to an existing tool.
    pub fn set_handler(&self, identifier: &str, handler: ToolHandler) -> bool {
        let mut tools = self.tools.write().unwrap_or_else(|p| p.into_inner());
        match tools.get_mut(identifier) {
            Some(entry) => {
                entry.handler = Some(handler);
                true
            }
            None => false,
        }
    }

    /// Remove a tool. Returns its metadata if it existed.
    pub fn unregister(&self, identifier: &str) -> Option<NamespacedTool> {
        let mut tools = self.tools.write().unwrap_or_else(|p| p.into_inner());
        tools.remove(identifier).map(|entry| entry.tool)
    }

    /// All tools, ordered by identifier.
    pub fn list(&self) -> Vec<NamespacedTool> {
        let tools = self.tools.read().unwrap_or_else(|p| p.into_inner());
        tools.values().map(|entry| entry.tool.clone()).collect()
    }

    /// Whether a tool has an implementation attached.
    pub fn has_function(&self, identifier: &str) -> bool {
        let tools = self.tools.read().unwrap_or_else(|p| p.into_inner());
        tools.get(identifier).is_some_and(|entry| entry.handler.is_some())
    }

    /// Manifest file a tool was loaded from, if any.
    pub fn source_of(&self, identifier: &str) -> Option<PathBuf> {
        let tools = self.tools.read().unwrap_or_else(|p| p.into_inner());
        tools.get(identifier).and_then(|entry| entry.source.clone())
    }

    pub fn len(&self) -> usize {
        self.tools.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.tools.write().unwrap_or_else(|p| p.into_inner()).clear();
    }

    /// Load every `*.json` manifest in a directory.
    ///
    /// Unreadable or invalid manifests are skipped with a warning. Returns the
    /// number of tools loaded; a missing directory loads nothing.
    pub async fn load_dir(&self, dir: &Path) -> usize {
        if !dir.exists() {
            return 0;
        }

        let Ok(mut entries) = fs::read_dir(dir).await else {
            tracing::warn!(dir = %dir.display(), "cannot read constructor directory");
            return 0;
        };

        let mut paths = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match load_manifest(&path).await {
                Ok(manifest) => {
                    let handler = manifest
                        .command
                        .clone()
                        .map(|argv| command_handler(argv, path.parent().map(Path::to_path_buf)));
                    let tool = NamespacedTool {
                        identifier: manifest.name,
                        description: manifest.description,
                        docstring: manifest.docstring,
                        input_schema: manifest.input_schema.unwrap_or_else(default_schema),
                    };
                    self.insert(tool, handler, Some(path));
                    loaded += 1;
                }
                Err(message) => {
                    tracing::warn!(path = %path.display(), "skipping constructor manifest: {}", message);
                }
            }
        }

        tracing::debug!(dir = %dir.display(), loaded, "constructor tools loaded");
        loaded
    }

    fn insert(&self, tool: NamespacedTool, handler: Option<ToolHandler>, source: Option<PathBuf>) -> bool {
        let mut tools = self.tools.write().unwrap_or_else(|p| p.into_inner());
        let identifier = tool.identifier.clone();
        let replaced = tools
            .insert(identifier.clone(), ConstructorEntry { tool, handler, source })
            .is_some();
        if replaced {
            tracing::warn!(tool = %identifier, "constructor tool replaced");
        }
        !replaced
    }
}

async fn load_manifest(path: &Path) -> Result<ConstructorManifest, String> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| format!("failed to read manifest: {e}"))?;
    let manifest: ConstructorManifest =
        serde_json::from_str(&content).map_err(|e| format!("invalid JSON: {e}"))?;

    if manifest.name.trim().is_empty() || manifest.name.contains(':') {
        return Err(format!("invalid tool name {:?}", manifest.name));
    }
    if manifest.description.trim().is_empty() {
        return Err(format!("tool '{}' missing description", manifest.name));
    }
    if let Some(schema) = &manifest.input_schema {
        if !schema.is_object() {
            return Err(format!("tool '{}' input_schema must be a JSON object", manifest.name));
        }
    }
    if manifest.command.as_ref().is_some_and(Vec::is_empty) {
        return Err(format!("tool '{}' has an empty command", manifest.name));
    }

    Ok(manifest)
}

impl NamespacedToolSource for ConstructorRegistry {
    fn prefix(&self) -> &str {
        CONSTRUCTOR_PREFIX
    }

    fn get_tool(&self, identifier: &str) -> Option<NamespacedTool> {
        let tools = self.tools.read().unwrap_or_else(|p| p.into_inner());
        tools.get(identifier).map(|entry| entry.tool.clone())
    }

    fn get_tool_function(&self, identifier: &str) -> Option<ToolHandler> {
        let tools = self.tools.read().unwrap_or_else(|p| p.into_inner());
        tools.get(identifier).and_then(|entry| entry.handler.clone())
    }
}
