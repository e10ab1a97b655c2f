//! Tool Registry
//!
//! Maps flat tool names to registration functions and binds requested
//! capability lists onto a [`ToolHost`].
//!
//! Binding never fails as a whole. Every requested name produces exactly one
//! [`BindOutcome`] in the returned [`BindReport`]:
//!
//! ```text
//! name ──► gate disabled? ──yes──► Skipped(Disabled)        (debug)
//!            │no
//!            ├─ "prefix:id" ──► source ─► metadata ─► function ─► declare
//!            │                   miss      miss        miss       reject
//!            │                    └──────────┴───────────┴─► Skipped / Failed (warn)
//!            └─ flat ──► registered? ──no──► Skipped(Unknown) (warn)
//!                          │yes
//!                          └─► register_fn(host) ──err/panic──► Failed (warn)
//! ```

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock};

use super::namespaced::{NamespacedTool, NamespacedToolSource, split_namespaced};
use super::types::{RegisterFn, ToolDeclaration, ToolHost, ToolHandler, ToolRegistration};
use crate::callbacks::CallbackRegistry;
use crate::isolate::isolate;
use crate::plugins::{DiscoveryReport, PluginLoader};

// ─────────────────────────────────────────────────────────────────────────────
// Feature gates
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime switch that hides a family of tools at bind time.
#[derive(Clone)]
pub struct FeatureGate {
    /// Gate name, reported in skip outcomes
    pub name: String,
    /// Flat tool names covered by the gate
    pub tool_names: Vec<String>,
    /// Namespace prefixes covered by the gate
    pub prefixes: Vec<String>,
    enabled: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl FeatureGate {
    /// Create a gate. `enabled` is evaluated on every bind.
    pub fn new<F>(name: impl Into<String>, enabled: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            tool_names: Vec::new(),
            prefixes: Vec::new(),
            enabled: Arc::new(enabled),
        }
    }

    /// Cover a flat tool name.
    pub fn tool(mut self, name: impl Into<String>) -> Self {
        self.tool_names.push(name.into());
        self
    }

    /// Cover every name under a namespace prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    /// Whether a requested name falls under this gate.
    pub fn covers(&self, name: &str) -> bool {
        if self.tool_names.iter().any(|t| t == name) {
            return true;
        }
        match split_namespaced(name) {
            Some((prefix, _)) => self.prefixes.iter().any(|p| p == prefix),
            None => false,
        }
    }

    /// Current state of the flag.
    pub fn is_enabled(&self) -> bool {
        (self.enabled)()
    }
}

impl fmt::Debug for FeatureGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureGate")
            .field("name", &self.name)
            .field("tool_names", &self.tool_names)
            .field("prefixes", &self.prefixes)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bind report
// ─────────────────────────────────────────────────────────────────────────────

/// Why a requested name was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Covered by a disabled feature gate
    Disabled { gate: String },
    /// No flat registration with that name
    Unknown,
    /// No namespaced source for the prefix
    UnknownNamespace { prefix: String },
    /// The namespaced source has no metadata for the identifier
    MissingMetadata,
    /// The namespaced source has metadata but no implementation
    MissingFunction,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Disabled { gate } => write!(f, "disabled by gate '{gate}'"),
            SkipReason::Unknown => f.write_str("unknown tool"),
            SkipReason::UnknownNamespace { prefix } => write!(f, "unknown namespace '{prefix}'"),
            SkipReason::MissingMetadata => f.write_str("no metadata in namespace"),
            SkipReason::MissingFunction => f.write_str("no implementation in namespace"),
        }
    }
}

/// Outcome for one requested name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BindOutcome {
    Bound,
    Skipped(SkipReason),
    Failed { error: String },
}

impl fmt::Display for BindOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindOutcome::Bound => f.write_str("bound"),
            BindOutcome::Skipped(reason) => write!(f, "skipped: {reason}"),
            BindOutcome::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// One entry in a [`BindReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindEntry {
    pub name: String,
    #[serde(flatten)]
    pub outcome: BindOutcome,
}

/// Per-name outcomes of one `resolve_and_bind` call, in request order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BindReport {
    pub agent: String,
    pub entries: Vec<BindEntry>,
}

impl BindReport {
    fn push(&mut self, name: &str, outcome: BindOutcome) {
        self.entries.push(BindEntry {
            name: name.to_string(),
            outcome,
        });
    }

    /// Names that were bound.
    pub fn bound(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.outcome == BindOutcome::Bound)
            .map(|e| e.name.as_str())
            .collect()
    }

    /// Skipped names with their reasons.
    pub fn skipped(&self) -> Vec<(&str, &SkipReason)> {
        self.entries
            .iter()
            .filter_map(|e| match &e.outcome {
                BindOutcome::Skipped(reason) => Some((e.name.as_str(), reason)),
                _ => None,
            })
            .collect()
    }

    /// Failed names with their errors.
    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .filter_map(|e| match &e.outcome {
                BindOutcome::Failed { error } => Some((e.name.as_str(), error.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Entries that were logged at warning level: everything that is
    /// neither bound nor silently gated.
    pub fn warnings(&self) -> Vec<&BindEntry> {
        self.entries
            .iter()
            .filter(|e| match &e.outcome {
                BindOutcome::Bound => false,
                BindOutcome::Skipped(SkipReason::Disabled { .. }) => false,
                _ => true,
            })
            .collect()
    }

    /// Outcome for a name, if it was requested.
    pub fn outcome(&self, name: &str) -> Option<&BindOutcome> {
        self.entries.iter().find(|e| e.name == name).map(|e| &e.outcome)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Flat name → registration function, plus gates and namespaced sources.
pub struct ToolRegistry {
    callbacks: Arc<CallbackRegistry>,
    loader: PluginLoader,
    tools: RwLock<HashMap<String, ToolRegistration>>,
    gates: RwLock<Vec<FeatureGate>>,
    sources: RwLock<HashMap<String, Arc<dyn NamespacedToolSource>>>,
}

impl ToolRegistry {
    /// Create an empty registry that discovers plugin tools through
    /// `callbacks`.
    pub fn new(callbacks: Arc<CallbackRegistry>) -> Self {
        Self {
            callbacks,
            loader: PluginLoader::new(),
            tools: RwLock::new(HashMap::new()),
            gates: RwLock::new(Vec::new()),
            sources: RwLock::new(HashMap::new()),
        }
    }

    /// Callback registry used for plugin discovery.
    pub fn callbacks(&self) -> &Arc<CallbackRegistry> {
        &self.callbacks
    }

    /// Plugin discovery guard.
    pub fn plugin_loader(&self) -> &PluginLoader {
        &self.loader
    }

    /// Register a flat name. Last registration wins; the replaced entry is
    /// returned and a warning is logged.
    pub fn register(&self, name: impl Into<String>, register: RegisterFn) -> Option<ToolRegistration> {
        let name = name.into();
        let mut tools = self.tools.write().unwrap_or_else(|p| p.into_inner());
        let previous = tools.insert(
            name.clone(),
            ToolRegistration {
                name: name.clone(),
                register,
            },
        );
        if previous.is_some() {
            tracing::warn!(tool = %name, "tool registration replaced an existing entry");
        } else {
            tracing::debug!(tool = %name, "tool registered");
        }
        previous
    }

    /// Remove a flat registration.
    pub fn unregister(&self, name: &str) -> Option<ToolRegistration> {
        self.tools
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(name)
    }

    /// Whether a flat name is registered. Does not trigger discovery.
    pub fn contains(&self, name: &str) -> bool {
        self.tools
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(name)
    }

    /// Add a feature gate.
    pub fn add_gate(&self, gate: FeatureGate) {
        tracing::debug!(gate = %gate.name, "feature gate added");
        self.gates
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .push(gate);
    }

    /// Snapshot of the configured gates.
    pub fn gates(&self) -> Vec<FeatureGate> {
        self.gates.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Attach a namespaced source under its prefix, replacing any source
    /// with the same prefix.
    pub fn add_source(&self, source: Arc<dyn NamespacedToolSource>) {
        let prefix = source.prefix().to_string();
        tracing::debug!(prefix = %prefix, "namespaced source attached");
        self.sources
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(prefix, source);
    }

    /// Attached namespace prefixes, sorted.
    pub fn prefixes(&self) -> Vec<String> {
        let sources = self.sources.read().unwrap_or_else(|p| p.into_inner());
        let mut prefixes: Vec<String> = sources.keys().cloned().collect();
        prefixes.sort();
        prefixes
    }

    /// Run plugin discovery if it has not run yet.
    pub fn ensure_plugins_loaded(&self) -> Option<DiscoveryReport> {
        self.loader.ensure_loaded(&self.callbacks, self)
    }

    /// All known flat names, gated ones included.
    pub fn list_available_names(&self) -> BTreeSet<String> {
        self.ensure_plugins_loaded();
        self.tools
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// Bind each requested name onto `host`, in order.
    pub fn resolve_and_bind<I, S>(&self, host: &mut dyn ToolHost, names: I) -> BindReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_plugins_loaded();

        let gates = self.gates();
        let mut report = BindReport {
            agent: host.agent_name().to_string(),
            entries: Vec::new(),
        };

        for name in names {
            let name = name.as_ref();

            if let Some(gate) = gates.iter().find(|g| g.covers(name) && !g.is_enabled()) {
                tracing::debug!(tool = %name, gate = %gate.name, "tool disabled by feature gate");
                report.push(
                    name,
                    BindOutcome::Skipped(SkipReason::Disabled {
                        gate: gate.name.clone(),
                    }),
                );
                continue;
            }

            let outcome = match split_namespaced(name) {
                Some((prefix, identifier)) => self.bind_namespaced(host, prefix, identifier),
                None => self.bind_flat(host, name),
            };

            match &outcome {
                BindOutcome::Bound => {
                    tracing::debug!(agent = %report.agent, tool = %name, "tool bound");
                }
                other => {
                    tracing::warn!(agent = %report.agent, tool = %name, "tool not bound: {}", other);
                }
            }
            report.push(name, outcome);
        }

        report
    }

    fn bind_flat(&self, host: &mut dyn ToolHost, name: &str) -> BindOutcome {
        // Clone the function out so it runs without holding the lock.
        let register = {
            let tools = self.tools.read().unwrap_or_else(|p| p.into_inner());
            tools.get(name).map(|entry| entry.register.clone())
        };
        let Some(register) = register else {
            return BindOutcome::Skipped(SkipReason::Unknown);
        };

        match isolate(|| register(host)) {
            Ok(()) => BindOutcome::Bound,
            Err(error) => BindOutcome::Failed { error },
        }
    }

    fn bind_namespaced(&self, host: &mut dyn ToolHost, prefix: &str, identifier: &str) -> BindOutcome {
        let source = {
            let sources = self.sources.read().unwrap_or_else(|p| p.into_inner());
            sources.get(prefix).cloned()
        };
        let Some(source) = source else {
            return BindOutcome::Skipped(SkipReason::UnknownNamespace {
                prefix: prefix.to_string(),
            });
        };

        let lookup = isolate(|| {
            let Some(tool) = source.get_tool(identifier) else {
                return Ok::<_, String>(Err(SkipReason::MissingMetadata));
            };
            let Some(function) = source.get_tool_function(identifier) else {
                return Ok(Err(SkipReason::MissingFunction));
            };
            Ok(Ok((tool, function)))
        });

        let (tool, function) = match lookup {
            Ok(Ok(found)) => found,
            Ok(Err(reason)) => return BindOutcome::Skipped(reason),
            Err(error) => return BindOutcome::Failed { error },
        };

        match isolate(|| host.declare_tool(namespaced_declaration(identifier, tool, function))) {
            Ok(()) => BindOutcome::Bound,
            Err(error) => BindOutcome::Failed { error },
        }
    }

    /// Drop every registration, gate and source, and re-arm discovery.
    pub fn clear(&self) {
        self.tools.write().unwrap_or_else(|p| p.into_inner()).clear();
        self.gates.write().unwrap_or_else(|p| p.into_inner()).clear();
        self.sources.write().unwrap_or_else(|p| p.into_inner()).clear();
        self.loader.reset();
    }
}

fn namespaced_declaration(identifier: &str, tool: NamespacedTool, handler: ToolHandler) -> ToolDeclaration {
    let description = match tool.docstring {
        Some(doc) if tool.description.trim().is_empty() => doc,
        Some(doc) if !doc.trim().is_empty() && doc != tool.description => {
            format!("{}\n\n{}", tool.description, doc)
        }
        _ => tool.description,
    };

    ToolDeclaration {
        name: identifier.to_string(),
        description,
        input_schema: tool.input_schema,
        handler,
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tools = self.tools.read().unwrap_or_else(|p| p.into_inner());
        f.debug_struct("ToolRegistry")
            .field("tools", &tools.len())
            .field("prefixes", &self.prefixes())
            .finish_non_exhaustive()
    }
}
