//! Plugin Discovery
//!
//! Runs the `register_tools` extension point at most once and moves the
//! descriptors it yields into the tool registry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

use crate::callbacks::{CallbackFailure, CallbackRegistry, Contribution, Event};
use crate::tools::{ToolDescriptor, ToolRegistry};

/// A descriptor that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedDescriptor {
    /// Name as supplied (may be empty)
    pub name: String,
    pub reason: String,
}

/// What one discovery run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryReport {
    /// Names registered into the tool registry, in contribution order
    pub registered: Vec<String>,
    /// Registered names that replaced an existing entry
    pub replaced: Vec<String>,
    /// Descriptors skipped by validation
    pub rejected: Vec<RejectedDescriptor>,
    /// Discovery callbacks that failed
    pub failures: Vec<CallbackFailure>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DiscoveryReport {
    /// Whether discovery ran without any rejection or failure.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.failures.is_empty()
    }
}

/// At-most-once plugin discovery guard.
///
/// The flag is checked and set under one lock, so concurrent first callers
/// wait for the discovery already in progress instead of running their own.
#[derive(Debug, Default)]
pub struct PluginLoader {
    loaded: Mutex<bool>,
    last_report: Mutex<Option<DiscoveryReport>>,
}

impl PluginLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether discovery has already run.
    pub fn is_loaded(&self) -> bool {
        *self.loaded.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Run discovery unless it already ran. Returns `None` on the no-op path.
    ///
    /// The flag is set even when every discovery callback failed, so a broken
    /// plugin is not retried on every bind.
    pub fn ensure_loaded(&self, callbacks: &CallbackRegistry, tools: &ToolRegistry) -> Option<DiscoveryReport> {
        let mut loaded = self.loaded.lock().unwrap_or_else(|p| p.into_inner());
        if *loaded {
            return None;
        }

        let report = discover(callbacks, tools);
        *loaded = true;

        *self.last_report.lock().unwrap_or_else(|p| p.into_inner()) = Some(report.clone());
        Some(report)
    }

    /// Report of the most recent discovery run.
    pub fn last_report(&self) -> Option<DiscoveryReport> {
        self.last_report
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Re-arm discovery.
    pub fn reset(&self) {
        *self.loaded.lock().unwrap_or_else(|p| p.into_inner()) = false;
        *self.last_report.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

fn discover(callbacks: &CallbackRegistry, tools: &ToolRegistry) -> DiscoveryReport {
    let invocation = callbacks.invoke(&Event::RegisterTools);
    let mut report = DiscoveryReport {
        failures: invocation.failures,
        ..DiscoveryReport::default()
    };

    for contribution in invocation.contributions {
        let descriptors = match contribution {
            Contribution::Tool(descriptor) => vec![descriptor],
            Contribution::Tools(descriptors) => descriptors,
            other => {
                tracing::warn!("ignoring unexpected register_tools contribution: {:?}", other);
                report.rejected.push(RejectedDescriptor {
                    name: String::new(),
                    reason: "not a tool descriptor".into(),
                });
                continue;
            }
        };

        for descriptor in descriptors {
            register_descriptor(descriptor, tools, &mut report);
        }
    }

    report.completed_at = Some(Utc::now());
    tracing::info!(
        registered = report.registered.len(),
        rejected = report.rejected.len(),
        failed = report.failures.len(),
        "plugin tool discovery finished"
    );
    report
}

fn register_descriptor(descriptor: ToolDescriptor, tools: &ToolRegistry, report: &mut DiscoveryReport) {
    let ToolDescriptor { name, register_func } = descriptor;

    let reason = if name.trim().is_empty() {
        Some("name must be a non-empty string")
    } else if name.contains(':') {
        Some("namespaced names cannot be registered as flat tools")
    } else if register_func.is_none() {
        Some("register_func is missing")
    } else {
        None
    };

    match (reason, register_func) {
        (None, Some(register)) => {
            if tools.register(name.clone(), register).is_some() {
                report.replaced.push(name.clone());
            }
            report.registered.push(name);
        }
        (reason, _) => {
            let reason = reason.unwrap_or("register_func is missing");
            tracing::warn!(tool = %name, "skipping plugin tool descriptor: {}", reason);
            report.rejected.push(RejectedDescriptor {
                name,
                reason: reason.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::register_fn;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop_descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, register_fn(|_| Ok(())))
    }

    #[test]
    fn test_discovery_runs_once() {
        let callbacks = Arc::new(CallbackRegistry::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        callbacks.register_fn(Event::RegisterTools, "plugin", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Contribution::Tools(vec![noop_descriptor("a"), noop_descriptor("b")]))
        });
        let tools = ToolRegistry::new(callbacks.clone());
        let loader = PluginLoader::new();

        let report = loader.ensure_loaded(&callbacks, &tools).unwrap();
        assert_eq!(report.registered, vec!["a", "b"]);
        assert!(report.is_clean());
        assert!(loader.ensure_loaded(&callbacks, &tools).is_none());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(loader.last_report().is_some());
    }

    #[test]
    fn test_invalid_descriptors_are_rejected() {
        let callbacks = Arc::new(CallbackRegistry::new());
        callbacks.register_fn(Event::RegisterTools, "mixed", || {
            Ok(Contribution::Tools(vec![
                noop_descriptor("  "),
                ToolDescriptor::without_function("no_func"),
                noop_descriptor("uc:sneaky"),
                noop_descriptor("good"),
            ]))
        });
        callbacks.register_fn(Event::RegisterTools, "wrong-shape", || Ok("text".into()));
        let tools = ToolRegistry::new(callbacks.clone());

        let report = PluginLoader::new().ensure_loaded(&callbacks, &tools).unwrap();
        assert_eq!(report.registered, vec!["good"]);
        assert_eq!(report.rejected.len(), 4);
        assert_eq!(report.rejected[1].name, "no_func");
        assert!(tools.contains("good"));
        assert!(!tools.contains("no_func"));
    }

    #[test]
    fn test_broken_plugin_does_not_block_others() {
        let callbacks = Arc::new(CallbackRegistry::new());
        callbacks.register_fn(Event::RegisterTools, "broken", || anyhow::bail!("import error"));
        callbacks.register_fn(Event::RegisterTools, "panicky", || panic!("plugin crashed"));
        callbacks.register_fn(Event::RegisterTools, "healthy", || {
            Ok(Contribution::Tool(noop_descriptor("healthy_tool")))
        });
        let tools = ToolRegistry::new(callbacks.clone());
        tools.register("read_file", register_fn(|_| Ok(())));

        let loader = PluginLoader::new();
        let report = loader.ensure_loaded(&callbacks, &tools).unwrap();

        assert_eq!(report.failures.len(), 2);
        assert!(loader.is_loaded());
        assert!(tools.contains("healthy_tool"));
        assert!(tools.contains("read_file"));
    }

    #[test]
    fn test_reset_allows_rediscovery() {
        let callbacks = Arc::new(CallbackRegistry::new());
        let tools = ToolRegistry::new(callbacks.clone());
        let loader = PluginLoader::new();

        assert!(loader.ensure_loaded(&callbacks, &tools).is_some());
        loader.reset();
        assert!(!loader.is_loaded());
        assert!(loader.last_report().is_none());
        assert!(loader.ensure_loaded(&callbacks, &tools).is_some());
    }
}
