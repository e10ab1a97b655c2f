//! Plugin trait and installation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::callbacks::CallbackRegistry;
use crate::isolate::isolate;

/// Externally supplied registration code.
///
/// `register` runs once at startup and attaches callbacks to the registry;
/// tool contributions go through the `register_tools` event.
pub trait Plugin: Send + Sync {
    /// Unique plugin name.
    fn name(&self) -> &str;

    /// Version string, shown in listings.
    fn version(&self) -> &str {
        "0.0.0"
    }

    /// One-line description.
    fn description(&self) -> &str {
        ""
    }

    /// Attach callbacks.
    fn register(&self, callbacks: &CallbackRegistry) -> anyhow::Result<()>;
}

/// Outcome of installing one plugin.
#[derive(Debug, Clone, Serialize)]
pub struct PluginReport {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Callbacks attached by this plugin
    pub callbacks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

impl PluginReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// An ordered set of plugins.
#[derive(Default, Clone)]
pub struct PluginSet {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin. A plugin whose name is already present replaces it.
    pub fn add(&mut self, plugin: Arc<dyn Plugin>) {
        if let Some(existing) = self.plugins.iter_mut().find(|p| p.name() == plugin.name()) {
            tracing::warn!(plugin = plugin.name(), "plugin replaced an earlier plugin with the same name");
            *existing = plugin;
        } else {
            self.plugins.push(plugin);
        }
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Plugin>> {
        self.plugins.iter()
    }

    /// Run every plugin's `register`, isolating errors and panics.
    pub fn install(&self, callbacks: &CallbackRegistry) -> Vec<PluginReport> {
        self.plugins
            .iter()
            .map(|plugin| install_one(plugin.as_ref(), callbacks))
            .collect()
    }
}

fn install_one(plugin: &dyn Plugin, callbacks: &CallbackRegistry) -> PluginReport {
    let before = total_callbacks(callbacks);
    let result = isolate(|| plugin.register(callbacks));
    let attached = total_callbacks(callbacks).saturating_sub(before);

    let error = match result {
        Ok(()) => {
            tracing::debug!(plugin = plugin.name(), callbacks = attached, "plugin installed");
            None
        }
        Err(message) => {
            tracing::warn!(plugin = plugin.name(), "plugin failed to register: {}", message);
            Some(message)
        }
    };

    PluginReport {
        name: plugin.name().to_string(),
        version: plugin.version().to_string(),
        description: plugin.description().to_string(),
        callbacks: attached,
        error,
        loaded_at: Utc::now(),
    }
}

fn total_callbacks(callbacks: &CallbackRegistry) -> usize {
    callbacks.events().iter().map(|event| callbacks.count(event)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::Event;

    struct Greeter;

    impl Plugin for Greeter {
        fn name(&self) -> &str {
            "greeter"
        }

        fn register(&self, callbacks: &CallbackRegistry) -> anyhow::Result<()> {
            callbacks.register_fn(Event::LoadPrompt, "greeter", || Ok("Say hello.".into()));
            Ok(())
        }
    }

    struct Broken;

    impl Plugin for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn register(&self, _callbacks: &CallbackRegistry) -> anyhow::Result<()> {
            anyhow::bail!("missing dependency")
        }
    }

    struct Panics;

    impl Plugin for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        fn register(&self, _callbacks: &CallbackRegistry) -> anyhow::Result<()> {
            panic!("bad plugin")
        }
    }

    #[test]
    fn test_install_isolates_failures() {
        let mut set = PluginSet::new();
        set.add(Arc::new(Broken));
        set.add(Arc::new(Panics));
        set.add(Arc::new(Greeter));

        let callbacks = CallbackRegistry::new();
        let reports = set.install(&callbacks);

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].error.as_deref(), Some("missing dependency"));
        assert!(reports[1].error.as_deref().unwrap().contains("bad plugin"));
        assert!(reports[2].is_ok());
        assert_eq!(reports[2].callbacks, 1);
        assert_eq!(callbacks.invoke_text(&Event::LoadPrompt), vec!["Say hello."]);
    }

    #[test]
    fn test_add_replaces_same_name() {
        let mut set = PluginSet::new();
        set.add(Arc::new(Greeter));
        set.add(Arc::new(Greeter));
        assert_eq!(set.len(), 1);
    }
}
