//! Plugins
//!
//! Plugins attach callbacks to the [`CallbackRegistry`](crate::callbacks::CallbackRegistry).
//! Tool contributions are collected lazily by the [`PluginLoader`] the first
//! time tools are requested.
//!
//! Sources of plugins:
//! - in-process [`Plugin`] implementations
//! - directories holding a `plugin.json` manifest ([`ManifestLoader`])
//! - the built-in [`ProjectRulesPlugin`]

pub mod loader;
pub mod manifest;
pub mod plugin;
pub mod rules;

pub use loader::{DiscoveryReport, PluginLoader, RejectedDescriptor};
pub use manifest::{
    MANIFEST_FILE, ManifestCommand, ManifestLoader, ManifestPlugin, ManifestTool, PluginManifest,
};
pub use plugin::{Plugin, PluginReport, PluginSet};
pub use rules::{ProjectRulesPlugin, load_project_rules};

use thiserror::Error;

/// Plugin errors
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Plugin load failed: {0}")]
    LoadFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
