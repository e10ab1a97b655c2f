//! Settings for newcode.
//!
//! Settings are loaded from multiple sources with precedence:
//! 1. Environment variables (NEWCODE_*)
//! 2. Config file ($NEWCODE_CONFIG or <data dir>/config.toml)
//! 3. Default values

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name the agents use to address the user
    pub user_name: String,

    /// Name the agents use for themselves
    pub agent_name: String,

    /// Agent used when none is given on the command line
    pub default_agent: String,

    /// Feature gate for the universal constructor tool family
    pub universal_constructor: bool,

    /// Plugin discovery settings
    pub plugins: PluginSettings,

    /// Universal constructor settings
    pub constructor: ConstructorSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    /// Load manifest plugins at all
    pub enabled: bool,

    /// Directories scanned for plugin manifests
    pub directories: Vec<PathBuf>,

    /// Plugin ids that are never installed
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructorSettings {
    /// Directory holding constructor tool manifests
    pub directory: PathBuf,
}

fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "newcode", "newcode") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".newcode")
    }
}

fn default_user_name() -> String {
    ["USER", "USERNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "User".to_string())
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_name: default_user_name(),
            agent_name: "newcode".to_string(),
            default_agent: "code-agent".to_string(),
            universal_constructor: true,
            plugins: PluginSettings::default(),
            constructor: ConstructorSettings::default(),
        }
    }
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directories: vec![default_data_dir().join("plugins")],
            disabled: Vec::new(),
        }
    }
}

impl Default for ConstructorSettings {
    fn default() -> Self {
        Self {
            directory: default_data_dir().join("universal_constructor"),
        }
    }
}

impl Settings {
    /// Load settings from the config file and the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        let mut settings = Self::load_from(&Self::config_path())?;
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a specific file, falling back to defaults when it is absent.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save settings to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `NEWCODE_*` overrides using the given variable lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("NEWCODE_USER_NAME") {
            self.user_name = name;
        }
        if let Some(name) = lookup("NEWCODE_AGENT_NAME") {
            self.agent_name = name;
        }
        if let Some(agent) = lookup("NEWCODE_DEFAULT_AGENT") {
            self.default_agent = agent;
        }
        if let Some(flag) = lookup("NEWCODE_UNIVERSAL_CONSTRUCTOR") {
            self.universal_constructor = parse_flag(&flag);
        }
        if let Some(flag) = lookup("NEWCODE_DISABLE_PLUGINS") {
            self.plugins.enabled = !parse_flag(&flag);
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.user_name.trim().is_empty() {
            return Err(SettingsError::InvalidValue {
                field: "user_name".into(),
                message: "must not be empty".into(),
            });
        }
        if self.agent_name.trim().is_empty() {
            return Err(SettingsError::InvalidValue {
                field: "agent_name".into(),
                message: "must not be empty".into(),
            });
        }
        if self.default_agent.trim().is_empty() {
            return Err(SettingsError::InvalidValue {
                field: "default_agent".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("NEWCODE_CONFIG") {
            PathBuf::from(path)
        } else {
            Self::data_dir().join("config.toml")
        }
    }

    /// Base directory for newcode data
    pub fn data_dir() -> PathBuf {
        default_data_dir()
    }

    /// Whether a plugin id has been disabled by the user.
    pub fn is_plugin_disabled(&self, id: &str) -> bool {
        self.plugins.disabled.iter().any(|d| d == id)
    }
}

/// Truthy config values: 1, true, yes, on (case-insensitive).
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
