//! Project rules plugin.
//!
//! Appends project-level rules files to every agent prompt. Files are read
//! when the prompt is rendered, so edits show up without a restart.
//!
//! Lookup order, all additive:
//! 1. `AGENTS.md` in the project root
//! 2. `.newcode/AGENTS.md` in the project root

use std::path::{Path, PathBuf};

use super::plugin::Plugin;
use crate::callbacks::{CallbackRegistry, Contribution, Event};

const RULE_FILES: [&str; 2] = ["AGENTS.md", ".newcode/AGENTS.md"];

/// Built-in plugin that loads project rules into prompts.
#[derive(Debug, Clone)]
pub struct ProjectRulesPlugin {
    root: PathBuf,
}

impl ProjectRulesPlugin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Read every non-empty rules file under `root`.
pub fn load_project_rules(root: &Path) -> Vec<String> {
    RULE_FILES
        .iter()
        .filter_map(|file| std::fs::read_to_string(root.join(file)).ok())
        .filter(|content| !content.trim().is_empty())
        .collect()
}

impl Plugin for ProjectRulesPlugin {
    fn name(&self) -> &str {
        "project-rules"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> &str {
        "Appends AGENTS.md project rules to agent prompts"
    }

    fn register(&self, callbacks: &CallbackRegistry) -> anyhow::Result<()> {
        let root = self.root.clone();
        callbacks.register_fn(Event::LoadPrompt, self.name(), move || {
            Ok(Contribution::Lines(load_project_rules(&root)))
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_no_rules() {
        let dir = TempDir::new().unwrap();
        assert!(load_project_rules(dir.path()).is_empty());
    }

    #[test]
    fn test_rules_are_read_on_every_render() {
        let dir = TempDir::new().unwrap();
        let callbacks = CallbackRegistry::new();
        ProjectRulesPlugin::new(dir.path()).register(&callbacks).unwrap();
        assert!(callbacks.invoke_text(&Event::LoadPrompt).is_empty());

        std::fs::write(dir.path().join("AGENTS.md"), "# Use tabs").unwrap();
        std::fs::create_dir(dir.path().join(".newcode")).unwrap();
        std::fs::write(dir.path().join(".newcode/AGENTS.md"), "# No unwrap").unwrap();

        assert_eq!(
            callbacks.invoke_text(&Event::LoadPrompt),
            vec!["# Use tabs", "# No unwrap"]
        );
    }
}
