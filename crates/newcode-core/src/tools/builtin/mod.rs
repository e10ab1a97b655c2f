//! Built-in tools.
//!
//! Each tool is exposed as a [`RegisterFn`] so it travels through the same
//! registry path as plugin tools. `list_agents` and `universal_constructor`
//! close over runtime state and are registered by the runtime.

pub mod agents;
pub mod constructor;
pub mod files;
pub mod grep;
pub mod shell;

use std::ffi::OsStr;

use super::{RegisterFn, ToolRegistry};

pub use agents::list_agents;
pub use constructor::universal_constructor;
pub use files::{delete_file, edit_file, list_files, read_file};
pub use grep::grep;
pub use shell::agent_run_shell_command;

/// Directories skipped by `list_files` and `grep`.
const IGNORED_DIRS: &[&str] = &[".git", ".hg", ".svn", "target", "node_modules", "__pycache__", ".venv"];

pub(crate) fn is_ignored_dir(name: &OsStr) -> bool {
    name.to_str().is_some_and(|name| IGNORED_DIRS.contains(&name))
}

/// Names registered by [`register_builtins`].
pub const BUILTIN_TOOLS: &[&str] = &[
    "list_files",
    "read_file",
    "grep",
    "edit_file",
    "delete_file",
    "agent_run_shell_command",
];

/// Built-in registrations, in [`BUILTIN_TOOLS`] order.
pub fn builtins() -> Vec<(&'static str, RegisterFn)> {
    vec![
        ("list_files", list_files()),
        ("read_file", read_file()),
        ("grep", grep()),
        ("edit_file", edit_file()),
        ("delete_file", delete_file()),
        ("agent_run_shell_command", agent_run_shell_command()),
    ]
}

/// Register every built-in file, search and shell tool.
pub fn register_builtins(registry: &ToolRegistry) {
    for (name, register) in builtins() {
        registry.register(name, register);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::CallbackRegistry;
    use crate::tools::AgentTools;
    use std::sync::Arc;

    #[test]
    fn test_builtins_bind_cleanly() {
        let registry = ToolRegistry::new(Arc::new(CallbackRegistry::new()));
        register_builtins(&registry);

        let names: Vec<&str> = builtins().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, BUILTIN_TOOLS);

        let mut host = AgentTools::new("code-agent");
        let report = registry.resolve_and_bind(&mut host, BUILTIN_TOOLS);
        assert_eq!(report.bound(), BUILTIN_TOOLS);
        for tool in host.iter() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
        }
    }

    #[test]
    fn test_ignored_dirs() {
        assert!(is_ignored_dir(OsStr::new(".git")));
        assert!(is_ignored_dir(OsStr::new("target")));
        assert!(!is_ignored_dir(OsStr::new("src")));
        assert!(!is_ignored_dir(OsStr::new(".tmpA1b2")));
    }
}
