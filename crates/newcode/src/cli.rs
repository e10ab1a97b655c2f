//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand};

/// newcode - agent personas, tools and plugins
///
/// Inspect the agents, see which tools each one binds, and check plugins.
#[derive(Parser, Debug)]
#[command(name = "newcode")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Agent personas (list, show)
    Agents(AgentsCommand),

    /// Tool registry (list, bind, call)
    Tools(ToolsCommand),

    /// Installed plugins and their commands
    Plugins(PluginsCommand),

    /// Configuration file (show, init, path)
    Config(ConfigCommand),

    /// Run diagnostics
    Doctor,

    /// Show version
    Version,
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct AgentsCommand {
    #[command(subcommand)]
    pub action: AgentsAction,
}

#[derive(Subcommand, Debug)]
pub enum AgentsAction {
    /// List agents
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show an agent's details
    Show {
        /// Agent name (defaults to the configured default agent)
        name: Option<String>,

        /// Print the rendered system prompt
        #[arg(short, long)]
        prompt: bool,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct ToolsCommand {
    #[command(subcommand)]
    pub action: ToolsAction,
}

#[derive(Subcommand, Debug)]
pub enum ToolsAction {
    /// List registered tool names
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Bind an agent's tools and show the outcome for each
    Bind {
        /// Agent name
        agent: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Call a tool as seen by an agent
    Call {
        /// Agent name
        agent: String,

        /// Tool name as declared on the agent
        tool: String,

        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct PluginsCommand {
    #[command(subcommand)]
    pub action: PluginsAction,
}

#[derive(Subcommand, Debug)]
pub enum PluginsAction {
    /// List installed plugins
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show help for plugin slash commands
    Commands,

    /// Run a plugin slash command, e.g. `plugins run /hello world`
    Run {
        /// Command line, with or without the leading slash
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Write the effective settings to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_tools_call() {
        let cli = Cli::try_parse_from([
            "newcode", "-v", "tools", "call", "husky", "read_file", "--args", r#"{"file_path":"a"}"#,
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Tools(ToolsCommand {
                action: ToolsAction::Call { agent, tool, args },
            }) => {
                assert_eq!(agent, "husky");
                assert_eq!(tool, "read_file");
                assert!(args.contains("file_path"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_plugins_run_keeps_trailing_words() {
        let cli = Cli::try_parse_from(["newcode", "plugins", "run", "/fmt", "--all", "src"]).unwrap();
        match cli.command {
            Commands::Plugins(PluginsCommand {
                action: PluginsAction::Run { line },
            }) => assert_eq!(line.join(" "), "/fmt --all src"),
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["newcode", "plugins", "run"]).is_err());
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from(["newcode", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommand {
                action: ConfigAction::Init { force: true }
            })
        ));
    }

    #[test]
    fn test_agents_show_defaults() {
        let cli = Cli::try_parse_from(["newcode", "agents", "show", "--prompt"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Agents(AgentsCommand {
                action: AgentsAction::Show { name: None, prompt: true }
            })
        ));
    }
}
