//! newcode - AI coding agent CLI
//!
//! Front end over the newcode-core registries: agent personas, tool binding
//! and plugins.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod commands;

use cli::{Cli, Commands};
use newcode_core::Runtime;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive(format!("newcode={level}").parse()?)
                .add_directive(format!("newcode_core={level}").parse()?),
        )
        .init();

    // Plugin panics are caught and reported as failures; keep their default
    // banner out of the output.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if newcode_core::in_isolated_call() {
            tracing::debug!("isolated panic: {}", info);
        } else {
            default_hook(info);
        }
    }));

    if let Commands::Version = cli.command {
        println!("newcode {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let runtime = Runtime::load().await?;
    tracing::debug!(
        plugins = runtime.plugin_reports().len(),
        agents = runtime.agents().len(),
        "runtime loaded"
    );

    match cli.command {
        Commands::Agents(cmd) => commands::agents::execute(cmd, &runtime),
        Commands::Tools(cmd) => commands::tools::execute(cmd, &runtime).await,
        Commands::Plugins(cmd) => commands::plugins::execute(cmd, &runtime),
        Commands::Config(cmd) => commands::config::execute(cmd, &runtime),
        Commands::Doctor => commands::doctor::execute(&runtime),
        Commands::Version => Ok(()),
    }
}
