//! Configuration commands.

use anyhow::{Context, Result};
use colored::Colorize;
use newcode_core::{Runtime, Settings};

use crate::cli::{ConfigAction, ConfigCommand};

pub fn execute(cmd: ConfigCommand, runtime: &Runtime) -> Result<()> {
    match cmd.action {
        ConfigAction::Show { json } => show(&runtime.settings(), json),
        ConfigAction::Init { force } => init(&runtime.settings(), force),
        ConfigAction::Path => {
            println!("{}", Settings::config_path().display());
            Ok(())
        }
    }
}

fn show(settings: &Settings, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(settings)?);
        return Ok(());
    }

    println!("{}", "Settings".bold());
    println!("{}", "═".repeat(60));
    println!("  {}: {}", "User name".dimmed(), settings.user_name);
    println!("  {}: {}", "Agent name".dimmed(), settings.agent_name);
    println!("  {}: {}", "Default agent".dimmed(), settings.default_agent);
    println!(
        "  {}: {}",
        "Universal constructor".dimmed(),
        if settings.universal_constructor { "on".green() } else { "off".yellow() }
    );
    println!("  {}: {}", "Constructor dir".dimmed(), settings.constructor.directory.display());

    println!();
    println!("  {}", "Plugins:".cyan());
    println!(
        "    {}: {}",
        "Enabled".dimmed(),
        if settings.plugins.enabled { "yes".green() } else { "no".yellow() }
    );
    for dir in &settings.plugins.directories {
        println!("    {}: {}", "Directory".dimmed(), dir.display());
    }
    if !settings.plugins.disabled.is_empty() {
        println!("    {}: {}", "Disabled".dimmed(), settings.plugins.disabled.join(", "));
    }

    println!();
    let path = Settings::config_path();
    let source = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("  {}: {}{}", "Config file".dimmed(), path.display(), source.yellow());
    Ok(())
}

fn init(settings: &Settings, force: bool) -> Result<()> {
    let path = Settings::config_path();
    if path.exists() && !force {
        println!("{} {}", "○ Config already exists:".yellow(), path.display());
        println!("  Use --force to overwrite");
        return Ok(());
    }

    settings
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} {}", "✓ Wrote".green(), path.display());
    Ok(())
}
