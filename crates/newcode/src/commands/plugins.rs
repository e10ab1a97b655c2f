//! Plugin commands.

use anyhow::Result;
use colored::Colorize;
use newcode_core::Runtime;

use crate::cli::{PluginsAction, PluginsCommand};

pub fn execute(cmd: PluginsCommand, runtime: &Runtime) -> Result<()> {
    match cmd.action {
        PluginsAction::List { json } => list(runtime, json),
        PluginsAction::Commands => commands(runtime),
        PluginsAction::Run { line } => run(runtime, &line.join(" ")),
    }
}

fn list(runtime: &Runtime, json: bool) -> Result<()> {
    let reports = runtime.plugin_reports();

    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }

    if reports.is_empty() && runtime.plugin_errors().is_empty() {
        println!("{}", "No plugins installed".yellow());
        return Ok(());
    }

    println!("{}", "Installed Plugins".bold());
    println!("{}", "═".repeat(60));
    for report in reports {
        let status = if report.is_ok() { "✓".green() } else { "✗".red() };
        println!(
            "{} {} {}",
            status,
            report.name.cyan(),
            format!("v{}", report.version).dimmed()
        );
        if !report.description.is_empty() {
            println!("    {}", report.description);
        }
        println!("    {}: {}", "Callbacks".dimmed(), report.callbacks);
        if let Some(ref error) = report.error {
            println!("    {}: {}", "Error".red(), error);
        }
    }

    let errors = runtime.plugin_errors();
    if !errors.is_empty() {
        println!();
        println!("  {}", "Failed to load:".red());
        for error in errors {
            println!("    • {}", error);
        }
    }

    Ok(())
}

fn commands(runtime: &Runtime) -> Result<()> {
    let help = runtime.command_help();

    if help.is_empty() {
        println!("{}", "No plugin commands registered".yellow());
        return Ok(());
    }

    println!("{}", "Plugin Commands".bold());
    println!("{}", "─".repeat(50));
    for entry in &help {
        println!("  {} {}", format!("/{:<20}", entry.name).cyan(), entry.description);
    }
    Ok(())
}

fn run(runtime: &Runtime, line: &str) -> Result<()> {
    match runtime.run_command(line) {
        Some(output) if output.is_empty() => println!("{}", "✓ handled".green()),
        Some(output) => println!("{}", output),
        None => anyhow::bail!("No plugin handled '{}'. See `newcode plugins commands`.", line.trim()),
    }
    Ok(())
}
