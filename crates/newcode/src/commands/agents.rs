//! Agent persona commands.

use anyhow::Result;
use colored::Colorize;
use newcode_core::Runtime;

use crate::cli::{AgentsAction, AgentsCommand};

pub fn execute(cmd: AgentsCommand, runtime: &Runtime) -> Result<()> {
    match cmd.action {
        AgentsAction::List { json } => list(runtime, json),
        AgentsAction::Show { name, prompt } => {
            let name = name.unwrap_or_else(|| runtime.settings().default_agent);
            show(runtime, &name, prompt)
        }
    }
}

fn list(runtime: &Runtime, json: bool) -> Result<()> {
    let summaries = runtime.agents().summaries();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    let default_agent = runtime.settings().default_agent;
    println!("{}", "Agents".bold());
    println!("{}", "═".repeat(60));
    for agent in &summaries {
        let marker = if agent.name == default_agent { "*".green() } else { " ".normal() };
        println!(
            "{} {} {}",
            marker,
            format!("{:<16}", agent.name).cyan(),
            agent.description.dimmed()
        );
    }
    println!();
    println!("{} agent(s), {} marks the default", summaries.len(), "*".green());
    Ok(())
}

fn show(runtime: &Runtime, name: &str, prompt: bool) -> Result<()> {
    let agent = runtime.agents().require(name)?;

    println!("{}", agent.display_name().bold());
    println!("{}", "═".repeat(60));
    println!("  {}: {}", "Name".dimmed(), agent.name());
    println!("  {}: {}", "Description".dimmed(), agent.description());
    println!();
    println!("  {}", "Requested tools:".cyan());
    for tool in agent.available_tools() {
        println!("    {}", tool);
    }

    if prompt {
        println!();
        println!("{}", "System prompt".bold());
        println!("{}", "─".repeat(50));
        println!("{}", runtime.render_prompt(name)?);
    }

    Ok(())
}
