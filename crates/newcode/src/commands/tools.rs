//! Tool registry commands.

use anyhow::{Context, Result};
use colored::Colorize;
use newcode_core::Runtime;
use newcode_core::tools::{AgentTools, BindOutcome, BindReport};
use serde_json::Value;

use crate::cli::{ToolsAction, ToolsCommand};

pub async fn execute(cmd: ToolsCommand, runtime: &Runtime) -> Result<()> {
    match cmd.action {
        ToolsAction::List { json } => list(runtime, json),
        ToolsAction::Bind { agent, json } => bind(runtime, &agent, json),
        ToolsAction::Call { agent, tool, args } => call(runtime, &agent, &tool, &args).await,
    }
}

fn list(runtime: &Runtime, json: bool) -> Result<()> {
    let names = runtime.tools().list_available_names();

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    println!("{}", "Registered tools".bold());
    println!("{}", "═".repeat(60));
    for name in &names {
        println!("  {}", name.cyan());
    }

    let prefixes = runtime.tools().prefixes();
    if !prefixes.is_empty() {
        println!();
        println!("  {}", "Namespaces:".dimmed());
        for prefix in prefixes {
            println!("    {}:*", prefix);
        }
    }

    println!();
    println!("{} tool(s)", names.len());
    Ok(())
}

fn bind(runtime: &Runtime, agent: &str, json: bool) -> Result<()> {
    let mut host = AgentTools::new(agent);
    let report = runtime.build_agent(agent, &mut host)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &BindReport) {
    println!("{} {}", "Tools for".bold(), report.agent.cyan().bold());
    println!("{}", "═".repeat(60));
    for entry in &report.entries {
        match &entry.outcome {
            BindOutcome::Bound => println!("  {} {}", "✓".green(), entry.name),
            BindOutcome::Skipped(reason) => {
                println!("  {} {} {}", "○".yellow(), entry.name, format!("({reason})").dimmed())
            }
            BindOutcome::Failed { error } => {
                println!("  {} {} {}", "✗".red(), entry.name, error.red())
            }
        }
    }
    println!();
    println!(
        "{} bound, {} skipped, {} failed",
        report.bound().len(),
        report.skipped().len(),
        report.failed().len()
    );
}

async fn call(runtime: &Runtime, agent: &str, tool: &str, args: &str) -> Result<()> {
    let args: Value = serde_json::from_str(args).context("--args must be a JSON object")?;
    if !args.is_object() {
        anyhow::bail!("--args must be a JSON object");
    }

    let mut host = AgentTools::new(agent);
    runtime.build_agent(agent, &mut host)?;
    if !host.contains(tool) {
        anyhow::bail!("Tool '{}' is not bound for agent '{}'", tool, agent);
    }

    let output = host.call(tool, args).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    if !output.success {
        anyhow::bail!(
            "Tool '{}' failed: {}",
            tool,
            output.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
