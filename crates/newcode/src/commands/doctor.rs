//! Diagnostics command.

use anyhow::Result;
use colored::Colorize;
use newcode_core::runtime::UNIVERSAL_CONSTRUCTOR_GATE;
use newcode_core::tools::AgentTools;
use newcode_core::{Runtime, Settings};

pub fn execute(runtime: &Runtime) -> Result<()> {
    let settings = runtime.settings();

    println!("{}", "newcode Doctor".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    let mut issues: Vec<String> = Vec::new();

    // Check config file
    print!("  Config file: ");
    if Settings::config_path().exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "○ not found (using defaults)".yellow());
    }

    // Check shell for command tools
    print!("  sh: ");
    match which::which("sh") {
        Ok(_) => println!("{}", "✓ installed".green()),
        Err(_) => {
            println!("{}", "✗ not found".red());
            issues.push("sh is not installed, agent_run_shell_command will fail".into());
        }
    }

    // Check plugin directories
    println!();
    print!("  {}", "Plugins:".cyan());
    if settings.plugins.enabled {
        println!();
    } else {
        println!(" {}", "○ disabled".yellow());
    }
    for dir in &settings.plugins.directories {
        print!("    {}: ", dir.display());
        if dir.is_dir() {
            println!("{}", "✓ exists".green());
        } else {
            println!("{}", "○ not found".yellow());
        }
    }
    print!("    Loaded: ");
    println!("{}", format!("{} plugin(s)", runtime.plugin_reports().len()).green());
    for report in runtime.plugin_reports().iter().filter(|r| !r.is_ok()) {
        issues.push(format!(
            "Plugin '{}' failed to register: {}",
            report.name,
            report.error.as_deref().unwrap_or("unknown error")
        ));
    }
    for error in runtime.plugin_errors() {
        issues.push(format!("Plugin failed to load: {}", error));
    }

    // Check universal constructor
    println!();
    print!("  {}: ", UNIVERSAL_CONSTRUCTOR_GATE.cyan());
    if settings.universal_constructor {
        println!("{}", "✓ enabled".green());
    } else {
        println!("{}", "○ disabled".yellow());
    }
    let dir = &settings.constructor.directory;
    print!("    {}: ", dir.display());
    if dir.is_dir() {
        println!(
            "{}",
            format!("✓ {} tool(s)", runtime.constructor().len()).green()
        );
    } else {
        println!("{}", "○ not found".yellow());
    }

    // Check default agent binds cleanly
    println!();
    print!("  Default agent ({}): ", settings.default_agent);
    let mut host = AgentTools::new(settings.default_agent.as_str());
    match runtime.build_agent(&settings.default_agent, &mut host) {
        Ok(report) if report.failed().is_empty() => {
            println!("{}", format!("✓ {} tool(s) bound", report.bound().len()).green());
        }
        Ok(report) => {
            println!("{}", format!("✗ {} tool(s) failed", report.failed().len()).red());
            for (name, error) in report.failed() {
                issues.push(format!("Tool '{}' failed to bind: {}", name, error));
            }
        }
        Err(e) => {
            println!("{}", format!("✗ {}", e).red());
            issues.push(format!("Default agent '{}' is unusable", settings.default_agent));
        }
    }

    // Summary
    println!();
    if issues.is_empty() {
        println!("{}", "✓ All checks passed".green().bold());
    } else {
        println!("{}", format!("✗ {} issue(s) found:", issues.len()).red().bold());
        for issue in &issues {
            println!("  • {}", issue);
        }
    }

    Ok(())
}
