//! `agent_run_shell_command`

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

use crate::tools::{RegisterFn, ToolBuilder, ToolOutput, handler, parse_args, register_fn};

/// Default command timeout in seconds.
pub const DEFAULT_SHELL_TIMEOUT_SECS: u64 = 60;

/// Output kept per stream.
const MAX_STREAM_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ShellArgs {
    /// Command line run through `sh -c`
    pub command: String,
    /// Working directory
    #[serde(default)]
    pub cwd: Option<String>,
    /// Timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

pub fn agent_run_shell_command() -> RegisterFn {
    register_fn(|host| {
        host.declare_tool(
            ToolBuilder::new("agent_run_shell_command")
                .description("Run a shell command and capture its output")
                .docstring(format!(
                    "The command runs through `sh -c` and is killed after `timeout` seconds (default {DEFAULT_SHELL_TIMEOUT_SECS})."
                ))
                .input_schema_from::<ShellArgs>()
                .handler(handler(|args| async move {
                    match parse_args::<ShellArgs>(args) {
                        Ok(args) => run(args).await,
                        Err(output) => output,
                    }
                }))
                .build()?,
        )
    })
}

async fn run(args: ShellArgs) -> ToolOutput {
    if args.command.trim().is_empty() {
        return ToolOutput::failure("command must not be empty");
    }

    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg(&args.command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &args.cwd {
        command.current_dir(cwd);
    }

    let timeout = Duration::from_secs(args.timeout.unwrap_or(DEFAULT_SHELL_TIMEOUT_SECS));
    let start = Instant::now();
    tracing::debug!(command = %args.command, "running shell command");

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return ToolOutput::failure(format!("failed to spawn shell: {e}")),
    };

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return ToolOutput::failure(format!("failed to wait for command: {e}")),
        Err(_) => {
            return ToolOutput::failure(format!(
                "command timed out after {}s: {}",
                timeout.as_secs(),
                args.command
            ));
        }
    };

    let exit_code = output.status.code();
    let data = json!({
        "command": args.command,
        "exit_code": exit_code,
        "stdout": truncate(&output.stdout),
        "stderr": truncate(&output.stderr),
    });

    let mut result = if output.status.success() {
        ToolOutput::ok(data)
    } else {
        ToolOutput {
            data,
            ..ToolOutput::failure(format!(
                "command exited with {}",
                exit_code.map_or("signal".to_string(), |c| c.to_string())
            ))
        }
    };
    result.duration_ms = start.elapsed().as_millis() as u64;
    result
}

fn truncate(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= MAX_STREAM_BYTES {
        return text.into_owned();
    }
    let mut end = MAX_STREAM_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n... [truncated]", &text[..end])
}
