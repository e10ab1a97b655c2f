//! Command-backed tool handlers.
//!
//! Manifest plugins and constructor tools describe their implementation as an
//! argv. The handler spawns it, writes the JSON arguments to stdin and
//! returns stdout (parsed as JSON when possible).

use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::types::{ToolHandler, ToolOutput, handler};

/// Default limit for a command tool run.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Build a handler that runs `argv` with the tool arguments on stdin.
pub fn command_handler(argv: Vec<String>, cwd: Option<PathBuf>) -> ToolHandler {
    handler(move |args| {
        let argv = argv.clone();
        let cwd = cwd.clone();
        async move {
            match tokio::time::timeout(DEFAULT_COMMAND_TIMEOUT, run(argv, cwd, args)).await {
                Ok(output) => output,
                Err(_) => ToolOutput::failure(format!(
                    "command timed out after {}s",
                    DEFAULT_COMMAND_TIMEOUT.as_secs()
                )),
            }
        }
    })
}

async fn run(argv: Vec<String>, cwd: Option<PathBuf>, args: Value) -> ToolOutput {
    let Some((program, rest)) = argv.split_first() else {
        return ToolOutput::failure("empty command");
    };

    let mut command = Command::new(program);
    command
        .args(rest)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return ToolOutput::failure(format!("failed to spawn {program}: {e}")),
    };

    if let Some(mut stdin) = child.stdin.take() {
        let payload = args.to_string();
        if let Err(e) = stdin.write_all(payload.as_bytes()).await {
            tracing::debug!(program = %program, "failed to write tool arguments: {}", e);
        }
        // Dropping stdin closes the pipe so the child sees EOF.
    }

    let output = match child.wait_with_output().await {
        Ok(output) => output,
        Err(e) => return ToolOutput::failure(format!("failed to wait for {program}: {e}")),
    };

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return ToolOutput::failure(format!(
            "{program} exited with {}: {}",
            output.status.code().map_or("signal".to_string(), |c| c.to_string()),
            if stderr.is_empty() { &stdout } else { &stderr }
        ));
    }

    let data = serde_json::from_str(&stdout).unwrap_or(Value::String(stdout));
    ToolOutput::ok(data)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_command_receives_arguments_on_stdin() {
        let handler = command_handler(vec!["cat".into()], None);
        let output = handler(json!({"city": "Oslo"})).await;
        assert!(output.success);
        assert_eq!(output.data, json!({"city": "Oslo"}));
    }

    #[tokio::test]
    async fn test_command_failure_is_reported() {
        let handler = command_handler(
            vec!["sh".into(), "-c".into(), "echo bad >&2; exit 3".into()],
            None,
        );
        let output = handler(json!({})).await;
        assert!(!output.success);
        let error = output.error.unwrap();
        assert!(error.contains("exited with 3"));
        assert!(error.contains("bad"));
    }

    #[tokio::test]
    async fn test_empty_and_missing_commands() {
        let output = command_handler(Vec::new(), None)(json!({})).await;
        assert_eq!(output.error.as_deref(), Some("empty command"));

        let output = command_handler(vec!["/definitely/not/here".into()], None)(json!({})).await;
        assert!(!output.success);
    }
}
